//! Lifecycle events published by proxy controllers
//!
//! Controllers publish what they do (phase windows opening and closing,
//! admissions, hook failures) on an [`EventBus`] so hosts and tooling can
//! observe a load without hooking into the controller itself.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
