//! Scheduling primitives behind the proxy controller.
//!
//! - [`PhaseRegistry`] - pending entries per phase and the deferred set
//! - [`active_stack`] - per-thread stack of controllers with an open window
//! - [`DispatchStrategy`] - how one entry's hooks are run

pub mod active_stack;
mod dispatch;
mod registry;

pub use dispatch::{DispatchStrategy, HookFailure};
pub use registry::{Admission, PhaseRegistry, Rejected};
