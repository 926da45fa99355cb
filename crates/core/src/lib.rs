//! Domain types shared by the lifecycle proxy crates.
//!
//! - [`LifecyclePhase`] - ordered host checkpoints and their host identifiers
//! - [`RegistrationEntry`] - the contract deferred work items implement
//! - [`PhaseSignal`] - what the host hands over when it signals a phase
//! - [`Side`] - which half of a client/server split a controller serves

pub mod domain;
pub mod error;

pub use domain::entry::{EntryHandle, FnEntry, HookStage, RegistrationEntry};
pub use domain::phase::LifecyclePhase;
pub use domain::side::Side;
pub use domain::signal::PhaseSignal;
pub use error::{CoreError, Result};
