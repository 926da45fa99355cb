pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod host;
pub mod printer;

pub use config::ControllerConfig;
pub use controller::{PhaseReport, ProxyController};
pub use crate::core::{active_stack, Admission, DispatchStrategy, HookFailure, PhaseRegistry, Rejected};
pub use error::{OrchestratorError, Result};
pub use host::{HostBus, SignalOutcome};
pub use printer::PhasePrinter;
