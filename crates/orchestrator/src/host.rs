//! Fan-out of host phase signals to attached controllers.
//!
//! A host typically owns one bus per side and forwards every lifecycle
//! signal to it; the bus drives each attached controller in turn on the
//! calling thread.

use lifecycle_core::PhaseSignal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::controller::{PhaseReport, ProxyController};
use crate::error::Result;

/// One controller's answer to a host signal.
#[derive(Debug)]
pub struct SignalOutcome {
    pub controller: Uuid,
    pub result: Result<PhaseReport>,
}

impl SignalOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn report(&self) -> Option<&PhaseReport> {
        self.result.as_ref().ok()
    }
}

#[derive(Default)]
pub struct HostBus {
    controllers: Mutex<Vec<Arc<ProxyController>>>,
}

impl HostBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `controller` if its config allows auto-attachment.
    ///
    /// Returns whether the controller is now attached.
    pub fn register(&self, controller: Arc<ProxyController>) -> bool {
        if !controller.config().auto_attach {
            debug!(
                controller = %controller.id(),
                name = %controller.name(),
                "Auto-attach disabled; controller left off the host bus"
            );
            return false;
        }
        self.attach(controller);
        true
    }

    /// Attach `controller` unconditionally. Attaching twice is a no-op.
    pub fn attach(&self, controller: Arc<ProxyController>) {
        let mut controllers = self.controllers();
        if controllers.iter().any(|c| c.id() == controller.id()) {
            return;
        }
        debug!(controller = %controller.id(), name = %controller.name(), "Controller attached");
        controllers.push(controller);
    }

    pub fn detach(&self, id: Uuid) -> Option<Arc<ProxyController>> {
        let mut controllers = self.controllers();
        let position = controllers.iter().position(|c| c.id() == id)?;
        Some(controllers.remove(position))
    }

    pub fn attached_count(&self) -> usize {
        self.controllers().len()
    }

    /// Drive every attached controller through the signalled phase.
    ///
    /// Controllers run in attach order and each one is driven whatever its
    /// siblings returned. An unmapped host id fails before any controller is
    /// touched.
    pub fn signal(&self, signal: &PhaseSignal) -> Result<Vec<SignalOutcome>> {
        let phase = signal.phase()?;
        let controllers = self.controllers().clone();

        info!(
            phase = %phase,
            host_id = %signal.host_id,
            controllers = controllers.len(),
            "Host signalled phase"
        );

        let outcomes: Vec<SignalOutcome> = controllers
            .iter()
            .map(|controller| SignalOutcome {
                controller: controller.id(),
                result: controller.handle_signal(signal),
            })
            .collect();

        for outcome in &outcomes {
            if let Err(err) = &outcome.result {
                warn!(
                    controller = %outcome.controller,
                    phase = %phase,
                    error = %err,
                    "Controller failed to handle host signal"
                );
            }
        }

        Ok(outcomes)
    }

    fn controllers(&self) -> MutexGuard<'_, Vec<Arc<ProxyController>>> {
        self.controllers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HostBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBus")
            .field("attached_count", &self.attached_count())
            .finish()
    }
}
