//! Logs every phase a controller passes through.

use lifecycle_core::{LifecyclePhase, RegistrationEntry};
use std::sync::Arc;
use tracing::info;

use crate::controller::ProxyController;
use crate::core::Admission;
use crate::error::Result;

/// One admitted entry per signalled phase that logs the phase for a mod.
///
/// The entry finds its controller through the active stack rather than
/// holding a reference to it.
pub struct PhasePrinter {
    mod_id: String,
    phase: LifecyclePhase,
}

impl PhasePrinter {
    /// Admit a printer for each signalled phase still ahead of `controller`.
    ///
    /// Returns the number of printers admitted.
    pub fn attach(controller: &ProxyController, mod_id: impl Into<String>) -> Result<usize> {
        let mod_id = mod_id.into();
        let last_passed = controller.last_completed_phase();

        let mut admitted = 0;
        for phase in LifecyclePhase::signaled().filter(|phase| *phase > last_passed) {
            let printer = Arc::new(Self {
                mod_id: mod_id.clone(),
                phase,
            });
            if controller.admit(printer)? != Admission::Duplicate {
                admitted += 1;
            }
        }
        Ok(admitted)
    }
}

impl RegistrationEntry for PhasePrinter {
    fn target_phase(&self) -> LifecyclePhase {
        self.phase
    }

    fn create(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn register(&self) -> anyhow::Result<()> {
        let controller = ProxyController::active_controller()
            .ok_or_else(|| anyhow::anyhow!("phase printer ran outside a phase window"))?;
        info!(
            controller = %controller.id(),
            mod_id = %self.mod_id,
            phase = %self.phase,
            host_id = self.phase.host_id(),
            "Phase {} for {}",
            self.phase,
            self.mod_id
        );
        Ok(())
    }

    fn name(&self) -> String {
        format!("phase_printer[{}:{}]", self.mod_id, self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use lifecycle_core::PhaseSignal;

    #[test]
    fn test_attach_covers_every_signalled_phase() {
        let proxy = Arc::new(ProxyController::new(ControllerConfig::new("printmod")));
        let admitted = PhasePrinter::attach(&proxy, "printmod").unwrap();

        assert_eq!(admitted, LifecyclePhase::signaled().count());
        for phase in LifecyclePhase::signaled() {
            assert_eq!(proxy.pending_count(phase), 1, "{phase}");
        }
        assert_eq!(proxy.pending_count(LifecyclePhase::Load), 0);
    }

    #[test]
    fn test_attach_skips_passed_phases() {
        let proxy = Arc::new(ProxyController::new(ControllerConfig::new("printmod")));
        proxy
            .init(&PhaseSignal::for_phase(LifecyclePhase::Init))
            .unwrap();

        let admitted = PhasePrinter::attach(&proxy, "printmod").unwrap();
        assert_eq!(admitted, 7);
        assert_eq!(proxy.pending_count(LifecyclePhase::PreInit), 0);
        assert_eq!(proxy.pending_count(LifecyclePhase::PostInit), 1);
    }

    #[test]
    fn test_printer_runs_cleanly_in_its_window() {
        let proxy = Arc::new(ProxyController::new(ControllerConfig::new("printmod")));
        PhasePrinter::attach(&proxy, "printmod").unwrap();

        for phase in LifecyclePhase::signaled() {
            let report = proxy.handle_signal(&PhaseSignal::for_phase(phase)).unwrap();
            assert_eq!(report.dispatched, 1);
            assert_eq!(report.failed, 0);
        }
        assert_eq!(proxy.last_completed_phase(), LifecyclePhase::ServerStopped);
    }

    #[test]
    fn test_printer_outside_window_fails() {
        let printer = PhasePrinter {
            mod_id: "printmod".to_string(),
            phase: LifecyclePhase::Init,
        };
        assert!(printer.register().is_err());
        assert_eq!(printer.name(), "phase_printer[printmod:init]");
    }
}
