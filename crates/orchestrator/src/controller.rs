//! The proxy controller: admits registration entries and runs them when the
//! host signals their phase.
//!
//! A controller moves `Idle -> Open(phase) -> Idle -> Open(later phase)` and
//! never revisits a phase. While a window is open the controller sits on the
//! calling thread's active stack, so entries running inside it can reach it
//! through [`ProxyController::active_controller`] and queue more work for
//! the same phase.

use events::{AdmissionKind, EventBus, LifecycleEvent};
use lifecycle_core::{EntryHandle, LifecyclePhase, PhaseSignal, Side};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::core::active_stack::{self, StackFrame};
use crate::core::{Admission, DispatchStrategy, PhaseRegistry};
use crate::error::{OrchestratorError, Result};

/// What one phase window did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: LifecyclePhase,
    /// Entries whose hooks were run, primary batch and deferred passes together.
    pub dispatched: usize,
    /// Entries that stopped at a failing hook.
    pub failed: usize,
    /// Deferred passes needed to reach an empty deferred set.
    pub drain_passes: usize,
}

impl PhaseReport {
    fn new(phase: LifecyclePhase) -> Self {
        Self {
            phase,
            dispatched: 0,
            failed: 0,
            drain_passes: 0,
        }
    }
}

struct PhaseState {
    current: Option<LifecyclePhase>,
    last_passed: LifecyclePhase,
    signal: Option<Arc<PhaseSignal>>,
    registry: PhaseRegistry,
}

pub struct ProxyController {
    id: Uuid,
    config: ControllerConfig,
    strategy: DispatchStrategy,
    state: Mutex<PhaseState>,
    event_bus: Option<EventBus>,
}

impl ProxyController {
    pub fn new(config: ControllerConfig) -> Self {
        let strategy = DispatchStrategy::for_side(config.side);
        Self {
            id: Uuid::new_v4(),
            config,
            strategy,
            state: Mutex::new(PhaseState {
                current: None,
                last_passed: LifecyclePhase::Startup,
                signal: None,
                registry: PhaseRegistry::new(),
            }),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn side(&self) -> Side {
        self.config.side
    }

    pub fn is_client(&self) -> bool {
        self.config.side.is_client()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn strategy(&self) -> DispatchStrategy {
        self.strategy
    }

    /// The controller whose phase window is innermost on the calling thread.
    pub fn active_controller() -> Option<Arc<ProxyController>> {
        active_stack::peek_head()
    }

    /// Schedule `entry` for its target phase.
    ///
    /// Entries for the open phase run before it closes; entries for a later
    /// phase wait for it. Entries for a phase that already closed are
    /// rejected and never queued.
    pub fn admit(&self, entry: EntryHandle) -> Result<Admission> {
        let name = entry.name();
        let target = entry.target_phase();

        // No entry code runs while the state lock is held.
        let outcome = {
            let mut state = self.state();
            let (current, last_passed) = (state.current, state.last_passed);
            state.registry.admit(entry, target, current, last_passed)
        };
        let result = outcome.map_err(|rejected| {
            OrchestratorError::admission(&name, rejected.target, rejected.last_passed)
        });

        match &result {
            Ok(Admission::Duplicate) => {
                debug!(controller = %self.id, entry = %name, phase = %target, "Entry already queued");
            }
            Ok(admission) => {
                let kind = if *admission == Admission::Deferred {
                    AdmissionKind::Deferred
                } else {
                    AdmissionKind::Pending
                };
                debug!(
                    controller = %self.id,
                    entry = %name,
                    phase = %target,
                    kind = ?kind,
                    "Entry admitted"
                );
                self.emit(LifecycleEvent::EntryAdmitted {
                    controller_id: self.id,
                    entry: name,
                    phase: target,
                    kind,
                });
            }
            Err(err) => {
                warn!(controller = %self.id, entry = %name, error = %err, "Entry rejected");
                if let OrchestratorError::Admission { last_passed, .. } = err {
                    self.emit(LifecycleEvent::EntryRejected {
                        controller_id: self.id,
                        entry: name,
                        phase: target,
                        last_passed: *last_passed,
                    });
                }
            }
        }

        result
    }

    /// Last phase whose window closed; `Startup` before the first one.
    pub fn last_completed_phase(&self) -> LifecyclePhase {
        self.state().last_passed
    }

    /// Phase whose window is open right now, if any.
    pub fn current_open_phase(&self) -> Option<LifecyclePhase> {
        self.state().current
    }

    /// The host signal that opened the current window.
    pub fn current_signal(&self) -> Option<Arc<PhaseSignal>> {
        self.state().signal.clone()
    }

    pub fn pending_count(&self, phase: LifecyclePhase) -> usize {
        self.state().registry.pending_len(phase)
    }

    pub fn deferred_count(&self) -> usize {
        self.state().registry.deferred_len()
    }

    /// Phases that still have entries waiting, in order.
    pub fn pending_phases(&self) -> Vec<LifecyclePhase> {
        self.state().registry.pending_phases()
    }

    /// Open and close the phase bound to `signal.host_id`.
    pub fn handle_signal(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        let phase = signal.phase()?;
        self.run_phase(phase, signal)
    }

    pub fn construct(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::Construct, signal)
    }

    pub fn pre_init(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::PreInit, signal)
    }

    pub fn init(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::Init, signal)
    }

    pub fn post_init(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::PostInit, signal)
    }

    pub fn load_complete(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::Available, signal)
    }

    pub fn server_about_to_start(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::ServerAboutToStart, signal)
    }

    pub fn server_starting(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::ServerStarting, signal)
    }

    pub fn server_started(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::ServerStarted, signal)
    }

    pub fn server_stopping(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::ServerStopping, signal)
    }

    pub fn server_stopped(self: &Arc<Self>, signal: &PhaseSignal) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::ServerStopped, signal)
    }

    fn run_phase(self: &Arc<Self>, phase: LifecyclePhase, signal: &PhaseSignal) -> Result<PhaseReport> {
        let frame = self.enter(phase, signal)?;
        let mut report = PhaseReport::new(phase);

        // Entries admitted for `phase` from here on land in the deferred set,
        // never in this batch.
        let primary = self.state().registry.take_pending(phase);
        self.run_batch(phase, &primary, &mut report);

        loop {
            let deferred = self.state().registry.take_deferred();
            if deferred.is_empty() {
                break;
            }
            report.drain_passes += 1;
            debug!(
                controller = %self.id,
                phase = %phase,
                pass = report.drain_passes,
                entries = deferred.len(),
                "Draining deferred entries"
            );
            self.run_batch(phase, &deferred, &mut report);
        }

        self.leave(phase, frame)?;

        info!(
            controller = %self.id,
            name = %self.config.name,
            phase = %phase,
            dispatched = report.dispatched,
            failed = report.failed,
            waiting = ?self.pending_phases(),
            "Phase left"
        );
        self.emit(LifecycleEvent::PhaseLeft {
            controller_id: self.id,
            phase,
            dispatched: report.dispatched,
            failed: report.failed,
        });

        Ok(report)
    }

    fn enter(self: &Arc<Self>, phase: LifecyclePhase, signal: &PhaseSignal) -> Result<StackFrame> {
        {
            let mut state = self.state();
            if let Some(open) = state.current {
                return Err(OrchestratorError::PhaseWindowOpen {
                    requested: phase,
                    open,
                });
            }
            if phase <= state.last_passed {
                return Err(OrchestratorError::PhaseAlreadyPassed {
                    phase,
                    last_passed: state.last_passed,
                });
            }
            state.current = Some(phase);
            state.signal = Some(Arc::new(signal.clone()));
        }

        let frame = StackFrame::enter(Arc::clone(self));

        info!(
            controller = %self.id,
            name = %self.config.name,
            side = %self.config.side,
            phase = %phase,
            pending = self.pending_count(phase),
            "Phase entered"
        );
        self.emit(LifecycleEvent::PhaseEntered {
            controller_id: self.id,
            phase,
        });

        Ok(frame)
    }

    fn leave(&self, phase: LifecyclePhase, frame: StackFrame) -> Result<()> {
        {
            let mut state = self.state();
            state.last_passed = phase;
            state.current = None;
            state.signal = None;
        }
        frame.leave()
    }

    /// Run each entry's hooks; a failing entry is logged and skipped.
    fn run_batch(&self, phase: LifecyclePhase, batch: &[EntryHandle], report: &mut PhaseReport) {
        for entry in batch {
            report.dispatched += 1;
            let Err(failure) = self.strategy.dispatch(&**entry) else {
                continue;
            };

            report.failed += 1;
            let name = entry.name();
            let err = OrchestratorError::hook_failed(&name, phase, failure.stage, &failure.message);
            error!(
                controller = %self.id,
                entry = %name,
                phase = %phase,
                stage = %failure.stage,
                error = %err,
                "Registration entry failed its hook"
            );
            self.emit(LifecycleEvent::HookFailed {
                controller_id: self.id,
                entry: name,
                phase,
                stage: failure.stage,
                message: failure.message,
            });
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        if let Some(ref bus) = self.event_bus {
            bus.emit(event);
        }
    }

    fn state(&self) -> MutexGuard<'_, PhaseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ProxyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ProxyController")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("side", &self.config.side)
            .field("current", &state.current)
            .field("last_passed", &state.last_passed)
            .field("pending_phases", &state.registry.pending_phases())
            .field("registry", &state.registry)
            .finish()
    }
}
