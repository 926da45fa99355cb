use lifecycle_core::{CoreError, HookStage, LifecyclePhase};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The entry's phase already closed on this controller. Never queued.
    #[error("Entry '{entry}' targets {target}, which is not after the last passed phase {last_passed}")]
    Admission {
        entry: String,
        target: LifecyclePhase,
        last_passed: LifecyclePhase,
    },

    /// One hook of one entry failed. Logged and isolated by the controller.
    #[error("Entry '{entry}' failed its {stage} hook in {phase}: {message}")]
    HookExecution {
        entry: String,
        phase: LifecyclePhase,
        stage: HookStage,
        message: String,
    },

    /// A controller tried to leave while other frames were above it.
    #[error("Controller {controller} left out of order; frames {blocking:?} must be popped first")]
    StackDiscipline { controller: Uuid, blocking: Vec<Uuid> },

    #[error("Controller {0} is not on this thread's active stack")]
    NotActive(Uuid),

    #[error("Phase {phase} was signalled but {last_passed} has already passed")]
    PhaseAlreadyPassed {
        phase: LifecyclePhase,
        last_passed: LifecyclePhase,
    },

    #[error("Phase {requested} was signalled while {open} is still open")]
    PhaseWindowOpen {
        requested: LifecyclePhase,
        open: LifecyclePhase,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl OrchestratorError {
    pub fn admission(entry: impl Into<String>, target: LifecyclePhase, last_passed: LifecyclePhase) -> Self {
        Self::Admission {
            entry: entry.into(),
            target,
            last_passed,
        }
    }

    pub fn hook_failed(
        entry: impl Into<String>,
        phase: LifecyclePhase,
        stage: HookStage,
        message: impl Into<String>,
    ) -> Self {
        Self::HookExecution {
            entry: entry.into(),
            phase,
            stage,
            message: message.into(),
        }
    }

    pub fn is_admission(&self) -> bool {
        matches!(self, Self::Admission { .. })
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_display() {
        let error = OrchestratorError::admission("lamp", LifecyclePhase::Init, LifecyclePhase::Init);
        assert!(error.is_admission());
        assert_eq!(
            error.to_string(),
            "Entry 'lamp' targets init, which is not after the last passed phase init"
        );
    }

    #[test]
    fn test_stack_discipline_lists_blocking_frames() {
        let controller = Uuid::new_v4();
        let above = Uuid::new_v4();
        let error = OrchestratorError::StackDiscipline {
            controller,
            blocking: vec![above],
        };
        let message = error.to_string();
        assert!(message.contains(&controller.to_string()));
        assert!(message.contains(&above.to_string()));
    }

    #[test]
    fn test_core_error_is_transparent() {
        let error: OrchestratorError = CoreError::UnmappedHostPhase("world_tick".to_string()).into();
        assert_eq!(
            error.to_string(),
            "No lifecycle phase is bound to host phase id 'world_tick'"
        );
    }
}
