use thiserror::Error;

use crate::domain::phase::LifecyclePhase;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("No lifecycle phase is bound to host phase id '{0}'")]
    UnmappedHostPhase(String),

    #[error("Host phase id '{host_id}' is bound to both {first} and {second}")]
    AmbiguousHostMapping {
        host_id: String,
        first: LifecyclePhase,
        second: LifecyclePhase,
    },

    #[error("Unknown side: {0}")]
    UnknownSide(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::UnmappedHostPhase("world_tick".to_string());
        assert!(error.to_string().contains("world_tick"));

        let error = CoreError::AmbiguousHostMapping {
            host_id: "construction".to_string(),
            first: LifecyclePhase::Construct,
            second: LifecyclePhase::PreInit,
        };
        let message = error.to_string();
        assert!(message.contains("construct"));
        assert!(message.contains("pre_init"));
    }
}
