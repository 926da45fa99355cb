use serde::{Deserialize, Serialize};

use crate::domain::phase::LifecyclePhase;
use crate::error::Result;

/// A phase signal as delivered by the host.
///
/// Controllers only read `host_id`. The rest travels unchanged to whichever
/// collaborator asks the active controller for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSignal {
    pub host_id: String,
    /// Mod the host is currently loading, when the host provides one.
    pub mod_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl PhaseSignal {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            mod_id: None,
            payload: serde_json::Value::Null,
        }
    }

    /// Signal for `phase` using its bound host id.
    pub fn for_phase(phase: LifecyclePhase) -> Self {
        Self::new(phase.host_id())
    }

    pub fn with_mod_id(mut self, mod_id: impl Into<String>) -> Self {
        self.mod_id = Some(mod_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn phase(&self) -> Result<LifecyclePhase> {
        LifecyclePhase::from_host_id(&self.host_id)
    }
}
