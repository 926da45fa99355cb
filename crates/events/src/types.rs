//! Event types emitted during a controller's lifecycle

use chrono::{DateTime, Utc};
use lifecycle_core::{HookStage, LifecyclePhase};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: LifecycleEvent,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: LifecycleEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Where an admitted entry was queued
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionKind {
    /// Waiting for a future phase
    Pending,
    /// Runs before the currently open phase closes
    Deferred,
}

/// Everything a controller reports while the host drives it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A phase window opened
    #[serde(rename = "phase.entered")]
    PhaseEntered {
        controller_id: Uuid,
        phase: LifecyclePhase,
    },

    /// A phase window closed
    #[serde(rename = "phase.left")]
    PhaseLeft {
        controller_id: Uuid,
        phase: LifecyclePhase,
        dispatched: usize,
        failed: usize,
    },

    /// An entry was accepted for scheduling
    #[serde(rename = "entry.admitted")]
    EntryAdmitted {
        controller_id: Uuid,
        entry: String,
        phase: LifecyclePhase,
        kind: AdmissionKind,
    },

    /// An entry targeted a phase that already closed
    #[serde(rename = "entry.rejected")]
    EntryRejected {
        controller_id: Uuid,
        entry: String,
        phase: LifecyclePhase,
        last_passed: LifecyclePhase,
    },

    /// One of an entry's hooks failed; the rest of the phase carried on
    #[serde(rename = "hook.failed")]
    HookFailed {
        controller_id: Uuid,
        entry: String,
        phase: LifecyclePhase,
        stage: HookStage,
        message: String,
    },
}

impl LifecycleEvent {
    /// Controller that emitted this event
    pub fn controller_id(&self) -> Uuid {
        match self {
            LifecycleEvent::PhaseEntered { controller_id, .. }
            | LifecycleEvent::PhaseLeft { controller_id, .. }
            | LifecycleEvent::EntryAdmitted { controller_id, .. }
            | LifecycleEvent::EntryRejected { controller_id, .. }
            | LifecycleEvent::HookFailed { controller_id, .. } => *controller_id,
        }
    }

    /// Phase the event concerns
    pub fn phase(&self) -> LifecyclePhase {
        match self {
            LifecycleEvent::PhaseEntered { phase, .. }
            | LifecycleEvent::PhaseLeft { phase, .. }
            | LifecycleEvent::EntryAdmitted { phase, .. }
            | LifecycleEvent::EntryRejected { phase, .. }
            | LifecycleEvent::HookFailed { phase, .. } => *phase,
        }
    }
}
