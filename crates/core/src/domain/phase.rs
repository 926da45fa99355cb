//! Ordered lifecycle checkpoints and their binding to host phase identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// A named checkpoint in the host's loading lifecycle.
///
/// Variants are declared in the order the host signals them, so the derived
/// `Ord` is the lifecycle order. Every phase is bound to exactly one host
/// phase id and no two phases share one.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Sentinel before every other phase. Never opened.
    #[default]
    Startup,
    Load,
    Construct,
    PreInit,
    Init,
    PostInit,
    /// Loading finished; the game is usable.
    Available,
    ServerAboutToStart,
    ServerStarting,
    ServerStarted,
    ServerStopping,
    ServerStopped,
    Errored,
}

impl LifecyclePhase {
    /// Every phase in lifecycle order.
    pub const ALL: [LifecyclePhase; 13] = [
        Self::Startup,
        Self::Load,
        Self::Construct,
        Self::PreInit,
        Self::Init,
        Self::PostInit,
        Self::Available,
        Self::ServerAboutToStart,
        Self::ServerStarting,
        Self::ServerStarted,
        Self::ServerStopping,
        Self::ServerStopped,
        Self::Errored,
    ];

    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Load => "load",
            Self::Construct => "construct",
            Self::PreInit => "pre_init",
            Self::Init => "init",
            Self::PostInit => "post_init",
            Self::Available => "available",
            Self::ServerAboutToStart => "server_about_to_start",
            Self::ServerStarting => "server_starting",
            Self::ServerStarted => "server_started",
            Self::ServerStopping => "server_stopping",
            Self::ServerStopped => "server_stopped",
            Self::Errored => "errored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.as_str() == s)
    }

    /// The identifier the host uses when it signals this phase.
    pub fn host_id(&self) -> &'static str {
        match self {
            Self::Startup => "unloaded",
            Self::Load => "loaded",
            Self::Construct => "construction",
            Self::PreInit => "pre_initialization",
            Self::Init => "initialization",
            Self::PostInit => "post_initialization",
            Self::Available => "load_complete",
            Self::ServerAboutToStart => "server_about_to_start",
            Self::ServerStarting => "server_starting",
            Self::ServerStarted => "server_started",
            Self::ServerStopping => "server_stopping",
            Self::ServerStopped => "server_stopped",
            Self::Errored => "errored",
        }
    }

    /// Translate an incoming host signal id into the phase it opens.
    pub fn from_host_id(host_id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.host_id() == host_id)
            .ok_or_else(|| CoreError::UnmappedHostPhase(host_id.to_string()))
    }

    /// Whether the host ever sends a signal for this phase.
    ///
    /// Entries targeting an unsignaled phase are accepted but never run.
    pub fn is_signaled(&self) -> bool {
        !matches!(self, Self::Startup | Self::Load | Self::Errored)
    }

    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    /// Phases the host signals, in order.
    pub fn signaled() -> impl Iterator<Item = LifecyclePhase> {
        Self::ALL.into_iter().filter(LifecyclePhase::is_signaled)
    }

    /// Check that no two phases share a host id.
    ///
    /// Run once at startup; a failure is a configuration defect.
    pub fn validate_host_mapping() -> Result<()> {
        for (i, first) in Self::ALL.iter().enumerate() {
            if let Some(second) = Self::ALL[i + 1..]
                .iter()
                .find(|other| other.host_id() == first.host_id())
            {
                return Err(CoreError::AmbiguousHostMapping {
                    host_id: first.host_id().to_string(),
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_is_in_ordinal_order() {
        for (i, phase) in LifecyclePhase::ALL.iter().enumerate() {
            assert_eq!(phase.ordinal(), i);
        }
        for pair in LifecyclePhase::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should be before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_host_mapping_is_bijective() {
        LifecyclePhase::validate_host_mapping().unwrap();

        let ids: HashSet<_> = LifecyclePhase::ALL.iter().map(|p| p.host_id()).collect();
        assert_eq!(ids.len(), LifecyclePhase::ALL.len());

        for phase in LifecyclePhase::ALL {
            assert_eq!(LifecyclePhase::from_host_id(phase.host_id()), Ok(phase));
        }
    }

    #[test]
    fn test_unmapped_host_id() {
        assert_eq!(
            LifecyclePhase::from_host_id("world_tick"),
            Err(CoreError::UnmappedHostPhase("world_tick".to_string()))
        );
    }

    #[test]
    fn test_parse_round_trips_names() {
        for phase in LifecyclePhase::ALL {
            assert_eq!(LifecyclePhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(LifecyclePhase::parse("preinit"), None);
    }

    #[test]
    fn test_sentinel_and_unsignaled_phases() {
        assert_eq!(LifecyclePhase::default(), LifecyclePhase::Startup);
        assert!(!LifecyclePhase::Startup.is_signaled());
        assert!(!LifecyclePhase::Load.is_signaled());
        assert!(!LifecyclePhase::Errored.is_signaled());
        assert_eq!(LifecyclePhase::signaled().count(), 10);
        assert_eq!(
            LifecyclePhase::signaled().next(),
            Some(LifecyclePhase::Construct)
        );
    }

    #[test]
    fn test_next() {
        assert_eq!(LifecyclePhase::Startup.next(), Some(LifecyclePhase::Load));
        assert_eq!(LifecyclePhase::PostInit.next(), Some(LifecyclePhase::Available));
        assert_eq!(LifecyclePhase::Errored.next(), None);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&LifecyclePhase::ServerAboutToStart).unwrap();
        assert_eq!(json, "\"server_about_to_start\"");
        let phase: LifecyclePhase = serde_json::from_str("\"pre_init\"").unwrap();
        assert_eq!(phase, LifecyclePhase::PreInit);
    }
}
