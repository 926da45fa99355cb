use lifecycle_core::{LifecyclePhase, Side};

use crate::error::{OrchestratorError, Result};

/// Environment variable naming the mod a controller serves.
pub const NAME_ENV: &str = "LIFECYCLE_PROXY_NAME";
/// `client` or `server`.
pub const SIDE_ENV: &str = "LIFECYCLE_PROXY_SIDE";
/// Set to `false` to keep controllers off the host bus.
pub const ATTACH_ENV: &str = "LIFECYCLE_PROXY_ATTACH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Mod id, used in logs and by collaborators that need it.
    pub name: String,
    pub side: Side,
    /// Whether `HostBus::register` attaches the controller.
    pub auto_attach: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: "proxy".to_string(),
            side: Side::Server,
            auto_attach: true,
        }
    }
}

impl ControllerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_auto_attach(mut self, attach: bool) -> Self {
        self.auto_attach = attach;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let name = lookup(NAME_ENV).unwrap_or(defaults.name);

        let side = match lookup(SIDE_ENV) {
            Some(raw) => Side::parse(&raw)
                .map_err(|_| OrchestratorError::InvalidConfig(format!("{SIDE_ENV}={raw}")))?,
            None => defaults.side,
        };

        let auto_attach = match lookup(ATTACH_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|_| OrchestratorError::InvalidConfig(format!("{ATTACH_ENV}={raw}")))?,
            None => defaults.auto_attach,
        };

        let config = Self {
            name,
            side,
            auto_attach,
        };
        config.validate()?;
        Ok(config)
    }

    /// Startup checks. A failure here is a configuration defect.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "controller name must not be empty".to_string(),
            ));
        }
        LifecyclePhase::validate_host_mapping()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.side, Side::Server);
        assert!(config.auto_attach);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = ControllerConfig::from_lookup(lookup(&[
            (NAME_ENV, "examplemod"),
            (SIDE_ENV, "client"),
            (ATTACH_ENV, "false"),
        ]))
        .unwrap();

        assert_eq!(config.name, "examplemod");
        assert_eq!(config.side, Side::Client);
        assert!(!config.auto_attach);
    }

    #[test]
    fn test_invalid_values() {
        let err = ControllerConfig::from_lookup(lookup(&[(SIDE_ENV, "both")])).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(msg) if msg.contains("both")));

        let err = ControllerConfig::from_lookup(lookup(&[(ATTACH_ENV, "nope")])).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(_)));

        let err = ControllerConfig::from_lookup(lookup(&[(NAME_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_builders() {
        let config = ControllerConfig::new("examplemod")
            .with_side(Side::Client)
            .with_auto_attach(false);
        assert_eq!(config.name, "examplemod");
        assert!(config.side.is_client());
        assert!(!config.auto_attach);
        assert!(config.validate().is_ok());
    }
}
