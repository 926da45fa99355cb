use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Which half of a client/server split a controller serves.
///
/// Only client controllers run `register_client` hooks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Client,
    #[default]
    Server,
}

impl Side {
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            _ => Err(CoreError::UnknownSide(s.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Side::parse("client"), Ok(Side::Client));
        assert_eq!(Side::parse(" Server "), Ok(Side::Server));
        assert!(matches!(Side::parse("both"), Err(CoreError::UnknownSide(s)) if s == "both"));
    }

    #[test]
    fn test_is_client() {
        assert!(Side::Client.is_client());
        assert!(!Side::Server.is_client());
        assert!(!Side::default().is_client());
    }
}
