//! Configuration bundle passed alongside each match

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::Platform;

/// Match-agnostic options supplied by the driver for a whole run.
///
/// Currently only the platform constraint; future driver-level options land
/// here so the resolve signature stays stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Optional `os/arch` constraint selecting one manifest from
    /// multi-platform images. Empty or absent means "whatever the registry
    /// returns for the top-level descriptor".
    #[serde(default)]
    pub platform: Option<String>,
}

impl ResolveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(platform: impl Into<String>) -> Self {
        Self {
            platform: Some(platform.into()),
        }
    }

    /// Validate and decode the platform string. An empty string counts as
    /// unset, matching the loose YAML/flag inputs drivers forward.
    pub fn parsed_platform(&self) -> Result<Option<Platform>> {
        match self.platform.as_deref() {
            None | Some("") => Ok(None),
            Some(platform) => Ok(Some(platform.parse()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_platform_counts_as_unset() {
        assert!(ResolveConfig::new().parsed_platform().unwrap().is_none());
        let cfg = ResolveConfig {
            platform: Some(String::new()),
        };
        assert!(cfg.parsed_platform().unwrap().is_none());
    }

    #[test]
    fn test_platform_is_validated() {
        let cfg = ResolveConfig::with_platform("linux/arm64");
        let platform = cfg.parsed_platform().unwrap().unwrap();
        assert_eq!(platform.os, "linux");
        assert_eq!(platform.architecture, "arm64");

        assert!(ResolveConfig::with_platform("linux").parsed_platform().is_err());
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let cfg: ResolveConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.platform.is_none());

        let cfg: ResolveConfig = serde_json::from_str(r#"{"platform":"linux/amd64"}"#).unwrap();
        assert_eq!(cfg.platform.as_deref(), Some("linux/amd64"));
    }
}
