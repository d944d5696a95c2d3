//! Platform constraint parsing

use std::fmt;
use std::str::FromStr;

use crate::error::ResolveError;

/// An OS/architecture pair selecting one manifest out of a multi-platform
/// image index. Hashable so it can participate in cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: String,
    pub architecture: String,
}

impl FromStr for Platform {
    type Err = ResolveError;

    fn from_str(platform: &str) -> Result<Self, Self::Err> {
        let frags: Vec<&str> = platform.split('/').collect();
        if frags.len() != 2 || frags[0].is_empty() || frags[1].is_empty() {
            return Err(ResolveError::InvalidPlatform(platform.to_string()));
        }
        Ok(Platform {
            os: frags[0].to_string(),
            architecture: frags[1].to_string(),
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)
    }
}
