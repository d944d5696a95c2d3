//! Credential lookup for registry authentication
//!
//! The resolver never implements authentication; it passes a
//! [`CredentialSource`] through to the transport, which consults it when a
//! registry demands a token. The default source reads the Docker config file
//! the way the docker CLI keychain does; tests substitute [`StaticCredentials`]
//! or [`Anonymous`].

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::error::Result;

/// Username/password pair for one registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

/// Per-registry credential lookup, injected into the transport.
pub trait CredentialSource: Send + Sync {
    fn lookup(&self, registry: &str) -> Option<Credential>;
}

/// No credentials; every token exchange is anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialSource for Anonymous {
    fn lookup(&self, _registry: &str) -> Option<Credential> {
        None
    }
}

/// Fixed in-memory credential table.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    entries: HashMap<String, Credential>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(
        mut self,
        registry: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.entries.insert(
            registry.into(),
            Credential {
                username: username.into(),
                password: password.into(),
            },
        );
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn lookup(&self, registry: &str) -> Option<Credential> {
        self.entries.get(registry).cloned()
    }
}

#[derive(Debug, Deserialize, Default)]
struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, DockerAuthEntry>,
}

#[derive(Debug, Deserialize, Clone)]
struct DockerAuthEntry {
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// Credentials from the Docker CLI config file.
///
/// Reads `$DOCKER_CONFIG/config.json`, falling back to
/// `$HOME/.docker/config.json`. A missing file yields an empty keychain, not
/// an error, so anonymous-only environments work out of the box.
#[derive(Debug, Default)]
pub struct DockerConfigCredentials {
    auths: HashMap<String, DockerAuthEntry>,
}

impl DockerConfigCredentials {
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)?;
                Self::from_json(&contents)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: DockerConfigFile = serde_json::from_str(json)?;
        Ok(Self {
            auths: config.auths,
        })
    }

    fn config_path() -> Option<PathBuf> {
        if let Some(dir) = env::var_os("DOCKER_CONFIG") {
            return Some(PathBuf::from(dir).join("config.json"));
        }
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".docker").join("config.json"))
    }

    fn entry_for(&self, registry: &str) -> Option<&DockerAuthEntry> {
        if let Some(entry) = self.auths.get(registry) {
            return Some(entry);
        }
        // Docker Hub logins are stored under legacy keys.
        if registry == "index.docker.io" || registry == "registry-1.docker.io" {
            for alias in [
                "https://index.docker.io/v1/",
                "index.docker.io",
                "docker.io",
            ] {
                if let Some(entry) = self.auths.get(alias) {
                    return Some(entry);
                }
            }
        }
        None
    }
}

impl CredentialSource for DockerConfigCredentials {
    fn lookup(&self, registry: &str) -> Option<Credential> {
        let entry = self.entry_for(registry)?;

        if let (Some(username), Some(password)) = (&entry.username, &entry.password) {
            return Some(Credential {
                username: username.clone(),
                password: password.clone(),
            });
        }

        // The common form: a base64 "user:pass" blob under "auth".
        let decoded = BASE64.decode(entry.auth.as_deref()?).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Credential {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_base64_auth_entry() {
        // "user:secret"
        let config = r#"{"auths":{"ghcr.io":{"auth":"dXNlcjpzZWNyZXQ="}}}"#;
        let keychain = DockerConfigCredentials::from_json(config).unwrap();

        let credential = keychain.lookup("ghcr.io").unwrap();
        assert_eq!(credential.username, "user");
        assert_eq!(credential.password, "secret");
        assert!(keychain.lookup("quay.io").is_none());
    }

    #[test]
    fn test_docker_hub_legacy_key() {
        let config = r#"{"auths":{"https://index.docker.io/v1/":{"auth":"dXNlcjpzZWNyZXQ="}}}"#;
        let keychain = DockerConfigCredentials::from_json(config).unwrap();

        assert!(keychain.lookup("index.docker.io").is_some());
        assert!(keychain.lookup("registry-1.docker.io").is_some());
        assert!(keychain.lookup("ghcr.io").is_none());
    }

    #[test]
    fn test_plain_username_password_entry() {
        let config = r#"{"auths":{"localhost:5000":{"username":"admin","password":"hunter2"}}}"#;
        let keychain = DockerConfigCredentials::from_json(config).unwrap();

        let credential = keychain.lookup("localhost:5000").unwrap();
        assert_eq!(credential.username, "admin");
        assert_eq!(credential.password, "hunter2");
    }

    #[test]
    fn test_static_credentials_lookup() {
        let source = StaticCredentials::new().with_credential("ghcr.io", "bot", "token");
        assert_eq!(source.lookup("ghcr.io").unwrap().username, "bot");
        assert!(source.lookup("docker.io").is_none());
        assert!(Anonymous.lookup("ghcr.io").is_none());
    }
}
