//! Registry transport for digest resolution
//!
//! The resolver only needs one registry capability: "give me the digest
//! descriptor for this reference, optionally narrowed to a platform". The
//! [`Transport`] trait is that seam; [`RegistryClient`] is the default
//! implementation speaking the distribution v2 API.

pub mod auth;
pub mod client;
pub mod credentials;

pub use client::{RegistryClient, RegistryClientBuilder};
pub use credentials::{
    Anonymous, Credential, CredentialSource, DockerConfigCredentials, StaticCredentials,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::image::{ImageReference, Platform};

/// Options carried with one remote digest query: client identity, optional
/// platform selector and the credential lookup to consult on a 401.
#[derive(Clone)]
pub struct RemoteOptions {
    pub user_agent: String,
    pub platform: Option<Platform>,
    pub credentials: Arc<dyn CredentialSource>,
}

impl RemoteOptions {
    pub fn new(platform: Option<Platform>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            user_agent: crate::USER_AGENT.to_string(),
            platform,
            credentials,
        }
    }
}

/// Remote registry collaborator.
///
/// Implementations resolve a reference to its current manifest digest.
/// Errors pass through the resolver unmodified, so an implementation should
/// surface transport failures as-is rather than flattening them to strings.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_digest(
        &self,
        reference: &ImageReference,
        options: &RemoteOptions,
    ) -> Result<String>;
}
