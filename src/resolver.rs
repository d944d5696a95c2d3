//! Reference resolution pipeline
//!
//! Turns a raw matched-text fragment (`FROM nginx:1.21`, `image: "redis"`)
//! into a rewrite instruction pinning the reference to its current digest.
//! The pipeline: strip the prefix, apply the exclusion policy, parse the
//! reference, validate the platform constraint, resolve the digest through
//! the cache or the transport, and detect the already-pinned no-op.

use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheKey, DigestCache};
use crate::config::ResolveConfig;
use crate::error::Result;
use crate::image::{ImageReference, Platform};
use crate::registry::credentials::{Anonymous, CredentialSource, DockerConfigCredentials};
use crate::registry::{RegistryClient, RemoteOptions, Transport};

/// Combined pattern recognizing `image:` fields (YAML, Compose, Kubernetes)
/// and `FROM` lines (Dockerfile). The driving tool compiles and applies it;
/// matched substrings come back here for resolution.
pub const CONTAINER_IMAGE_REGEX: &str = r#"image\s*:\s*["']?([^\s"']+/[^\s"']+|[^\s"']+)(:[^\s"']+)?(@[^\s"']+)?["']?|FROM\s+([^\s]+(/[^\s]+)?(:[^\s]+)?(@[^\s]+)?)"#;

/// Entity tag distinguishing container-image rewrites from other reference
/// types the driver may handle.
pub const REFERENCE_TYPE: &str = "container";

const PREFIX_FROM: &str = "FROM ";
const PREFIX_IMAGE: &str = "image: ";

/// The registry-less pseudo image used as an empty base; never resolvable.
const EXCLUDED_BASE: &str = "scratch";

/// A rewrite instruction for the driver: the replacement line is
/// `prefix + name + separator + digest`, with `tag` preserving what the
/// source text originally said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Canonical registry/repository name.
    pub name: String,
    /// Resolved content digest (`sha256:...`), or the identifier as written
    /// when produced by [`convert_to_entity_ref`].
    pub digest: String,
    /// The tag or digest as written in the source text.
    pub tag: String,
    /// Literal text to prepend when reconstructing the line.
    pub prefix: String,
    pub ref_type: &'static str,
}

/// Why a match produced no rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The reference names a base image excluded from resolution.
    ExcludedBase(String),
    /// The reference is already pinned to the current digest.
    AlreadyPinned(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExcludedBase(reference) => {
                write!(f, "image reference {} is excluded from resolution", reference)
            }
            SkipReason::AlreadyPinned(reference) => {
                write!(f, "image already referenced by digest: {}", reference)
            }
        }
    }
}

/// Outcome of resolving one match. A skip is an expected no-op, never a
/// failure: the driver leaves the line unchanged and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(EntityRef),
    Skipped(SkipReason),
}

impl Resolution {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Resolution::Skipped(_))
    }

    pub fn entity(self) -> Option<EntityRef> {
        match self {
            Resolution::Resolved(entity) => Some(entity),
            Resolution::Skipped(_) => None,
        }
    }
}

/// Resolves matched image references to digest-pinned rewrites.
///
/// Stateless apart from the injected cache, credential source and regex
/// configuration; one resolver instance serves concurrent callers.
pub struct ReferenceResolver {
    regex: String,
    cache: Option<DigestCache>,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialSource>,
}

impl ReferenceResolver {
    /// Resolver with the default registry transport and the Docker config
    /// keychain.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(RegistryClient::new()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            regex: CONTAINER_IMAGE_REGEX.to_string(),
            cache: Some(DigestCache::new()),
            transport,
            credentials: default_credentials(),
        }
    }

    /// Share a cache across resolvers, e.g. one per document batch.
    pub fn set_cache(&mut self, cache: DigestCache) {
        self.cache = Some(cache);
    }

    /// Always resolve remotely.
    pub fn disable_cache(&mut self) {
        self.cache = None;
    }

    pub fn set_credentials(&mut self, credentials: Arc<dyn CredentialSource>) {
        self.credentials = credentials;
    }

    pub fn set_regex(&mut self, regex: impl Into<String>) {
        self.regex = regex.into();
    }

    /// Pattern the driver should use to locate candidate matches.
    pub fn regex(&self) -> &str {
        &self.regex
    }

    /// Resolve one matched text fragment.
    ///
    /// Cancellation is cooperative: dropping the returned future aborts any
    /// in-flight registry call. No retries, no internal timeouts; the caller
    /// owns that policy.
    pub async fn resolve(&self, matched_text: &str, cfg: &ResolveConfig) -> Result<Resolution> {
        let (text, prefix) = strip_known_prefix(matched_text);

        // The exclusion policy only applies to Dockerfile base images.
        if prefix == Some(PREFIX_FROM) && text == EXCLUDED_BASE {
            return Ok(Resolution::Skipped(SkipReason::ExcludedBase(
                text.to_string(),
            )));
        }

        // Validate everything before touching the network.
        let platform = cfg.parsed_platform()?;
        let reference: ImageReference = text.parse()?;

        let digest = self.cached_digest(text, &reference, platform).await?;

        if digest == reference.identifier {
            return Ok(Resolution::Skipped(SkipReason::AlreadyPinned(
                text.to_string(),
            )));
        }

        Ok(Resolution::Resolved(EntityRef {
            name: reference.canonical_name(),
            digest,
            tag: reference.identifier,
            prefix: prefix.unwrap_or("").to_string(),
            ref_type: REFERENCE_TYPE,
        }))
    }

    /// Cache-or-fetch. This is the only path to the transport, so digest
    /// fetching exists exactly once.
    async fn cached_digest(
        &self,
        raw_reference: &str,
        reference: &ImageReference,
        platform: Option<Platform>,
    ) -> Result<String> {
        let Some(cache) = &self.cache else {
            return self.fetch_digest(reference, platform).await;
        };

        let key = CacheKey::new(raw_reference, platform.as_ref());
        if let Some(digest) = cache.load(&key) {
            return Ok(digest);
        }

        let digest = self.fetch_digest(reference, platform).await?;
        cache.store(key, digest.clone());
        Ok(digest)
    }

    async fn fetch_digest(
        &self,
        reference: &ImageReference,
        platform: Option<Platform>,
    ) -> Result<String> {
        let options = RemoteOptions::new(platform, Arc::clone(&self.credentials));
        self.transport.get_digest(reference, &options).await
    }
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// The Docker config keychain when readable, anonymous otherwise. An
/// unreadable or malformed config file must not break public-image runs.
fn default_credentials() -> Arc<dyn CredentialSource> {
    match DockerConfigCredentials::load() {
        Ok(keychain) => Arc::new(keychain),
        Err(_) => Arc::new(Anonymous),
    }
}

/// Convert an already-known reference string into the structured entity
/// shape without any network call, e.g. for lockfile entries. The digest
/// field carries the identifier as written.
pub fn convert_to_entity_ref(reference: &str) -> Result<EntityRef> {
    let (text, _) = strip_known_prefix(reference);
    let parsed: ImageReference = text.parse()?;

    Ok(EntityRef {
        name: parsed.registry_repo,
        digest: parsed.identifier.clone(),
        tag: parsed.identifier,
        prefix: String::new(),
        ref_type: REFERENCE_TYPE,
    })
}

fn strip_known_prefix(matched_text: &str) -> (&str, Option<&'static str>) {
    if let Some(rest) = matched_text.strip_prefix(PREFIX_FROM) {
        (trim_quotes(rest), Some(PREFIX_FROM))
    } else if let Some(rest) = matched_text.strip_prefix(PREFIX_IMAGE) {
        (trim_quotes(rest), Some(PREFIX_IMAGE))
    } else {
        (trim_quotes(matched_text), None)
    }
}

fn trim_quotes(text: &str) -> &str {
    text.trim().trim_matches(|c| c == '"' || c == '\'')
}
