//! Registry client resolving references to manifest digests
//!
//! Speaks the distribution v2 manifest endpoint: one GET per reference, a
//! token exchange and retry on 401, and platform selection when the response
//! is a multi-platform index. No content beyond the manifest descriptor is
//! ever fetched.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{ResolveError, Result};
use crate::image::{DigestUtils, ImageReference, Platform};
use crate::logging::Logger;
use crate::registry::auth;
use crate::registry::{RemoteOptions, Transport};

/// Accept set covering both Docker and OCI manifest flavors, single- and
/// multi-platform.
const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";

const DOCKER_CONTENT_DIGEST: &str = "docker-content-digest";

pub struct RegistryClientBuilder {
    skip_tls: bool,
    logger: Logger,
}

impl RegistryClientBuilder {
    pub fn new() -> Self {
        Self {
            skip_tls: false,
            logger: Logger::default(),
        }
    }

    /// Accept invalid certificates, for self-hosted registries behind
    /// self-signed TLS.
    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let client = if self.skip_tls {
            Client::builder()
                .danger_accept_invalid_certs(true)
                .build()?
        } else {
            Client::new()
        };

        Ok(RegistryClient {
            client,
            logger: self.logger,
        })
    }
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Default [`Transport`] implementation over HTTPS.
pub struct RegistryClient {
    client: Client,
    logger: Logger,
}

impl RegistryClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            logger: Logger::default(),
        }
    }

    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::new()
    }

    fn manifest_url(reference: &ImageReference) -> String {
        format!(
            "https://{}/v2/{}/manifests/{}",
            api_host(&reference.registry()),
            reference.repository(),
            reference.identifier
        )
    }

    fn manifest_request(
        &self,
        url: &str,
        options: &RemoteOptions,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, MANIFEST_ACCEPT)
            .header(reqwest::header::USER_AGENT, options.user_agent.as_str());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn authenticate(
        &self,
        response: &reqwest::Response,
        reference: &ImageReference,
        options: &RemoteOptions,
    ) -> Result<Option<String>> {
        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        let Some(challenge) = auth::parse_auth_challenge(header) else {
            self.logger
                .detail("401 without a Bearer challenge, retrying unauthenticated");
            return Ok(None);
        };

        auth::exchange_token(
            &self.client,
            &challenge,
            &reference.registry(),
            &reference.repository(),
            options.credentials.as_ref(),
            &self.logger,
        )
        .await
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RegistryClient {
    async fn get_digest(
        &self,
        reference: &ImageReference,
        options: &RemoteOptions,
    ) -> Result<String> {
        let url = Self::manifest_url(reference);
        self.logger
            .verbose(&format!("Resolving {} via {}", reference, url));

        let mut response = self.manifest_request(&url, options, None).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let token = self.authenticate(&response, reference, options).await?;
            response = self
                .manifest_request(&url, options, token.as_deref())
                .send()
                .await?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResolveError::Registry(format!(
                "manifest not found for {}",
                reference
            )));
        }
        if !status.is_success() {
            return Err(ResolveError::Registry(format!(
                "manifest request for {} failed with status {}",
                reference, status
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        let header_digest = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if let Some(platform) = &options.platform {
            if is_manifest_index(&content_type) {
                let index: ManifestIndex = serde_json::from_slice(&response.bytes().await?)?;
                return select_platform_digest(&index, platform, reference);
            }
            self.logger.detail(&format!(
                "{} is single-platform, {} selector not applied",
                reference, platform
            ));
        }

        if let Some(digest) = header_digest {
            return Ok(digest);
        }

        // The header is optional in the distribution spec; the digest is by
        // definition the hash of the manifest bytes as served.
        let body = response.bytes().await?;
        Ok(DigestUtils::compute_docker_digest(&body))
    }
}

/// Docker Hub's registry API lives on a different host than its canonical
/// image names.
fn api_host(registry: &str) -> String {
    match registry {
        "docker.io" | "index.docker.io" => "registry-1.docker.io".to_string(),
        other => other.to_string(),
    }
}

fn is_manifest_index(content_type: &str) -> bool {
    content_type.contains("manifest.list.v2+json") || content_type.contains("image.index.v1+json")
}

#[derive(Debug, Deserialize)]
struct ManifestIndex {
    #[serde(default)]
    manifests: Vec<ManifestDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ManifestDescriptor {
    digest: String,
    #[serde(default)]
    platform: Option<DescriptorPlatform>,
}

#[derive(Debug, Deserialize)]
struct DescriptorPlatform {
    os: String,
    architecture: String,
}

fn select_platform_digest(
    index: &ManifestIndex,
    platform: &Platform,
    reference: &ImageReference,
) -> Result<String> {
    index
        .manifests
        .iter()
        .find(|descriptor| {
            descriptor.platform.as_ref().is_some_and(|p| {
                p.os == platform.os && p.architecture == platform.architecture
            })
        })
        .map(|descriptor| descriptor.digest.clone())
        .ok_or_else(|| {
            ResolveError::Registry(format!(
                "no manifest for platform {} in {}",
                platform, reference
            ))
        })
}
