//! Bearer-token authentication for registry access

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{ResolveError, Result};
use crate::logging::Logger;
use crate::registry::credentials::CredentialSource;

/// Parameters of a `WWW-Authenticate: Bearer` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub realm: String,
    pub service: String,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parse a Bearer challenge header: `Bearer realm="...",service="...",scope="..."`.
///
/// Returns `None` for non-Bearer schemes and challenges without a realm; the
/// caller then retries unauthenticated and lets the registry's status speak.
pub fn parse_auth_challenge(auth_header: &str) -> Option<AuthChallenge> {
    let params_str = auth_header.strip_prefix("Bearer ")?;
    let mut params = HashMap::new();

    for param in params_str.split(',') {
        let param = param.trim();
        if let Some(eq_pos) = param.find('=') {
            let key = param[..eq_pos].trim();
            let value = param[eq_pos + 1..].trim().trim_matches('"');
            params.insert(key, value);
        }
    }

    let realm = params.get("realm")?;
    Some(AuthChallenge {
        realm: realm.to_string(),
        service: params.get("service").unwrap_or(&"").to_string(),
        scope: params.get("scope").map(|s| s.to_string()),
    })
}

/// Exchange a challenge for a bearer token at the realm endpoint.
///
/// Anonymous when the credential source has nothing for this registry; many
/// public registries hand out pull tokens without credentials. Returns
/// `Ok(None)` when the endpoint answers successfully but without a token.
pub async fn exchange_token(
    client: &Client,
    challenge: &AuthChallenge,
    registry: &str,
    repository: &str,
    credentials: &dyn CredentialSource,
    output: &Logger,
) -> Result<Option<String>> {
    let mut url = Url::parse(&challenge.realm)
        .map_err(|e| ResolveError::Auth(format!("invalid auth realm {}: {}", challenge.realm, e)))?;
    {
        let mut query = url.query_pairs_mut();
        if !challenge.service.is_empty() {
            query.append_pair("service", &challenge.service);
        }
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", repository));
        query.append_pair("scope", &scope);
    }

    output.detail(&format!("Requesting token from {}", url));

    let mut request = client.get(url.clone());
    if let Some(credential) = credentials.lookup(registry) {
        output.verbose(&format!(
            "Using credentials for {} (user: {})",
            registry, credential.username
        ));
        request = request.basic_auth(&credential.username, Some(&credential.password));
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(ResolveError::Auth(format!(
            "token request to {} failed with status {}",
            url,
            response.status()
        )));
    }

    let token_response: TokenResponse = response.json().await?;
    Ok(token_response.token.or(token_response.access_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_challenge() {
        let header = r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/nginx:pull""#;
        let challenge = parse_auth_challenge(header).unwrap();

        assert_eq!(challenge.realm, "https://auth.docker.io/token");
        assert_eq!(challenge.service, "registry.docker.io");
        assert_eq!(
            challenge.scope.as_deref(),
            Some("repository:library/nginx:pull")
        );
    }

    #[test]
    fn test_parse_challenge_without_scope() {
        let header = r#"Bearer realm="https://ghcr.io/token",service="ghcr.io""#;
        let challenge = parse_auth_challenge(header).unwrap();
        assert_eq!(challenge.service, "ghcr.io");
        assert!(challenge.scope.is_none());
    }

    #[test]
    fn test_non_bearer_schemes_are_ignored() {
        assert!(parse_auth_challenge(r#"Basic realm="registry""#).is_none());
        assert!(parse_auth_challenge("Bearer service=\"x\"").is_none());
        assert!(parse_auth_challenge("").is_none());
    }
}
