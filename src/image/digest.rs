//! SHA256 digest utilities
//!
//! Registries are expected to return a `Docker-Content-Digest` header with
//! every manifest response, but the header is optional in the distribution
//! spec. When it is missing the digest is computed here from the raw
//! manifest bytes, which is exactly how the header value is defined.

use sha2::Digest;

/// Utilities for working with content digests in registry context
pub struct DigestUtils;

impl DigestUtils {
    /// Compute the hex SHA256 of raw bytes.
    pub fn compute_sha256(data: &[u8]) -> String {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Compute a full registry digest (with `sha256:` prefix) from raw bytes.
    ///
    /// The input must be the manifest body byte-for-byte as served by the
    /// registry; any re-serialization changes the digest.
    pub fn compute_docker_digest(data: &[u8]) -> String {
        format!("sha256:{}", Self::compute_sha256(data))
    }

    /// Validate a SHA256 hex string (64 characters, all hex).
    pub fn is_valid_sha256_hex(digest: &str) -> bool {
        digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Validate a full registry digest (`sha256:` followed by 64 hex chars).
    pub fn is_valid_docker_digest(digest: &str) -> bool {
        match digest.strip_prefix("sha256:") {
            Some(hex_part) => Self::is_valid_sha256_hex(hex_part),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_matches_manual_sha256() {
        let manifest_body = br#"{"schemaVersion":2,"mediaType":"application/vnd.oci.image.manifest.v1+json"}"#;
        let digest = DigestUtils::compute_docker_digest(manifest_body);
        let expected = format!("sha256:{}", DigestUtils::compute_sha256(manifest_body));
        assert_eq!(digest, expected);
        assert!(DigestUtils::is_valid_docker_digest(&digest));
    }

    #[test]
    fn test_digest_validation() {
        assert!(DigestUtils::is_valid_docker_digest(
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        ));
        assert!(!DigestUtils::is_valid_docker_digest("sha256:nothex"));
        assert!(!DigestUtils::is_valid_docker_digest(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        ));
        assert!(!DigestUtils::is_valid_docker_digest("md5:abcd"));
    }
}
