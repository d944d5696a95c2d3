//! Image reference parsing

use std::fmt;
use std::str::FromStr;

use crate::error::ResolveError;

/// Default registry host for short names like `nginx` or `myuser/myimage`.
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

/// Namespace prefixed to single-component Docker Hub repositories.
pub const DEFAULT_NAMESPACE: &str = "library";

/// Whether the identifier portion of a reference is a mutable tag or an
/// immutable digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Tag,
    Digest,
}

/// A parsed container image reference.
///
/// `registry_repo` is the image name without its identifier (e.g.
/// `ghcr.io/org/app` or just `nginx`); `identifier` is the tag or digest that
/// followed `:` or `@`. A reference with no separator gets the implicit
/// `latest` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub registry_repo: String,
    pub identifier: String,
    pub kind: ReferenceKind,
}

impl FromStr for ImageReference {
    type Err = ResolveError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ResolveError::InvalidReference(reference.to_string()));
        }

        let (sep, kind) = if reference.contains('@') {
            (Some('@'), ReferenceKind::Digest)
        } else if reference.contains(':') {
            (Some(':'), ReferenceKind::Tag)
        } else {
            (None, ReferenceKind::Tag)
        };

        let (registry_repo, identifier) = match sep {
            Some(sep) => {
                let frags: Vec<&str> = reference.split(sep).collect();
                if frags.len() != 2 || frags[0].is_empty() || frags[1].is_empty() {
                    return Err(ResolveError::InvalidReference(reference.to_string()));
                }
                (frags[0].to_string(), frags[1].to_string())
            }
            None => (reference.to_string(), "latest".to_string()),
        };

        Ok(ImageReference {
            registry_repo,
            identifier,
            kind,
        })
    }
}

impl ImageReference {
    /// Canonical registry/repository name with the default registry and
    /// namespace filled in: `nginx` becomes `index.docker.io/library/nginx`,
    /// `myuser/app` becomes `index.docker.io/myuser/app`, and anything whose
    /// first path component looks like a host is returned unchanged.
    pub fn canonical_name(&self) -> String {
        match self.registry_repo.split_once('/') {
            None => format!(
                "{}/{}/{}",
                DEFAULT_REGISTRY, DEFAULT_NAMESPACE, self.registry_repo
            ),
            Some((first, _)) if is_registry_host(first) => self.registry_repo.clone(),
            Some(_) => format!("{}/{}", DEFAULT_REGISTRY, self.registry_repo),
        }
    }

    /// Registry host portion of the canonical name.
    pub fn registry(&self) -> String {
        let canonical = self.canonical_name();
        match canonical.split_once('/') {
            Some((host, _)) => host.to_string(),
            None => canonical,
        }
    }

    /// Repository path portion of the canonical name (everything after the
    /// registry host).
    pub fn repository(&self) -> String {
        let canonical = self.canonical_name();
        match canonical.split_once('/') {
            Some((_, repo)) => repo.to_string(),
            None => canonical,
        }
    }

    /// Separator that joins name and identifier when reconstructing the
    /// reference text.
    pub fn separator(&self) -> char {
        match self.kind {
            ReferenceKind::Tag => ':',
            ReferenceKind::Digest => '@',
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.registry_repo,
            self.separator(),
            self.identifier
        )
    }
}

/// A path component is a registry host if it carries a dot (domain), a colon
/// (port) or is `localhost`. Plain words are Docker Hub namespaces.
fn is_registry_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}
