//! Container image reference pinning
//!
//! This crate resolves textual container image references, as found in a
//! Dockerfile `FROM` line or a YAML `image:` field, to immutable
//! content-addressed references by querying the registry for the current
//! digest. It is the resolution core consumed by a line-rewriting driver:
//! the driver locates candidate substrings with [`resolver::CONTAINER_IMAGE_REGEX`],
//! hands each match to [`ReferenceResolver::resolve`], and applies the
//! returned rewrite.

pub mod cache;
pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod registry;
pub mod resolver;

pub use cache::DigestCache;
pub use config::ResolveConfig;
pub use error::{ResolveError, Result};
pub use resolver::{EntityRef, ReferenceResolver, Resolution, SkipReason, convert_to_entity_ref};

/// Client identity sent with every registry request.
pub const USER_AGENT: &str = concat!("refpin/", env!("CARGO_PKG_VERSION"));
