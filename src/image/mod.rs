//! Container image reference handling
//!
//! Types and logic for decomposing textual image references into their
//! registry/repository and tag-or-digest parts, canonicalizing short names,
//! and validating platform constraints.

pub mod digest;
pub mod platform;
pub mod reference;

pub use digest::DigestUtils;
pub use platform::Platform;
pub use reference::{ImageReference, ReferenceKind};
