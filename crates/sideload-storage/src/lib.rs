//! # sideload-storage
//!
//! Filesystem side of sideload: the single-artifact store that uploads
//! stream into, and the read-only asset tree behind the landing page.

pub mod artifact;
pub mod assets;

pub use artifact::{ArtifactReceipt, ArtifactStore, ArtifactWriter, CopyError};
pub use assets::{AssetStore, StaticAsset};
