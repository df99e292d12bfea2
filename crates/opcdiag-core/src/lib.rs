//! # opcdiag-core
//!
//! Package model and content canonicalization for inspecting and diffing
//! Office Open XML packages (.docx, .pptx, .xlsx).
//!
//! This crate provides functionality to:
//! - Read a package from a zip archive or an expanded directory
//! - Present package items as canonical, diff-friendly text
//! - Diff single items or whole packages
//! - Write packages back out as a zip archive or a directory
//! - Fingerprint packages with a [`Manifest`] for equivalence checks
//!
//! ## Example: Diffing two packages
//!
//! ```no_run
//! use opcdiag_core::{DiffPresenter, Package};
//!
//! let base = Package::read("base.pptx")?;
//! let changed = Package::read("changed.pptx")?;
//!
//! let diff = DiffPresenter::new().package_diff(&base, &changed)?;
//! if !diff.is_empty() {
//!     println!("{}", diff);
//! }
//! # Ok::<(), opcdiag_core::OpcError>(())
//! ```

pub mod diff;
pub mod error;
pub mod manifest;
pub mod package;
pub mod phys_pkg;
pub mod presenter;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_utils;

pub use diff::{unified_diff, DiffPresenter, PackageDiff, DEFAULT_CONTEXT_LINES};
pub use error::{OpcError, Result};
pub use manifest::{hash_blob, Manifest};
pub use package::{ItemKind, Package, PackageItem, CONTENT_TYPES_URI};
pub use phys_pkg::{BlobCollection, DirPhysPkg, PhysPkg, PhysPkgSource, ZipPhysPkg};
pub use presenter::{canonical_text, ItemPresenter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
