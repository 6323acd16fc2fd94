//! Identity normalization and internal/external classification.
//!
//! The classifier lists are loaded once from line-oriented text files
//! ([`classifier_file`]) and frozen into an [`IdentityRegistry`], which is
//! then shared read-only by every scan.

pub mod classifier_file;
pub mod registry;

pub use classifier_file::ClassifierLists;
pub use registry::{derive_github_handle, IdentityRegistry, NOREPLY_HOST};
