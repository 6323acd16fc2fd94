//! dcoscan core library.
//!
//! This crate provides the building blocks of a Developer Certificate of
//! Origin audit: configuration, identity classification, trailer parsing,
//! commit assembly, the sign-off policy, repository history reading, and
//! report output.

pub mod assembler;
pub mod config;
pub mod errors;
pub mod git;
pub mod identity;
pub mod merger;
pub mod models;
pub mod report;
pub mod scanner;
pub mod trailers;
pub mod validator;

// Re-exports for convenience.
pub use assembler::CommitAssembler;
pub use config::ScanConfig;
pub use identity::IdentityRegistry;
pub use models::{Commit, Person, Role};
pub use scanner::Scanner;
pub use trailers::TrailerMode;
