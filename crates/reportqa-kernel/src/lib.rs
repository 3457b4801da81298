//! reportqa kernel
//!
//! Document model, collaborator traits and the error taxonomy shared by the
//! reportqa crates. Nothing here talks to a network or a disk except the
//! optional config loader.

// error module
pub mod error;

// rag module
pub mod rag;
pub use rag::*;

// config module
#[cfg(feature = "config")]
pub mod config;

pub use error::{ReportError, ReportResult};
