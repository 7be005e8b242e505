//! Repository trait definitions for cafe storage.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`cafe`]: The [`CafeRepository`] trait implemented by every backend
//!
//! Handlers and services only ever hold an `Arc<dyn CafeRepository>`, so the
//! backend is chosen once at startup (see [`crate::db::factory`]).

pub mod cafe;
pub mod error;

pub use cafe::CafeRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
