//! Database module for cafe storage.
//!
//! Storage is reached through the [`CafeRepository`] trait so that backends
//! can be swapped by configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / server binary                           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                             │
//! │  - Logging of every store operation                      │
//! │  - Seed import orchestration                             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository/) - Abstract Interface     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                 │
//! ┌───▼──────────────┐     ┌──────────▼──────────────┐
//! │ Postgres         │     │ Local Repository        │
//! │ (Diesel + r2d2)  │     │ (in-memory)             │
//! └──────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! The server creates one repository through [`RepositoryFactory`] and passes
//! it down explicitly; there is no process-wide instance.
//!
//! ```ignore
//! use cafe_directory::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let cafes = services::list_cafes(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod seed;
pub mod services;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{CafeRepository, ErrorContext, RepositoryError, RepositoryResult};
pub use seed::SeedError;
