//! HTTP server module for the cafe directory.
//!
//! An axum router over the service layer in `db::services`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing and validation                         │
//! │  - JSON / form bodies, response envelopes                 │
//! │  - CORS, compression, tracing                             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (db/services.rs)                           │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! │  - LocalRepository / PostgresRepository                   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::{ApiKey, AppState};
