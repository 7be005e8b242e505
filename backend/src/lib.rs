//! # Cafe Directory
//!
//! Storage and REST API for a directory of cafes: where they are, what they
//! offer and what a coffee costs.
//!
//! ## Architecture
//!
//! - [`models`]: the `Cafe` record and its serialized form
//! - [`db`]: repository trait, in-memory and Postgres backends, seed import
//! - [`config`]: application settings from TOML and the environment
//! - [`http`]: axum router and handlers (feature `http-server`)

// RepositoryError carries an ErrorContext in every variant.
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;
