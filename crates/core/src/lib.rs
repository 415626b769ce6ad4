//! Core types and shared functionality for abri.
//!
//! This crate provides:
//! - Request/response model for intercepted traffic
//! - Request classifier and cache generation naming
//! - Generation store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod classify;
pub mod config;
pub mod error;
pub mod generations;
pub mod model;
pub mod store;

pub use error::Error;
pub use generations::CacheNames;
pub use model::{Request, Response};
pub use store::{CacheStorage, Generation, SqliteStorage};
