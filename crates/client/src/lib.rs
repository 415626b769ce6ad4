//! Network collaborator for abri.
//!
//! This crate provides the `Network` trait the worker fetches through, a
//! reqwest-backed implementation, and URL canonicalization helpers.

pub mod net;

pub use net::{HttpNetwork, Network, NetworkConfig, NetworkError};
