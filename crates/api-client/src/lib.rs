//! # API Client
//!
//! HTTP access to the hospital billing backend.
//!
//! Handles:
//! - One configured `reqwest` client with the bearer token attached after login
//! - Typed calls for every backend endpoint the desk uses
//! - The session lifecycle: login, logout, startup restore and teardown on 401
//!
//! Form validation and response folding live in `hms-core` screens; this crate only moves
//! payloads over the wire.

#![warn(rust_2018_idioms)]

pub mod client;
pub mod desk;
pub mod error;

pub use client::ApiClient;
pub use desk::{Desk, Restore};
pub use error::{ApiError, ApiResult};
