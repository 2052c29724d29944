//! # HMS Core
//!
//! Core logic for the hospital billing and registration desk.
//!
//! This crate contains everything that does not talk to the network:
//! - Wire models for the billing backend, tolerant of missing and `null` fields
//! - Bill line-item arithmetic, candidate numbering and previous-bill navigation
//! - Screen state machines that validate forms and fold backend responses in
//! - Session persistence, routing, printable documents and report export
//!
//! **No HTTP concerns**: requests, authentication headers and the session lifecycle belong in
//! `api-client`. Front ends live in `cli` and the root launcher.

pub mod billing;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod models;
pub mod notice;
pub mod numbering;
pub mod print;
pub mod routes;
pub mod screens;
pub mod session;
pub mod validation;

pub use config::{DeskConfig, HospitalInfo};
pub use error::{HmsError, HmsResult};
pub use notice::{Confirm, Notice, NoticeLevel};
pub use routes::Route;
pub use session::{Session, SessionStore};
