//! Subcommand implementations. Each one drives a single screen against the backend.

pub mod auth;
pub mod billing;
pub mod doctors;
pub mod patients;
pub mod reports;
pub mod settings;

use api_client::{ApiError, ApiResult, Desk};
use chrono::{Local, NaiveDate, NaiveDateTime};
use hms_core::print::PrintDocument;
use hms_core::{DeskConfig, HmsError, Route};
use std::path::PathBuf;

/// Everything a subcommand needs: configuration, the session-aware client and prompt mode.
pub struct Ctx {
    pub config: DeskConfig,
    pub desk: Desk,
    pub assume_yes: bool,
}

impl Ctx {
    pub fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Fails unless navigation to `route` is allowed with the current session.
    pub fn open(&self, route: Route) -> ApiResult<()> {
        if self.desk.route(route) == route {
            Ok(())
        } else {
            Err(ApiError::NotLoggedIn)
        }
    }

    /// Writes a printable document to the output directory.
    pub fn print(&self, doc: &PrintDocument, kind: &str, identifier: &str) -> ApiResult<PathBuf> {
        let path = doc.write(
            self.config.hospital(),
            self.config.output_dir(),
            kind,
            identifier,
        )?;
        println!("Printed to {}", path.display());
        Ok(path)
    }
}

/// Splits a `a:b:c` argument into trimmed fields.
pub(crate) fn fields(raw: &str, min: usize, max: usize, shape: &str) -> Result<Vec<String>, String> {
    let parts: Vec<String> = raw.split(':').map(|p| p.trim().to_string()).collect();
    if parts.len() < min || parts.len() > max || parts[0].is_empty() {
        return Err(format!("expected {shape}, got {raw:?}"));
    }
    Ok(parts)
}

pub(crate) fn number(raw: &str, field: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("{field} must be a number, got {raw:?}"))
}

pub(crate) fn invalid(message: impl Into<String>) -> ApiError {
    HmsError::InvalidInput(message.into()).into()
}
