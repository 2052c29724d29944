//! Desk runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the client and the
//! screens. Nothing reads process-wide environment variables while a screen is handling input.

use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_HOSPITAL_ADDRESS, DEFAULT_HOSPITAL_NAME, DEFAULT_HOSPITAL_PHONE,
    DEFAULT_OUTPUT_DIR, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SESSION_FILE,
};
use crate::{HmsError, HmsResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BACKEND_URL: &str = "HMS_BACKEND_URL";
pub const ENV_HOSPITAL_NAME: &str = "HMS_HOSPITAL_NAME";
pub const ENV_HOSPITAL_ADDRESS: &str = "HMS_HOSPITAL_ADDRESS";
pub const ENV_HOSPITAL_PHONE: &str = "HMS_HOSPITAL_PHONE";
pub const ENV_SESSION_FILE: &str = "HMS_SESSION_FILE";
pub const ENV_OUTPUT_DIR: &str = "HMS_OUTPUT_DIR";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "HMS_REQUEST_TIMEOUT_SECS";

/// Hospital display metadata printed on bills and reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HospitalInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Default for HospitalInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_HOSPITAL_NAME.into(),
            address: DEFAULT_HOSPITAL_ADDRESS.into(),
            phone: DEFAULT_HOSPITAL_PHONE.into(),
        }
    }
}

/// Desk configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct DeskConfig {
    backend_url: String,
    hospital: HospitalInfo,
    session_file: PathBuf,
    output_dir: PathBuf,
    request_timeout: Duration,
}

impl DeskConfig {
    /// Create a new `DeskConfig`.
    ///
    /// The backend URL must be an absolute `http` or `https` URL; a trailing slash is dropped
    /// so endpoint paths can be appended verbatim.
    pub fn new(
        backend_url: &str,
        hospital: HospitalInfo,
        session_file: PathBuf,
        output_dir: PathBuf,
        request_timeout: Duration,
    ) -> HmsResult<Self> {
        let backend_url = normalise_backend_url(backend_url)?;
        if request_timeout.is_zero() {
            return Err(HmsError::InvalidInput(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            backend_url,
            hospital,
            session_file,
            output_dir,
            request_timeout,
        })
    }

    /// Resolve the configuration from a variable lookup.
    ///
    /// Binaries pass `|k| std::env::var(k).ok()` after loading `.env`; tests pass a map.
    /// Unset or blank values fall back to the defaults in [`crate::constants`].
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> HmsResult<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend_url = value(ENV_BACKEND_URL).unwrap_or_else(|| DEFAULT_BACKEND_URL.into());
        let hospital = HospitalInfo {
            name: value(ENV_HOSPITAL_NAME).unwrap_or_else(|| DEFAULT_HOSPITAL_NAME.into()),
            address: value(ENV_HOSPITAL_ADDRESS)
                .unwrap_or_else(|| DEFAULT_HOSPITAL_ADDRESS.into()),
            phone: value(ENV_HOSPITAL_PHONE).unwrap_or_else(|| DEFAULT_HOSPITAL_PHONE.into()),
        };
        let session_file = value(ENV_SESSION_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        let output_dir = value(ENV_OUTPUT_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let request_timeout = request_timeout_from_env_value(value(ENV_REQUEST_TIMEOUT_SECS))?;

        Self::new(
            &backend_url,
            hospital,
            session_file,
            output_dir,
            request_timeout,
        )
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn hospital(&self) -> &HospitalInfo {
        &self.hospital
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn normalise_backend_url(raw: &str) -> HmsResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| HmsError::InvalidUrl(raw.to_string()))?;

    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(HmsError::InvalidUrl(raw.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Parse the request timeout in seconds from an optional string value.
///
/// If `value` is `None`, returns the default timeout.
pub fn request_timeout_from_env_value(value: Option<String>) -> HmsResult<Duration> {
    let secs = match value {
        Some(v) => v.trim().parse::<u64>().map_err(|_| {
            HmsError::InvalidInput(format!("{ENV_REQUEST_TIMEOUT_SECS} must be whole seconds"))
        })?,
        None => DEFAULT_REQUEST_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn resolve_uses_defaults_when_unset() {
        let cfg = DeskConfig::resolve(lookup(&[])).unwrap();
        assert_eq!(cfg.backend_url(), DEFAULT_BACKEND_URL);
        assert_eq!(cfg.hospital(), &HospitalInfo::default());
        assert_eq!(cfg.session_file(), Path::new(DEFAULT_SESSION_FILE));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn resolve_reads_overrides_and_trims_slash() {
        let cfg = DeskConfig::resolve(lookup(&[
            (ENV_BACKEND_URL, "https://billing.example.org/api/"),
            (ENV_HOSPITAL_NAME, "St. Mary"),
            (ENV_REQUEST_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.backend_url(), "https://billing.example.org/api");
        assert_eq!(cfg.hospital().name, "St. Mary");
        assert_eq!(cfg.hospital().address, DEFAULT_HOSPITAL_ADDRESS);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = DeskConfig::resolve(lookup(&[(ENV_HOSPITAL_PHONE, "   ")])).unwrap();
        assert_eq!(cfg.hospital().phone, DEFAULT_HOSPITAL_PHONE);
    }

    #[test]
    fn rejects_non_http_backend() {
        let err = DeskConfig::resolve(lookup(&[(ENV_BACKEND_URL, "ftp://host")])).unwrap_err();
        assert!(matches!(err, HmsError::InvalidUrl(_)));
        assert!(DeskConfig::resolve(lookup(&[(ENV_BACKEND_URL, "http://")])).is_err());
    }

    #[test]
    fn rejects_bad_timeout() {
        assert!(request_timeout_from_env_value(Some("soon".into())).is_err());
        let err = DeskConfig::resolve(lookup(&[(ENV_REQUEST_TIMEOUT_SECS, "0")])).unwrap_err();
        assert!(matches!(err, HmsError::InvalidInput(_)));
    }
}
