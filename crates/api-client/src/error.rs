use hms_core::HmsError;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("backend returned {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },
    #[error("session expired")]
    Unauthorized,
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Core(#[from] HmsError),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Text for the error notice shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".into()
            }
            ApiError::Network(_) => {
                "Cannot reach the server. Please check that the backend is running.".into()
            }
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Status { status, .. } => format!("Request failed ({status})"),
            ApiError::Unauthorized => "Session expired. Please login again.".into(),
            ApiError::Decode(_) => "Unexpected response from the server".into(),
            ApiError::NotLoggedIn => "Please login first".into(),
            ApiError::Core(e) => e.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Pulls the human-readable reason out of an error body.
///
/// Looks at `detail`, then `message`, then `error`. A validation `detail` list is joined
/// from its `msg` entries. Falls back to the raw body text.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return Some(body.to_string());
    };
    for key in ["detail", "message", "error"] {
        match json.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            _ => {}
        }
    }
    Some(json.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_precedence() {
        assert_eq!(
            error_detail(r#"{"message":"m","detail":"d"}"#).as_deref(),
            Some("d")
        );
        assert_eq!(error_detail(r#"{"error":"bad"}"#).as_deref(), Some("bad"));
        assert_eq!(
            error_detail(r#"{"detail":[{"msg":"field required"},{"msg":"too short"}]}"#).as_deref(),
            Some("field required; too short")
        );
        assert_eq!(error_detail("Internal Server Error").as_deref(), Some("Internal Server Error"));
        assert_eq!(error_detail("  "), None);
    }

    #[test]
    fn user_messages() {
        let e = ApiError::Status {
            status: 409,
            detail: Some("Patient with similar details already exists".into()),
        };
        assert_eq!(e.user_message(), "Patient with similar details already exists");
        assert_eq!(e.status(), Some(409));
        let e = ApiError::Status {
            status: 500,
            detail: None,
        };
        assert_eq!(e.user_message(), "Request failed (500)");
        assert_eq!(e.to_string(), "backend returned 500");
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert_eq!(
            ApiError::from(HmsError::NoPatientSelected).user_message(),
            "no patient selected"
        );
    }
}
