//! Session lifecycle: login, logout, restore at startup and teardown on 401.

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use chrono::Utc;
use hms_core::models::User;
use hms_core::routes::{self, Route};
use hms_core::validation::require_fields;
use hms_core::{DeskConfig, Notice, Session, SessionStore};
use tracing::{error, info, warn};

/// Outcome of restoring the stored session at startup.
#[derive(Debug)]
pub enum Restore {
    /// No session file, or it was unreadable.
    Missing,
    /// The backend accepted the stored token.
    Verified,
    /// The token could not be checked; the session is kept.
    Unverified(ApiError),
    /// The backend rejected the token and the session was removed.
    Expired,
}

/// The API client together with the signed-in session.
///
/// Every screen request goes through [`Desk::client`]; results pass back through
/// [`Desk::guard`] so an expired token signs the desk out wherever it is detected.
#[derive(Debug)]
pub struct Desk {
    client: ApiClient,
    store: SessionStore,
    session: Option<Session>,
}

impl Desk {
    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn new(config: &DeskConfig) -> ApiResult<Self> {
        Ok(Self {
            client: ApiClient::new(config)?,
            store: SessionStore::new(config.session_file()),
            session: None,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Where navigation to `requested` lands given the current session.
    pub fn route(&self, requested: Route) -> Route {
        routes::guard(requested, self.is_signed_in())
    }

    /// Signs in and persists the session.
    ///
    /// # Errors
    ///
    /// `HmsError::MissingFields` for blank credentials; otherwise the backend's rejection. On
    /// failure no token is set and nothing is written.
    pub async fn login(&mut self, username: &str, password: &str) -> ApiResult<Notice> {
        require_fields(&[("username", username), ("password", password)])?;

        let response = self.client.login(username.trim(), password).await?;
        let session = Session::from_login(response, Utc::now());
        self.store.save(&session)?;
        self.client.set_token(session.token.clone());
        info!(username = %session.user.username, "signed in");
        self.session = Some(session);
        Ok(Notice::success("Login successful!"))
    }

    /// Signs out locally. The backend keeps no server-side session to end.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be removed.
    pub fn logout(&mut self) -> ApiResult<Notice> {
        self.session = None;
        self.client.clear_token();
        self.store.clear()?;
        info!("signed out");
        Ok(Notice::success("Logged out successfully"))
    }

    /// Loads the stored session and checks its token against `/auth/me`.
    ///
    /// Only a 401 discards the session; an unreachable backend leaves it in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file exists but cannot be read.
    pub async fn restore(&mut self) -> ApiResult<Restore> {
        let Some(session) = self.store.load()? else {
            return Ok(Restore::Missing);
        };
        self.client.set_token(session.token.clone());
        self.session = Some(session);

        match self.client.me().await {
            Ok(user) => {
                if let Some(session) = &mut self.session {
                    session.user = user;
                }
                info!("stored session verified");
                Ok(Restore::Verified)
            }
            Err(ApiError::Unauthorized) => {
                self.teardown();
                Ok(Restore::Expired)
            }
            Err(e) => {
                warn!(error = %e, "could not verify stored session");
                Ok(Restore::Unverified(e))
            }
        }
    }

    /// Passes `result` through, signing out first when it is `ApiError::Unauthorized`.
    ///
    /// # Errors
    ///
    /// Returns the error carried by `result`.
    pub fn guard<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(ApiError::Unauthorized) = &result {
            self.teardown();
        }
        result
    }

    fn teardown(&mut self) {
        warn!("session expired, signing out");
        self.session = None;
        self.client.clear_token();
        if let Err(e) = self.store.clear() {
            error!(error = %e, "failed to remove session file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_core::HmsError;
    use crate::test_support::{config_for, spawn_backend};
    use axum::{
        extract::Form,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn backend() -> Router {
        Router::new()
            .route(
                "/auth/login",
                post(|Form(form): Form<HashMap<String, String>>| async move {
                    if form.get("password").map(String::as_str) == Some("secret") {
                        Ok(Json(json!({
                            "access_token": "tok",
                            "user": {"id": 1, "username": "meera", "full_name": "Meera Nair", "role": "admin"}
                        })))
                    } else {
                        Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Incorrect username or password"}))))
                    }
                }),
            )
            .route(
                "/auth/me",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer tok") => Ok(Json(json!({"id": 1, "username": "meera", "full_name": "Meera K Nair"}))),
                        _ => Err(StatusCode::UNAUTHORIZED),
                    }
                }),
            )
            .route(
                "/dashboard/stats",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer tok") => Ok(Json(json!({"total_patients_today": 3}))),
                        _ => Err(StatusCode::UNAUTHORIZED),
                    }
                }),
            )
    }

    async fn desk(dir: &TempDir) -> Desk {
        let base = spawn_backend(backend()).await;
        Desk::new(&config_for(&base, &dir.path().join("session.json"))).unwrap()
    }

    #[tokio::test]
    async fn login_persists_session() {
        let dir = TempDir::new().unwrap();
        let mut desk = desk(&dir).await;
        assert_eq!(desk.route(Route::Reports), Route::Login);

        let notice = desk.login("meera", "secret").await.unwrap();
        assert_eq!(notice.message(), "Login successful!");
        assert!(desk.client().has_token());
        assert_eq!(desk.route(Route::Login), Route::Dashboard);
        assert!(dir.path().join("session.json").exists());

        let stats = desk.client().dashboard_stats().await;
        assert_eq!(desk.guard(stats).unwrap().total_patients_today, 3);
    }

    #[tokio::test]
    async fn failed_login_leaves_desk_signed_out() {
        let dir = TempDir::new().unwrap();
        let mut desk = desk(&dir).await;

        let err = desk.login("meera", "nope").await.unwrap_err();
        assert_eq!(err.user_message(), "Incorrect username or password");
        assert!(!desk.client().has_token());
        assert!(!desk.is_signed_in());
        assert_eq!(desk.route(Route::Dashboard), Route::Login);
        assert!(!dir.path().join("session.json").exists());

        assert!(matches!(
            desk.login(" ", "").await,
            Err(ApiError::Core(HmsError::MissingFields(f))) if f == vec!["username", "password"]
        ));
        assert!(matches!(
            desk.login("meera", "  ").await,
            Err(ApiError::Core(HmsError::MissingFields(f))) if f == vec!["password"]
        ));
        assert!(!desk.is_signed_in());
    }

    #[tokio::test]
    async fn restore_verifies_stored_token() {
        let dir = TempDir::new().unwrap();
        let mut first = desk(&dir).await;
        first.login("meera", "secret").await.unwrap();

        let mut second = desk(&dir).await;
        assert!(matches!(second.restore().await.unwrap(), Restore::Verified));
        assert_eq!(second.user().unwrap().full_name, "Meera K Nair");
    }

    #[tokio::test]
    async fn expired_token_tears_session_down() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(&path);
        store
            .save(&Session {
                token: "old".into(),
                user: User::default(),
                login_time: Utc::now(),
            })
            .unwrap();

        let mut desk = desk(&dir).await;
        assert!(matches!(desk.restore().await.unwrap(), Restore::Expired));
        assert!(!desk.is_signed_in());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unauthorized_response_signs_out() {
        let dir = TempDir::new().unwrap();
        let mut desk = desk(&dir).await;
        desk.login("meera", "secret").await.unwrap();
        desk.client.set_token("revoked");

        let stats = desk.client().dashboard_stats().await;
        assert!(desk.guard(stats).unwrap_err().is_unauthorized());
        assert!(!desk.is_signed_in());
        assert!(!desk.client().has_token());
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn unreachable_backend_keeps_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        SessionStore::new(&path)
            .save(&Session {
                token: "tok".into(),
                user: User::default(),
                login_time: Utc::now(),
            })
            .unwrap();

        let mut desk = Desk::new(&config_for("http://127.0.0.1:9", &path)).unwrap();
        assert!(matches!(desk.restore().await.unwrap(), Restore::Unverified(_)));
        assert!(desk.is_signed_in());
        assert!(desk.logout().unwrap().message().contains("Logged out"));
        assert!(!path.exists());
    }
}
