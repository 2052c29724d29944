//! Typed wrapper over the billing backend's REST endpoints.

use crate::error::{error_detail, ApiError, ApiResult};
use hms_core::constants::SESSION_VERIFY_TIMEOUT_SECS;
use hms_core::models::{
    BillCreated, DashboardStats, Department, DepartmentCreate, Doctor, IpBillCreate,
    IpBillDetails, IpBillSummary, LoginResponse, OpBillCreate, OpBillDetails, OpBillSummary,
    Particular, ParticularCreate, Patient, PatientCreate, PatientKind, ReportKind,
    SettingsStats, User,
};
use hms_core::{DeskConfig, HmsError};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// One configured HTTP client bound to the backend base URL.
///
/// After login the bearer token is attached to every request; [`ApiClient::clear_token`]
/// removes it again.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Core` for an unusable base URL and `ApiError::Network` if the HTTP
    /// client cannot be built.
    pub fn new(config: &DeskConfig) -> ApiResult<Self> {
        let base = Url::parse(config.backend_url())
            .map_err(|e| HmsError::InvalidUrl(format!("{}: {e}", config.backend_url())))?;
        if base.cannot_be_a_base() {
            return Err(HmsError::InvalidUrl(config.backend_url().to_string()).into());
        }
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ApiError::Network)?;
        Ok(Self {
            http,
            base,
            token: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| HmsError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        let url = self.url(segments)?;
        debug!(%method, %url, "backend request");
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Maps a non-success response to an error.
    ///
    /// A 401 only counts as an expired session when a token was sent; a failed login is a
    /// plain status error carrying the backend's reason.
    async fn check(&self, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && self.token.is_some() {
            return Err(ApiError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = builder.send().await.map_err(ApiError::Network)?;
        let response = self.check(response).await?;
        let bytes = response.bytes().await.map_err(ApiError::Network)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_discarding(&self, builder: RequestBuilder) -> ApiResult<()> {
        let response = builder.send().await.map_err(ApiError::Network)?;
        self.check(response).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        self.send(self.request(Method::GET, segments)?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, segments: &[&str], body: &B) -> ApiResult<T> {
        self.send(self.request(Method::POST, segments)?.json(body)).await
    }

    async fn delete(&self, segments: &[&str]) -> ApiResult<()> {
        self.send_discarding(self.request(Method::DELETE, segments)?).await
    }

    pub async fn health(&self) -> ApiResult<()> {
        self.send_discarding(self.request(Method::GET, &["health"])?).await
    }

    /// Exchanges credentials for a token. The body is form-encoded.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let form = [("username", username), ("password", password)];
        self.send(self.request(Method::POST, &["auth", "login"])?.form(&form))
            .await
    }

    pub async fn me(&self) -> ApiResult<User> {
        let builder = self
            .request(Method::GET, &["auth", "me"])?
            .timeout(Duration::from_secs(SESSION_VERIFY_TIMEOUT_SECS));
        self.send(builder).await
    }

    /// Lists patients, optionally only outpatients or only inpatients.
    pub async fn patients(&self, is_ip: Option<bool>) -> ApiResult<Vec<Patient>> {
        let mut builder = self.request(Method::GET, &["patients"])?;
        if let Some(is_ip) = is_ip {
            builder = builder.query(&[("is_ip", is_ip)]);
        }
        self.send(builder).await
    }

    pub async fn create_patient(&self, patient: &PatientCreate) -> ApiResult<Patient> {
        self.post(&["patients"], patient).await
    }

    /// Free-text search across all patients.
    pub async fn search_patients(&self, query: &str) -> ApiResult<Vec<Patient>> {
        let builder = self
            .request(Method::GET, &["patients", "search"])?
            .query(&[("query", query)]);
        self.send(builder).await
    }

    /// Search restricted to outpatients or inpatients. The query is a path segment.
    pub async fn search_patients_of(&self, kind: PatientKind, query: &str) -> ApiResult<Vec<Patient>> {
        self.get(&["patients", "search", kind.as_str(), query]).await
    }

    /// Every doctor, including resigned and discontinued ones.
    pub async fn doctors(&self) -> ApiResult<Vec<Doctor>> {
        let builder = self
            .request(Method::GET, &["doctors"])?
            .query(&[("active_only", false)]);
        self.send(builder).await
    }

    pub async fn create_doctor(&self, doctor: &Doctor) -> ApiResult<Doctor> {
        self.post(&["doctors"], doctor).await
    }

    pub async fn update_doctor(&self, id: i64, doctor: &Doctor) -> ApiResult<Doctor> {
        let id = id.to_string();
        self.send(self.request(Method::PUT, &["doctors", &id])?.json(doctor))
            .await
    }

    pub async fn delete_doctor(&self, id: i64) -> ApiResult<()> {
        self.delete(&["doctors", &id.to_string()]).await
    }

    pub async fn create_op_bill(&self, bill: &OpBillCreate) -> ApiResult<BillCreated> {
        self.post(&["bills", "op"], bill).await
    }

    pub async fn create_ip_bill(&self, bill: &IpBillCreate) -> ApiResult<BillCreated> {
        self.post(&["bills", "ip"], bill).await
    }

    pub async fn op_bills(&self, patient_id: i64) -> ApiResult<Vec<OpBillSummary>> {
        self.get(&["bills", "op", &patient_id.to_string()]).await
    }

    pub async fn op_bill_details(&self, bill_id: i64) -> ApiResult<OpBillDetails> {
        self.get(&["bills", "op", "details", &bill_id.to_string()])
            .await
    }

    pub async fn ip_bills(&self, patient_id: i64) -> ApiResult<Vec<IpBillSummary>> {
        self.get(&["bills", "ip", &patient_id.to_string()]).await
    }

    pub async fn ip_bill_details(&self, bill_id: i64) -> ApiResult<IpBillDetails> {
        self.get(&["bills", "ip", "details", &bill_id.to_string()])
            .await
    }

    pub async fn departments(&self) -> ApiResult<Vec<Department>> {
        self.get(&["settings", "departments"]).await
    }

    pub async fn create_department(&self, department: &DepartmentCreate) -> ApiResult<Department> {
        self.post(&["settings", "departments"], department).await
    }

    pub async fn delete_department(&self, id: i64) -> ApiResult<()> {
        self.delete(&["settings", "departments", &id.to_string()])
            .await
    }

    pub async fn particulars(&self) -> ApiResult<Vec<Particular>> {
        self.get(&["settings", "particulars"]).await
    }

    pub async fn create_particular(&self, particular: &ParticularCreate) -> ApiResult<Particular> {
        self.post(&["settings", "particulars"], particular).await
    }

    pub async fn delete_particular(&self, id: i64) -> ApiResult<()> {
        self.delete(&["settings", "particulars", &id.to_string()])
            .await
    }

    pub async fn settings_stats(&self) -> ApiResult<SettingsStats> {
        self.get(&["settings", "stats"]).await
    }

    /// Departments, particulars and counters, fetched concurrently.
    pub async fn settings(&self) -> ApiResult<(Vec<Department>, Vec<Particular>, SettingsStats)> {
        tokio::try_join!(self.departments(), self.particulars(), self.settings_stats())
    }

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.get(&["dashboard", "stats"]).await
    }

    /// Raw body of a report; decoding is left to the reports screen.
    pub async fn report(&self, kind: ReportKind, query: &[(&str, String)]) -> ApiResult<Value> {
        let builder = self
            .request(Method::GET, &["reports", kind.slug()])?
            .query(query);
        self.send(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config_for, spawn_backend};
    use axum::{
        extract::{Form, Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&config_for(base, std::path::Path::new("unused.json"))).unwrap()
    }

    #[test]
    fn segments_are_percent_encoded() {
        let c = client("http://127.0.0.1:9/api");
        let url = c.url(&["patients", "search", "op", "anu/joseph 1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/api/patients/search/op/anu%2Fjoseph%201"
        );
    }

    #[tokio::test]
    async fn login_is_form_encoded() {
        let app = Router::new().route(
            "/auth/login",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                if form.get("password").map(String::as_str) == Some("secret") {
                    Ok(Json(json!({
                        "access_token": "tok",
                        "token_type": "bearer",
                        "user": {"id": 1, "username": form["username"], "full_name": "Meera Nair", "role": "admin"}
                    })))
                } else {
                    Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Incorrect username or password"}))))
                }
            }),
        );
        let base = spawn_backend(app).await;
        let c = client(&base);

        let ok = c.login("meera", "secret").await.unwrap();
        assert_eq!(ok.access_token, "tok");
        assert_eq!(ok.user.username, "meera");

        match c.login("meera", "wrong").await {
            Err(ApiError::Status { status: 401, detail }) => {
                assert_eq!(detail.as_deref(), Some("Incorrect username or password"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bearer_header_follows_token() {
        let app = Router::new().route(
            "/auth/me",
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer tok") => Ok(Json(json!({"id": 1, "username": "meera"}))),
                    _ => Err(StatusCode::UNAUTHORIZED),
                }
            }),
        );
        let base = spawn_backend(app).await;
        let mut c = client(&base);

        assert!(matches!(c.me().await, Err(ApiError::Status { status: 401, .. })));
        c.set_token("tok");
        assert_eq!(c.me().await.unwrap().username, "meera");
        c.set_token("stale");
        assert!(matches!(c.me().await, Err(ApiError::Unauthorized)));
        c.clear_token();
        assert!(!c.has_token());
    }

    #[tokio::test]
    async fn query_parameters_reach_backend() {
        let app = Router::new()
            .route(
                "/doctors",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!([{"id": 1, "name": format!("active_only={}", q["active_only"])}]))
                }),
            )
            .route(
                "/patients",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let is_ip = q.get("is_ip").cloned().unwrap_or_default();
                    Json(json!([{"id": 2, "name": format!("is_ip={is_ip}")}]))
                }),
            )
            .route(
                "/patients/search/:kind/:query",
                get(|Path((kind, query)): Path<(String, String)>| async move {
                    Json(json!([{"id": 3, "name": format!("{kind}:{query}")}]))
                }),
            );
        let base = spawn_backend(app).await;
        let c = client(&base);

        assert_eq!(c.doctors().await.unwrap()[0].name, "active_only=false");
        assert_eq!(c.patients(Some(true)).await.unwrap()[0].name, "is_ip=true");
        assert_eq!(c.patients(None).await.unwrap()[0].name, "is_ip=");
        let found = c.search_patients_of(PatientKind::Op, "anu joseph").await.unwrap();
        assert_eq!(found[0].name, "op:anu joseph");
    }

    #[tokio::test]
    async fn settings_load_together() {
        let app = Router::new()
            .route("/settings/departments", get(|| async { Json(json!([{"id": 1, "name": "Lab"}])) }))
            .route("/settings/particulars", get(|| async { Json(json!([{"id": 4, "name": "CBC", "rate": null}])) }))
            .route(
                "/settings/stats",
                get(|| async { Json(json!({"total_departments": 1, "total_particulars": 1})) }),
            );
        let base = spawn_backend(app).await;
        let (departments, particulars, stats) = client(&base).settings().await.unwrap();
        assert_eq!(departments[0].name, "Lab");
        assert_eq!(particulars[0].rate, None);
        assert_eq!(stats.total_particulars, 1);
    }

    #[tokio::test]
    async fn error_bodies_and_decoding() {
        let app = Router::new()
            .route(
                "/dashboard/stats",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "db down"}))) }),
            )
            .route("/settings/stats", get(|| async { "not json" }));
        let base = spawn_backend(app).await;
        let c = client(&base);

        let err = c.dashboard_stats().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), "db down");
        assert!(matches!(c.settings_stats().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let c = client("http://127.0.0.1:9");
        assert!(matches!(c.health().await, Err(ApiError::Network(_))));
    }
}
