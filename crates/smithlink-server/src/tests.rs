//! Router tests against a recording stub service and stub authenticator.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use smithlink_core::{
    ApiKeyConfig, IntegrationError, IntegrationService, Project, Run, Trace, DEFAULT_API_URL,
};
use tower::ServiceExt;
use tracing::instrument::WithSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use crate::auth::{AuthError, AuthUser, Authenticator};
use crate::{router, AppState};

const BODY_LIMIT: usize = 1_048_576;
const STUB_FAILURE: &str = "upstream exploded: secret-key-123";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SaveApiKeys(String, ApiKeyConfig),
    GetApiKeys(String),
    ToggleEnabled(String, bool),
    TestConnection(String, String),
    ListProjects(String),
    CreateProject(String, String, Option<String>),
    GetRuns(String, String, u32),
    GetRunDetails(String, String),
    GetRunTrace(String, String),
}

#[derive(Default)]
struct StubService {
    calls: Mutex<Vec<Call>>,
    fail: bool,
}

impl StubService {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn record(&self, call: Call) -> Result<(), IntegrationError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(IntegrationError::Internal(STUB_FAILURE.into()));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        description: None,
        start_time: None,
    }
}

fn run(id: &str) -> Run {
    Run {
        id: id.into(),
        name: "chain".into(),
        trace_id: Some("t1".into()),
        ..Default::default()
    }
}

#[async_trait]
impl IntegrationService for StubService {
    async fn save_api_keys(&self, workspace_id: &str, config: ApiKeyConfig) -> Result<(), IntegrationError> {
        self.record(Call::SaveApiKeys(workspace_id.into(), config))
    }

    async fn get_api_keys(&self, workspace_id: &str) -> Result<Option<ApiKeyConfig>, IntegrationError> {
        self.record(Call::GetApiKeys(workspace_id.into()))?;
        Ok(Some(ApiKeyConfig::new("k1", None)))
    }

    async fn toggle_enabled(&self, workspace_id: &str, enabled: bool) -> Result<(), IntegrationError> {
        self.record(Call::ToggleEnabled(workspace_id.into(), enabled))
    }

    async fn test_connection(&self, api_key: &str, api_url: &str) -> Result<bool, IntegrationError> {
        self.record(Call::TestConnection(api_key.into(), api_url.into()))?;
        Ok(api_key == "k1")
    }

    async fn list_projects(&self, workspace_id: &str) -> Result<Vec<Project>, IntegrationError> {
        self.record(Call::ListProjects(workspace_id.into()))?;
        Ok(vec![project("p1", "default")])
    }

    async fn create_project(
        &self,
        workspace_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, IntegrationError> {
        self.record(Call::CreateProject(
            workspace_id.into(),
            name.into(),
            description.map(String::from),
        ))?;
        Ok(project("p2", name))
    }

    async fn get_runs(&self, workspace_id: &str, project_id: &str, limit: u32) -> Result<Vec<Run>, IntegrationError> {
        self.record(Call::GetRuns(workspace_id.into(), project_id.into(), limit))?;
        Ok(vec![run("r1")])
    }

    async fn get_run_details(&self, workspace_id: &str, run_id: &str) -> Result<Run, IntegrationError> {
        self.record(Call::GetRunDetails(workspace_id.into(), run_id.into()))?;
        Ok(run(run_id))
    }

    async fn get_run_trace(&self, workspace_id: &str, run_id: &str) -> Result<Trace, IntegrationError> {
        self.record(Call::GetRunTrace(workspace_id.into(), run_id.into()))?;
        Ok(Trace {
            trace_id: "t1".into(),
            root_run_id: run_id.into(),
            runs: vec![run(run_id)],
        })
    }
}

/// Accepts any request carrying `Authorization: Bearer good`; grants `w1` only.
struct StubAuth;

#[async_trait]
impl Authenticator for StubAuth {
    async fn validate_user(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some("Bearer good") => Ok(AuthUser {
                user_id: "u1".into(),
            }),
            Some(_) => Err(AuthError::InvalidToken),
            None => Err(AuthError::MissingCredentials),
        }
    }

    async fn check_workspace_access(&self, user: &AuthUser, workspace_id: &str) -> Result<(), AuthError> {
        if workspace_id == "w1" {
            return Ok(());
        }
        Err(AuthError::WorkspaceDenied {
            user_id: user.user_id.clone(),
            workspace_id: workspace_id.into(),
        })
    }
}

/// In-memory sink for a scoped `tracing` subscriber.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn app(service: Arc<StubService>) -> Router {
    router(Arc::new(AppState::new(service, Arc::new(StubAuth))))
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Every route with a request body that satisfies its required fields.
fn all_routes() -> Vec<(&'static str, &'static str, Option<Value>)> {
    vec![
        ("POST", "/api-keys/w1", Some(json!({ "api_key": "k1" }))),
        ("GET", "/api-keys/w1", None),
        ("PUT", "/toggle/w1", Some(json!({ "enabled": true }))),
        ("POST", "/test-connection", Some(json!({ "api_key": "k1" }))),
        ("GET", "/projects/w1", None),
        ("POST", "/projects/w1", Some(json!({ "name": "evals" }))),
        ("GET", "/projects/w1/p1/runs", None),
        ("GET", "/runs/w1/r1", None),
        ("GET", "/traces/w1/r1", None),
    ]
}

#[tokio::test]
async fn test_save_api_keys_passes_missing_url_as_none() {
    let service = Arc::new(StubService::default());
    let (status, body) = send(
        app(service.clone()),
        "POST",
        "/api-keys/w1",
        Some("good"),
        Some(json!({ "api_key": "k1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    assert_eq!(
        service.calls(),
        vec![Call::SaveApiKeys("w1".into(), ApiKeyConfig::new("k1", None))]
    );
}

#[tokio::test]
async fn test_save_api_keys_forwards_custom_url() {
    let service = Arc::new(StubService::default());
    send(
        app(service.clone()),
        "POST",
        "/api-keys/w1",
        Some("good"),
        Some(json!({ "api_key": "k1", "api_url": "https://eu.example" })),
    )
    .await;

    assert_eq!(
        service.calls(),
        vec![Call::SaveApiKeys(
            "w1".into(),
            ApiKeyConfig::new("k1", Some("https://eu.example".into()))
        )]
    );
}

#[tokio::test]
async fn test_get_api_keys_wraps_config_and_is_repeatable() {
    let service = Arc::new(StubService::default());
    let first = send(app(service.clone()), "GET", "/api-keys/w1", Some("good"), None).await;
    let second = send(app(service.clone()), "GET", "/api-keys/w1", Some("good"), None).await;

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(first.1, json!({ "config": { "api_key": "k1" } }));
    assert_eq!(first, second);
    assert_eq!(service.calls().len(), 2);
}

#[tokio::test]
async fn test_toggle_failure_returns_fixed_message() {
    let service = Arc::new(StubService::failing());
    let (status, body) = send(
        app(service.clone()),
        "PUT",
        "/toggle/w1",
        Some("good"),
        Some(json!({ "enabled": false })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to toggle LangSmith status" }));
    assert!(!body.to_string().contains("secret-key-123"));
    assert_eq!(service.calls(), vec![Call::ToggleEnabled("w1".into(), false)]);
}

#[tokio::test]
async fn test_toggle_failure_is_logged_but_not_returned() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let service = Arc::new(StubService::failing());
    let (status, body) = send(
        app(service),
        "PUT",
        "/toggle/w1",
        Some("good"),
        Some(json!({ "enabled": true })),
    )
    .with_subscriber(subscriber)
    .await;

    let output = logs.contents();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        output.contains("[LangSmith] Error toggling status"),
        "logs: {output}"
    );
    assert!(output.contains(STUB_FAILURE), "logs: {output}");
    assert!(!body.to_string().contains(STUB_FAILURE));
}

#[tokio::test]
async fn test_test_connection_defaults_api_url() {
    let service = Arc::new(StubService::default());
    let (status, body) = send(
        app(service.clone()),
        "POST",
        "/test-connection",
        Some("good"),
        Some(json!({ "api_key": "k1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    assert_eq!(
        service.calls(),
        vec![Call::TestConnection("k1".into(), DEFAULT_API_URL.into())]
    );
}

#[tokio::test]
async fn test_test_connection_reports_false_and_custom_url() {
    let service = Arc::new(StubService::default());
    let (status, body) = send(
        app(service.clone()),
        "POST",
        "/test-connection",
        Some("good"),
        Some(json!({ "api_key": "other", "api_url": "http://localhost:1984" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": false }));
    assert_eq!(
        service.calls(),
        vec![Call::TestConnection("other".into(), "http://localhost:1984".into())]
    );
}

#[tokio::test]
async fn test_configured_default_url_applies_to_test_connection() {
    let service = Arc::new(StubService::default());
    let state = AppState::new(service.clone(), Arc::new(StubAuth))
        .with_default_api_url("https://eu.api.smith.langchain.com");
    send(
        router(Arc::new(state)),
        "POST",
        "/test-connection",
        Some("good"),
        Some(json!({ "api_key": "k1" })),
    )
    .await;

    assert_eq!(
        service.calls(),
        vec![Call::TestConnection(
            "k1".into(),
            "https://eu.api.smith.langchain.com".into()
        )]
    );
}

#[tokio::test]
async fn test_get_runs_parses_limit_as_integer() {
    let service = Arc::new(StubService::default());
    let (status, body) = send(
        app(service.clone()),
        "GET",
        "/projects/w1/p1/runs?limit=5",
        Some("good"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["runs"][0]["id"], "r1");

    send(app(service.clone()), "GET", "/projects/w1/p1/runs", Some("good"), None).await;
    send(app(service.clone()), "GET", "/projects/w1/p1/runs?limit=7abc", Some("good"), None).await;

    assert_eq!(
        service.calls(),
        vec![
            Call::GetRuns("w1".into(), "p1".into(), 5),
            Call::GetRuns("w1".into(), "p1".into(), 10),
            Call::GetRuns("w1".into(), "p1".into(), 7),
        ]
    );
}

#[tokio::test]
async fn test_get_runs_uses_first_repeated_limit() {
    let service = Arc::new(StubService::default());
    let (status, _) = send(
        app(service.clone()),
        "GET",
        "/projects/w1/p1/runs?limit=5&limit=6",
        Some("good"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        service.calls(),
        vec![Call::GetRuns("w1".into(), "p1".into(), 5)]
    );
}

#[tokio::test]
async fn test_get_runs_rejects_garbled_limit_as_json() {
    let service = Arc::new(StubService::default());
    let (status, body) = send(
        app(service.clone()),
        "GET",
        "/projects/w1/p1/runs?limit=%FF",
        Some("good"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid limit parameter" }));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_get_runs_rejects_non_numeric_limit() {
    let service = Arc::new(StubService::default());
    let (status, body) = send(
        app(service.clone()),
        "GET",
        "/projects/w1/p1/runs?limit=abc",
        Some("good"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid limit parameter" }));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_create_project_returns_created() {
    let service = Arc::new(StubService::default());
    let (status, body) = send(
        app(service.clone()),
        "POST",
        "/projects/w1",
        Some("good"),
        Some(json!({ "name": "evals", "description": "nightly" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project"]["id"], "p2");
    assert_eq!(body["project"]["name"], "evals");
    assert_eq!(
        service.calls(),
        vec![Call::CreateProject(
            "w1".into(),
            "evals".into(),
            Some("nightly".into())
        )]
    );
}

#[tokio::test]
async fn test_read_routes_wrap_results() {
    let service = Arc::new(StubService::default());

    let (status, body) = send(app(service.clone()), "GET", "/projects/w1", Some("good"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projects"][0]["id"], "p1");

    let (status, body) = send(app(service.clone()), "GET", "/runs/w1/r9", Some("good"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["run"]["id"], "r9");

    let (status, body) = send(app(service.clone()), "GET", "/traces/w1/r9", Some("good"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trace"]["trace_id"], "t1");
    assert_eq!(body["trace"]["root_run_id"], "r9");

    assert_eq!(
        service.calls(),
        vec![
            Call::ListProjects("w1".into()),
            Call::GetRunDetails("w1".into(), "r9".into()),
            Call::GetRunTrace("w1".into(), "r9".into()),
        ]
    );
}

#[tokio::test]
async fn test_every_failure_maps_to_its_fixed_message() {
    let expected = [
        "Failed to save LangSmith API keys",
        "Failed to get LangSmith API keys",
        "Failed to toggle LangSmith status",
        "Failed to test LangSmith connection",
        "Failed to list LangSmith projects",
        "Failed to create LangSmith project",
        "Failed to get LangSmith runs",
        "Failed to get LangSmith run details",
        "Failed to get LangSmith run trace",
    ];

    for ((method, uri, body), message) in all_routes().into_iter().zip(expected) {
        let service = Arc::new(StubService::failing());
        let (status, json) = send(app(service.clone()), method, uri, Some("good"), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(json, json!({ "error": message }), "{method} {uri}");
        assert_eq!(service.calls().len(), 1, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_unauthenticated_requests_never_reach_the_service() {
    for token in [None, Some("bad")] {
        for (method, uri, body) in all_routes() {
            let service = Arc::new(StubService::default());
            let (status, json) = send(app(service.clone()), method, uri, token, body).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(json, json!({ "error": "Unauthorized" }));
            assert!(service.calls().is_empty(), "{method} {uri}");
        }
    }
}

#[tokio::test]
async fn test_workspace_denial_never_reaches_the_service() {
    let routes = [
        ("POST", "/api-keys/w2", Some(json!({ "api_key": "k1" }))),
        ("GET", "/api-keys/w2", None),
        ("PUT", "/toggle/w2", Some(json!({ "enabled": true }))),
        ("GET", "/projects/w2", None),
        ("POST", "/projects/w2", Some(json!({ "name": "evals" }))),
        ("GET", "/projects/w2/p1/runs", None),
        ("GET", "/runs/w2/r1", None),
        ("GET", "/traces/w2/r1", None),
    ];

    for (method, uri, body) in routes {
        let service = Arc::new(StubService::default());
        let (status, json) = send(app(service.clone()), method, uri, Some("good"), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(json, json!({ "error": "Forbidden" }));
        assert!(service.calls().is_empty(), "{method} {uri}");
    }
}

#[tokio::test]
async fn test_workspace_denial_is_checked_before_body_validation() {
    let service = Arc::new(StubService::default());
    let (status, _) = send(
        app(service.clone()),
        "POST",
        "/api-keys/w2",
        Some("good"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_required_fields_short_circuit() {
    let cases = [
        ("POST", "/api-keys/w1", json!({ "api_url": "https://x" }), "api_key"),
        ("PUT", "/toggle/w1", json!({}), "enabled"),
        ("PUT", "/toggle/w1", json!({ "enabled": null }), "enabled"),
        ("POST", "/test-connection", json!({}), "api_key"),
        ("POST", "/projects/w1", json!({ "description": "d" }), "name"),
    ];

    for (method, uri, body, field) in cases {
        let service = Arc::new(StubService::default());
        let (status, json) = send(app(service.clone()), method, uri, Some("good"), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(
            json,
            json!({ "error": format!("Missing required fields: {}", field) })
        );
        assert!(service.calls().is_empty(), "{method} {uri}");
    }
}

#[tokio::test]
async fn test_mistyped_body_is_rejected() {
    let service = Arc::new(StubService::default());
    let (status, json) = send(
        app(service.clone()),
        "PUT",
        "/toggle/w1",
        Some("good"),
        Some(json!({ "enabled": "yes" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "error": "Invalid request body" }));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_router_nests_under_mount_path() {
    let service = Arc::new(StubService::default());
    let mounted = Router::new().nest("/langsmith", app(service.clone()));
    let (status, _) = send(mounted, "GET", "/langsmith/api-keys/w1", Some("good"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(service.calls(), vec![Call::GetApiKeys("w1".into())]);
}
