//! HTTP server for log uploads and report views
//!
//! Endpoints:
//! - POST /upload - multipart upload (`file`, optional `name`)
//! - GET /view/{name} - HTML report for a project
//! - GET /view/result/{name} - raw uploaded log
//! - GET /api/report/{name} - interpreted report as JSON
//! - GET /projects - all registered projects
//! - GET /health - liveness and counts

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::db::{Database, ProjectRecord};
use crate::error::{InterpretError, StorageError};
use crate::interpreter::{self, ParsedReport};
use crate::report;
use crate::storage::{self, ArtifactStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// AppState
// ============================================================================

/// Handles shared by every request. Constructed once in `main` and injected.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    store: Arc<ArtifactStore>,
    start_time: Instant,
}

impl AppState {
    pub fn new(db: Arc<Database>, store: Arc<ArtifactStore>) -> Self {
        AppState { db, store, start_time: Instant::now() }
    }
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug)]
pub struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({"error": self.1}))).into_response()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        tracing::error!("Database error: {}", e);
        AppError(StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", e))
    }
}

impl From<InterpretError> for AppError {
    fn from(e: InterpretError) -> Self {
        tracing::error!("Error parsing artifact: {}", e);
        AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidFileName(_) => bad_request(e.to_string()),
            StorageError::Io { .. } => {
                tracing::error!("Storage error: {}", e);
                AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

fn not_found(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::NOT_FOUND, msg.into())
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

fn internal(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::INTERNAL_SERVER_ERROR, msg.into())
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    projects: usize,
    uptime_secs: u64,
}

// ============================================================================
// Helpers
// ============================================================================

/// Run blocking file/database work off the async workers
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| internal(format!("Worker task failed: {}", e)))?
}

fn find_project(db: &Database, name: &str) -> Result<ProjectRecord, AppError> {
    db.find_project(name)?
        .ok_or_else(|| not_found(format!("Project '{}' not found", name)))
}

async fn load_report(state: &AppState, name: String) -> Result<ParsedReport, AppError> {
    let db = state.db.clone();
    blocking(move || {
        let project = find_project(&db, &name)?;
        Ok(interpreter::interpret_file(&project.path)?)
    })
    .await
}

// ============================================================================
// Handlers
// ============================================================================

// POST /upload
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<String, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError(e.status(), e.body_text()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError(e.status(), e.body_text()))?;
                upload = Some((file_name, data.to_vec()));
            }
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError(e.status(), e.body_text()))?;
                name = Some(text);
            }
            _ => {}
        }
    }

    let (raw_file_name, data) = upload.ok_or_else(|| bad_request("Missing 'file' field"))?;
    let file_name = storage::sanitize_file_name(&raw_file_name)
        .ok_or_else(|| bad_request(format!("Invalid file name '{}'", raw_file_name)))?
        .to_string();
    let name = name.filter(|n| !n.is_empty()).unwrap_or_else(|| file_name.clone());

    let db = state.db.clone();
    let store = state.store.clone();
    let stored_name = file_name.clone();
    let record = blocking(move || {
        let path = store.save(&stored_name, &data)?;
        Ok(db.insert_project(&name, &path.to_string_lossy())?)
    })
    .await?;

    tracing::info!(project = %record.name, path = %record.path, id = record.id, "Upload stored");

    Ok(format!("File uploaded successfully: {}", file_name))
}

// GET /view/{name}
async fn view_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Html<String>, AppError> {
    let parsed = load_report(&state, name).await?;
    Ok(Html(report::render_report(&parsed)))
}

// GET /view/result/{name}
async fn view_result_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();
    let store = state.store.clone();
    let bytes = blocking(move || {
        let project = find_project(&db, &name)?;
        Ok(store.read(&project.path)?)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], bytes))
}

// GET /api/report/{name}
async fn report_json_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ParsedReport>, AppError> {
    Ok(Json(load_report(&state, name).await?))
}

// GET /projects
async fn list_projects_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectRecord>>, AppError> {
    let db = state.db.clone();
    let projects = blocking(move || Ok(db.list_projects()?)).await?;
    Ok(Json(projects))
}

// GET /health
async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let db = state.db.clone();
    let projects = blocking(move || Ok(db.count_projects()?)).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        projects,
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/view/{name}", get(view_handler))
        .route("/view/result/{name}", get(view_result_handler))
        .route("/api/report/{name}", get(report_json_handler))
        .route("/projects", get(list_projects_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::multipart::{Form, Part};

    const PASSING_LOG: &str = "ok  \tgo-smoke\t0.021s\n\
        ✅ lint\n✅ vet\n✅ coverage\n✅ sast\n✅ deps\n✅ license\n\
        ✓ smoke checks passed\n\
        http://staging.internal/health\n";

    async fn spawn_server(max_upload_bytes: usize) -> (String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::in_memory().unwrap());
        let store = Arc::new(ArtifactStore::new(dir.path().join("uploads")).unwrap());
        let app = router(AppState::new(db, store), max_upload_bytes);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), dir)
    }

    async fn upload(base: &str, name: Option<&str>, file_name: &str, body: &str) -> reqwest::Response {
        let mut form = Form::new()
            .part("file", Part::bytes(body.as_bytes().to_vec()).file_name(file_name.to_string()));
        if let Some(n) = name {
            form = form.text("name", n.to_string());
        }
        reqwest::Client::new()
            .post(format!("{}/upload", base))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_view() {
        let (base, dir) = spawn_server(1 << 20).await;

        let resp = upload(&base, Some("demo"), "run.log", PASSING_LOG).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.text().await.unwrap(), "File uploaded successfully: run.log");
        assert!(dir.path().join("uploads").join("run.log").exists());

        let resp = reqwest::get(format!("{}/view/demo", base)).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let html = resp.text().await.unwrap();
        assert!(html.contains(">jdnielss-go-smoke</td>"));
        assert!(html.contains(">Ok</td>"));
        assert!(html.contains(">OK</td>"));
        assert!(html.contains(r#"<a href="http://staging.internal/health""#));
    }

    #[tokio::test]
    async fn test_report_json() {
        let (base, _dir) = spawn_server(1 << 20).await;
        upload(&base, Some("demo"), "run.log", PASSING_LOG).await;

        let json: serde_json::Value = reqwest::get(format!("{}/api/report/demo", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(json["quality_gate"], "PASS");
        assert_eq!(json["gate_markers"], 6);
        assert_eq!(json["unit_test_ok"], true);
        assert_eq!(json["endpoint"], "http://staging.internal/health");
    }

    #[tokio::test]
    async fn test_name_defaults_to_file_name() {
        let (base, _dir) = spawn_server(1 << 20).await;
        let resp = upload(&base, None, "nightly.log", "✅ one\n").await;
        assert_eq!(resp.status().as_u16(), 200);

        let resp = reqwest::get(format!("{}/view/result/nightly.log", base)).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.text().await.unwrap(), "✅ one\n");

        let projects: Vec<ProjectRecord> = reqwest::get(format!("{}/projects", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "nightly.log");
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let (base, _dir) = spawn_server(1 << 20).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/upload", base))
            .multipart(Form::new().text("name", "demo"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_not_multipart() {
        let (base, _dir) = spawn_server(1 << 20).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/upload", base))
            .body("plain")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let (base, _dir) = spawn_server(256).await;
        let resp = upload(&base, Some("big"), "big.log", &"✅ x\n".repeat(200)).await;
        assert_eq!(resp.status().as_u16(), 413);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let (base, _dir) = spawn_server(1 << 20).await;
        for path in ["/view/nope", "/view/result/nope", "/api/report/nope"] {
            let resp = reqwest::get(format!("{}{}", base, path)).await.unwrap();
            assert_eq!(resp.status().as_u16(), 404, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_missing_artifact_is_server_error() {
        let (base, dir) = spawn_server(1 << 20).await;
        upload(&base, Some("gone"), "gone.log", PASSING_LOG).await;
        std::fs::remove_file(dir.path().join("uploads").join("gone.log")).unwrap();

        let resp = reqwest::get(format!("{}/view/gone", base)).await.unwrap();
        assert_eq!(resp.status().as_u16(), 500);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("Artifact unavailable"));
    }

    #[tokio::test]
    async fn test_health() {
        let (base, _dir) = spawn_server(1 << 20).await;
        upload(&base, Some("a"), "a.log", "").await;

        let json: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["projects"], 1);
    }
}
