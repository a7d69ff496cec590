use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::data::loader::LoadError;
use crate::pipeline::{DashboardRequest, Pipeline};

pub struct AppState {
    pipeline: Mutex<Pipeline>,
}

impl AppState {
    fn pipeline(&self) -> MutexGuard<'_, Pipeline> {
        // A panic mid-request leaves the pipeline itself consistent.
        self.pipeline.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A load failure, mapped onto an HTTP status.
struct ApiError(LoadError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LoadError::NotFound { .. } => StatusCode::NOT_FOUND,
            LoadError::Read { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(pipeline: Pipeline) -> Router {
    let app_state = Arc::new(AppState {
        pipeline: Mutex::new(pipeline),
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/dashboard", get(get_dashboard).post(post_dashboard))
        .route("/api/reload", post(reload))
        .with_state(app_state)
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let app = router(config.source.pipeline());

    let listener = TcpListener::bind(config.addr).await?;
    log::info!(
        "Serving {} [{}] on http://{}",
        config.source.path.display(),
        config.source.sheet,
        config.addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn get_dashboard(State(state): State<Arc<AppState>>) -> Response {
    respond(state, DashboardRequest::default(), false).await
}

async fn post_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DashboardRequest>,
) -> Response {
    respond(state, request, false).await
}

async fn reload(State(state): State<Arc<AppState>>) -> Response {
    respond(state, DashboardRequest::default(), true).await
}

/// Run the pipeline off the async workers; it reads files synchronously.
async fn respond(state: Arc<AppState>, request: DashboardRequest, reload: bool) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        let mut pipeline = state.pipeline();
        if reload {
            pipeline.reload();
        }
        pipeline.handle(&request)
    })
    .await;

    match result {
        Ok(Ok(view)) => Json(view).into_response(),
        Ok(Err(e)) => ApiError(e).into_response(),
        Err(e) => {
            log::error!("Dashboard request failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn sample_pipeline(dir: &tempfile::TempDir) -> Pipeline {
        let path = dir.path().join("projects.csv");
        std::fs::write(
            &path,
            "Project Type,Status,Budget Allocated,Budget Utilized\n\
             Road,Done,100,80\n\
             Water,Active,50,50\n\
             Road,Active,200,20\n",
        )
        .unwrap();
        Pipeline::new(path, "Cleaned Data")
    }

    #[tokio::test]
    async fn get_returns_unfiltered_view() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(sample_pipeline(&dir));

        let (status, body) = call(
            app,
            Request::get("/api/dashboard").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalRows"], 3);
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
        assert_eq!(body["kpiDisplay"]["budgetUtilization"], "42.86%");
        assert_eq!(body["statusCounts"]["status"], "available");
    }

    #[tokio::test]
    async fn post_applies_filters() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(sample_pipeline(&dir));

        let request = Request::post("/api/dashboard")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"filters": {"projectType": ["Road"]}}"#))
            .unwrap();
        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 2);
        assert_eq!(body["kpiDisplay"]["budgetUtilization"], "33.33%");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Pipeline::new(dir.path().join("missing.xlsx"), "Cleaned Data"));

        let (status, body) = call(
            app,
            Request::get("/api/dashboard").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing.xlsx"));
    }

    #[tokio::test]
    async fn unreadable_file_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.csv");
        std::fs::write(&path, "Budget Allocated\nplenty\n").unwrap();
        let app = router(Pipeline::new(path, "Cleaned Data"));

        let (status, _) = call(
            app,
            Request::post("/api/reload").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(sample_pipeline(&dir));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
