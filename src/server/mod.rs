//! HTTP API and embedded front end for the coverage dashboard.
//!
//! Routes:
//! - `GET /`: dashboard page
//! - `GET /health`: liveness probe
//! - `POST /sections`: section forest for folder selection
//! - `POST /coverage`: coverage numbers for a folder selection
//! - `POST /coverage/chart`: the same, rendered as an SVG pie chart

mod assets;
pub mod cors;
pub mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::chart::{render_pie_svg, ChartOptions};
use crate::config::{DashboardConfig, ServerConfig};
use crate::coverage::CoverageService;
use crate::error::{CoverageError, Result};
use crate::observability::redact_secrets;
use crate::types::{CoverageResult, SectionNode};

pub use rate_limit::RateLimiter;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared, read-mostly state behind every handler.
pub struct AppState {
    pub service: CoverageService,
    pub limiter: RateLimiter,
    pub cors_origin: HeaderValue,
}

impl AppState {
    pub fn new(service: CoverageService, config: &ServerConfig) -> Result<Self> {
        let cors_origin = HeaderValue::from_str(&config.cors_origin).map_err(|_| {
            CoverageError::config(format!(
                "server.cors_origin is not a valid header value: {:?}",
                config.cors_origin
            ))
        })?;
        Ok(Self {
            service,
            limiter: RateLimiter::from_config(&config.rate_limit),
            cors_origin,
        })
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct SectionsRequest {
    /// Accepted for compatibility with the front end; not used.
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoverageRequest {
    #[serde(rename = "folderIds")]
    folder_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartRequest {
    #[serde(rename = "folderIds")]
    folder_ids: Vec<i64>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An error rendered as `{ "error": ..., "details": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<CoverageError> for ApiError {
    fn from(err: CoverageError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let message = match &err {
            CoverageError::Validation(_) => "Invalid request",
            CoverageError::Upstream { .. } | CoverageError::Shape { .. } | CoverageError::Http(_) => {
                "Failed to fetch data from the test management service"
            }
            CoverageError::Cycle { .. } => "Section hierarchy is inconsistent",
            _ => "Internal server error",
        };
        if status.is_server_error() {
            tracing::error!(error = %redact_secrets(&err.to_string()), "request failed");
        }
        Self {
            status,
            body: ErrorBody {
                error: message.to_string(),
                details: Some(redact_secrets(&err.to_string())),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Parse a JSON request body. An empty body is allowed only when
/// `empty_default` is `Some`.
fn parse_body<T: DeserializeOwned>(body: &Bytes, empty_default: Option<T>) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return empty_default
            .ok_or_else(|| CoverageError::validation("request body is required"));
    }
    serde_json::from_slice(body).map_err(|e| CoverageError::validation(e.to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index_page() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_sections(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> std::result::Result<Json<Vec<SectionNode>>, ApiError> {
    let request: SectionsRequest = parse_body(&body, Some(SectionsRequest::default()))?;
    if let Some(path) = request.path.as_deref() {
        tracing::debug!(path, "sections requested");
    }
    Ok(Json(state.service.section_tree().await?))
}

async fn coverage(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> std::result::Result<Json<CoverageResult>, ApiError> {
    let request: CoverageRequest = parse_body(&body, None)?;
    Ok(Json(state.service.coverage(&request.folder_ids).await?))
}

async fn coverage_chart(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    let request: ChartRequest = parse_body(&body, None)?;
    let result = state.service.coverage(&request.folder_ids).await?;
    let options = ChartOptions::titled(request.title.unwrap_or_default())
        .with_timestamp(chrono::Utc::now());
    let svg = render_pie_svg(&result, &options);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Build the dashboard router (extracted for testability).
///
/// CORS is the outermost layer so that preflights skip the rate limiter
/// and rejections still carry CORS headers.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/sections", post(list_sections))
        .route("/coverage", post(coverage))
        .route("/coverage/chart", post(coverage_chart))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), cors::apply))
        .with_state(state)
}

/// Start the dashboard server and run until Ctrl-C.
pub async fn run_server(config: &DashboardConfig, service: CoverageService) -> Result<()> {
    let addr: SocketAddr = config.server.bind.parse().map_err(|_| {
        CoverageError::config(format!("invalid bind address: {}", config.server.bind))
    })?;
    let state = Arc::new(AppState::new(service, &config.server)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("autocov dashboard listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down dashboard server");
    })
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::ServiceSettings;
    use crate::source::TestSource;
    use crate::types::{AutomationStatus, Section, TestCase};
    use futures::future::BoxFuture;
    use futures::FutureExt;

    struct StubSource {
        fail_sections: bool,
    }

    impl TestSource for StubSource {
        fn sections_page(&self, offset: usize, _limit: usize) -> BoxFuture<'_, Result<Vec<Section>>> {
            let result = if self.fail_sections {
                Err(CoverageError::upstream("get_sections", "project 1", "HTTP 503"))
            } else if offset == 0 {
                Ok(vec![Section::new(1, "root", None), Section::new(2, "child", Some(1))])
            } else {
                Ok(vec![])
            };
            async move { result }.boxed()
        }

        fn cases_page(
            &self,
            section_id: i64,
            offset: usize,
            _limit: usize,
        ) -> BoxFuture<'_, Result<Vec<TestCase>>> {
            let cases = if offset == 0 {
                vec![TestCase::new(
                    section_id * 10,
                    format!("case in {section_id}"),
                    if section_id == 1 {
                        AutomationStatus::Yes
                    } else {
                        AutomationStatus::No
                    },
                )]
            } else {
                vec![]
            };
            async move { Ok(cases) }.boxed()
        }
    }

    /// Sections 2 and 3 name each other as parent.
    struct CyclicSource;

    impl TestSource for CyclicSource {
        fn sections_page(&self, offset: usize, _limit: usize) -> BoxFuture<'_, Result<Vec<Section>>> {
            let page = if offset == 0 {
                vec![
                    Section::new(1, "root", None),
                    Section::new(2, "left", Some(3)),
                    Section::new(3, "right", Some(2)),
                ]
            } else {
                vec![]
            };
            async move { Ok(page) }.boxed()
        }

        fn cases_page(
            &self,
            _section_id: i64,
            _offset: usize,
            _limit: usize,
        ) -> BoxFuture<'_, Result<Vec<TestCase>>> {
            let cases: Vec<TestCase> = Vec::new();
            async move { Ok(cases) }.boxed()
        }
    }

    fn test_state(fail_sections: bool) -> Arc<AppState> {
        let service = CoverageService::new(
            Arc::new(StubSource { fail_sections }),
            ServiceSettings::default(),
        );
        Arc::new(AppState::new(service, &ServerConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn index_page_returns_html() {
        let html = index_page().await;
        assert!(html.0.contains("<html"), "should be HTML");
        assert!(html.0.contains("/coverage/chart"));
    }

    #[tokio::test]
    async fn sections_accepts_empty_body() {
        let Json(tree) = list_sections(State(test_state(false)), Bytes::new())
            .await
            .unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].id, 2);
    }

    #[tokio::test]
    async fn sections_accepts_path_parameter() {
        let body = Bytes::from_static(br#"{"path": "/projects/1"}"#);
        let Json(tree) = list_sections(State(test_state(false)), body).await.unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[tokio::test]
    async fn sections_rejects_malformed_body() {
        let err = list_sections(State(test_state(false)), Bytes::from_static(b"{not json"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sections_upstream_failure_is_500_with_details() {
        let err = list_sections(State(test_state(true)), Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.body.details.as_deref().unwrap_or("").contains("HTTP 503"));
    }

    #[tokio::test]
    async fn coverage_requires_folder_id_array() {
        for body in [
            &b""[..],
            &br#"{}"#[..],
            &br#"{"folderIds": 5}"#[..],
            &br#"{"folderIds": "1,2"}"#[..],
            &br#"{"folderIds": ["a"]}"#[..],
        ] {
            let err = coverage(State(test_state(false)), Bytes::copy_from_slice(body))
                .await
                .unwrap_err();
            assert_eq!(
                err.status(),
                StatusCode::BAD_REQUEST,
                "body {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[tokio::test]
    async fn coverage_returns_result() {
        let body = Bytes::from_static(br#"{"folderIds": [1]}"#);
        let Json(result) = coverage(State(test_state(false)), body).await.unwrap();
        assert_eq!(result.total_counts.yes, 1);
        assert_eq!(result.total_counts.no, 1);
        assert_eq!(result.overall_coverage, "50.0");
    }

    #[tokio::test]
    async fn coverage_over_cyclic_sections_is_500() {
        let service = CoverageService::new(Arc::new(CyclicSource), ServiceSettings::default());
        let state = Arc::new(AppState::new(service, &ServerConfig::default()).unwrap());
        let body = Bytes::from_static(br#"{"folderIds": [1]}"#);

        let err = coverage(State(state), body).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.error, "Section hierarchy is inconsistent");
        assert!(err.body.details.as_deref().unwrap_or("").contains("cycle"));
    }

    #[tokio::test]
    async fn coverage_chart_returns_svg() {
        let body = Bytes::from_static(br#"{"folderIds": [2], "title": "Child"}"#);
        let response = coverage_chart(State(test_state(false)), body).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );
    }

    #[test]
    fn invalid_cors_origin_is_config_error() {
        let service = CoverageService::new(
            Arc::new(StubSource {
                fail_sections: false,
            }),
            ServiceSettings::default(),
        );
        let config = ServerConfig {
            cors_origin: "bad\norigin".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            AppState::new(service, &config),
            Err(CoverageError::Config(_))
        ));
    }

    #[tokio::test]
    async fn build_router_creates_valid_router() {
        let _router = build_router(test_state(false));
    }
}
