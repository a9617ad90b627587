//! HTTP Server for the Sendtrack API.
//!
//! # API Endpoints
//!
//! | Method | Path                    | Description                          |
//! |--------|-------------------------|--------------------------------------|
//! | GET    | `/health`               | Health check                         |
//! | GET    | `/api/recipients`       | Companies available for selection    |
//! | GET    | `/api/job`              | Active job status                    |
//! | POST   | `/api/bulk-email`       | Start a bulk send job                |
//! | GET    | `/api/progress-stream`  | SSE stream of progress events        |
//! | POST   | `/api/cancel`           | Request cancellation of the job      |

use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt as _;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::types::{error_response, BulkEmailRequest, CancelRequest, CancelResponse, JobStartResponse};
use crate::config::ServerConfig;
use crate::directory::RecipientDirectory;
use crate::error::{JobError, ServerResult};
use crate::job::{JobManager, JobStatus};
use crate::models::Recipient;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RecipientDirectory>,
    pub jobs: Arc<JobManager>,
}

impl AppState {
    pub fn new(directory: RecipientDirectory, jobs: JobManager) -> Self {
        Self {
            directory: Arc::new(directory),
            jobs: Arc::new(jobs),
        }
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let status = match &self {
            JobError::NoRecipients | JobError::Directory(_) => StatusCode::BAD_REQUEST,
            JobError::AlreadyRunning(_) => StatusCode::CONFLICT,
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the router with permissive CORS for the wasm dev server.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/recipients", get(list_recipients))
        .route("/api/job", get(job_status))
        .route("/api/bulk-email", post(start_bulk_email))
        .route("/api/progress-stream", get(progress_stream))
        .route("/api/cancel", post(cancel_job))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> ServerResult<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Load recipients, build the job manager and start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    config.validate()?;

    let directory = RecipientDirectory::load(&config.recipients_path)?;
    tracing::info!(
        path = %config.recipients_path.display(),
        recipients = directory.len(),
        encoding = %directory.encoding,
        "recipient directory loaded"
    );

    let mailer = config.mailer.build();
    tracing::info!(mailer = mailer.name(), delay_ms = config.send_delay.as_millis() as u64, "mailer ready");

    let jobs = JobManager::new(mailer, config.sender.clone()).with_send_delay(config.send_delay);
    let state = AppState::new(directory, jobs);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("🚀 Sendtrack server running on http://localhost:{}", config.port);
    tracing::info!("   POST /api/bulk-email       - Start bulk send");
    tracing::info!("   GET  /api/progress-stream  - SSE progress stream");
    tracing::info!("   POST /api/cancel           - Cancel bulk send");

    serve(listener, state).await
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sendtrack",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "start": "POST /api/bulk-email",
            "progress": "GET /api/progress-stream (SSE)",
            "cancel": "POST /api/cancel"
        }
    }))
}

async fn list_recipients(State(state): State<AppState>) -> Json<Vec<Recipient>> {
    Json(state.directory.all().to_vec())
}

async fn job_status(State(state): State<AppState>) -> Json<JobStatus> {
    Json(state.jobs.status())
}

async fn start_bulk_email(
    State(state): State<AppState>,
    Json(request): Json<BulkEmailRequest>,
) -> Result<Json<JobStartResponse>, JobError> {
    if request.selected.is_empty() {
        return Err(JobError::NoRecipients);
    }
    let recipients = state.directory.select(&request.selected)?;
    let ticket = state.jobs.start(recipients)?;
    Ok(Json(ticket.into()))
}

/// SSE endpoint relaying job progress events
async fn progress_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.jobs.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let json = serde_json::to_string(&event).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "progress subscriber lagged, events dropped");
            None
        }
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn cancel_job(State(state): State<AppState>, Json(request): Json<CancelRequest>) -> Json<CancelResponse> {
    let cancelled = request.cancel && state.jobs.cancel();
    Json(CancelResponse { cancelled })
}
