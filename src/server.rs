use anyhow::Result;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::Instrument;

use crate::mcq::{AnswerFeedback, Mcq};
use crate::tutor::{Tutor, TutorAnswer, TutorStats};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    tutor: Arc<Tutor>,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    mcq: Mcq,
    selected: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Liveness probe handler - always returns 200 OK if process is alive
async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn http_stats(State(app_state): State<AppState>) -> Json<TutorStats> {
    Json(app_state.tutor.stats())
}

async fn http_ask(
    State(app_state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<TutorAnswer>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("ask", %request_id);

    async move {
        match app_state.tutor.answer(&request.question).await {
            Ok(answer) => {
                tracing::info!(
                    mcqs = answer.mcqs.len(),
                    confidence = ?answer.confidence.level,
                    "Answered question"
                );
                Ok(Json(answer))
            }
            Err(e) if e.is_user_error() => {
                tracing::debug!("Rejected question: {}", e);
                Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
            }
            Err(e) => {
                tracing::error!("Ask failed: {}", e);
                Err(api_error(StatusCode::BAD_GATEWAY, e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}

async fn http_check(Json(request): Json<CheckRequest>) -> Json<AnswerFeedback> {
    Json(request.mcq.check(&request.selected))
}

pub fn router(tutor: Arc<Tutor>) -> axum::Router {
    axum::Router::new()
        .route("/healthz", axum::routing::get(healthz))
        .route("/stats", axum::routing::get(http_stats))
        .route("/ask", axum::routing::post(http_ask))
        .route("/check", axum::routing::post(http_check))
        .with_state(AppState { tutor })
}

/// Serves the HTTP API on `listener` until Ctrl-C.
pub async fn serve(listener: tokio::net::TcpListener, tutor: Arc<Tutor>) -> Result<()> {
    let local_addr: SocketAddr = listener.local_addr()?;
    tracing::info!("Tutor HTTP API listening on http://{}", local_addr);
    tracing::info!("Endpoints: GET /healthz, GET /stats, POST /ask, POST /check");

    axum::serve(listener, router(tutor))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
