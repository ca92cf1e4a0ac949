use super::types::{ErrorResponse, QueryRequest, QueryResponse};
use super::AppState;
use crate::agent::MediaHints;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Any failure inside the agent. Logged, then reported as a 500.
pub(crate) struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("request failed: {:#}", self.0);
        let body = ErrorResponse {
            detail: format!("{:#}", self.0),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub(crate) async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let mut agent = state.agent.lock().await;
    let response = agent.process_query(&req.prompt).await?;
    let icon_url = agent.icon_for_last_entity();

    Ok(Json(QueryResponse { response, icon_url }))
}

pub(crate) async fn media(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<MediaHints> {
    let mut agent = state.agent.lock().await;
    Json(agent.media_hints(&query))
}
