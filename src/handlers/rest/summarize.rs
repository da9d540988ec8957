use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;

use std::sync::Arc;

use crate::{
    dto::{SummarizeRequest, SummarizeResponse},
    state::AppState,
    summarizer::Summarizer,
};

#[utoipa::path(
    post,
    path = "/api/sumarize",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Summary generated", body = SummarizeResponse),
        (status = 500, description = "Model call failed")
    ),
    tag = "summaries"
)]
#[debug_handler(state = AppState)]
pub async fn summarize(
    State(summarizer): State<Arc<Summarizer>>,
    Json(payload): Json<SummarizeRequest>,
) -> Response {
    match summarizer.summarize(&payload.content).await {
        Ok(summary) => (StatusCode::OK, Json(SummarizeResponse { summary })).into_response(),
        Err(e) => {
            tracing::error!("failed to summarize note: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to summarize note").into_response()
        }
    }
}
