use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::modules::live_orders::use_cases::refresh_live_orders::handler::RefreshError;
use crate::shell::state::AppState;

#[derive(Serialize)]
pub struct RefetchErrorResponse {
    pub error: String,
}

pub async fn handle(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.refetch().await {
        Ok(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        Err(error) => {
            let status = match error {
                RefreshError::Fetch(_) => StatusCode::BAD_GATEWAY,
                RefreshError::WorkerStopped => StatusCode::SERVICE_UNAVAILABLE,
                RefreshError::Projection(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(RefetchErrorResponse {
                    error: error.to_string(),
                }),
            )
                .into_response()
        }
    }
}
