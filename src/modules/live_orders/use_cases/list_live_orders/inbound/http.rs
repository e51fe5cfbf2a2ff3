use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::shell::state::AppState;

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.queries.snapshot().await {
        Ok(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        Err(error) => {
            tracing::error!(%error, "could not read live orders");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    match state.queries.find(&order_id).await {
        Ok(Some(order)) => Json(order).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(error) => {
            tracing::error!(%error, "could not read live order");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
