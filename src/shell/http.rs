use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::modules::live_orders::use_cases::list_live_orders::inbound::http as list_http;
use crate::modules::live_orders::use_cases::refresh_live_orders::inbound::http as refresh_http;
use crate::shell::graphql::{self, AppSchema};
use crate::shell::state::AppState;

pub fn router(state: AppState, schema: AppSchema) -> Router {
    Router::new()
        .route("/live-orders", get(list_http::list))
        .route("/live-orders/refetch", post(refresh_http::handle))
        .route("/live-orders/{id}", get(list_http::get_one))
        .route("/gql", get(graphql::graphiql).post(graphql::graphql))
        .layer(Extension(schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
