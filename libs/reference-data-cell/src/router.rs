use std::sync::Arc;

use axum::{middleware, routing::{get, put}, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn reference_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{kind}", get(handlers::list_entries).post(handlers::create_entry))
        .route("/{kind}/{entry_id}", put(handlers::update_entry).delete(handlers::delete_entry))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
