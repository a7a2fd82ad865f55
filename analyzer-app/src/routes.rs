use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, handlers};

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/urls", get(handlers::list_urls).post(handlers::create_url))
        .route("/urls/:id", get(handlers::show_url))
        .route("/urls/:id/check", post(handlers::create_check))
        .fallback(handlers::not_found)
        .with_state(state)
}
