use axum::{routing::get, Router};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::{app_state::AppState, routes};

pub fn create(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/", get(|| async { "ParentalGenotype search service is up" }))
        .nest("/search", routes::search::router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
