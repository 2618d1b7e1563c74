//! API routes for the grounding server

pub mod pesquisa;

use axum::{routing::post, Router};

use crate::server::state::AppState;

/// Build the question-answering routes
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/pesquisa", post(pesquisa::pesquisa))
}
