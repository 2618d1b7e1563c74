//! HTTP server for the grounding pipeline

pub mod routes;
pub mod state;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::GenerationClient;
use crate::pipeline::Pipeline;
use state::AppState;

/// Grounding HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server; the generation client is built once by the caller
    pub fn new(config: RagConfig, generation: GenerationClient) -> Result<Self> {
        let pipeline = Pipeline::from_config(&config, Arc::new(generation))?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an assembled pipeline
    pub fn with_pipeline(config: RagConfig, pipeline: Pipeline) -> Self {
        let state = AppState::new(config.clone(), pipeline);
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Result<Router> {
        let origin = HeaderValue::from_str(&self.config.server.allowed_origin).map_err(|e| {
            Error::Config(format!(
                "Invalid allowed origin '{}': {}",
                self.config.server.allowed_origin, e
            ))
        })?;

        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(Duration::from_secs(self.config.server.cors_max_age_secs));

        Ok(Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .merge(routes::api_routes())
            .with_state(self.state.clone())
            // Applied bottom to top: the 204 rewrite wraps the CORS answer
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(middleware::from_fn(preflight_no_content)))
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router()?;

        tracing::info!("Starting grounding server on http://{}", addr);
        tracing::info!("Allowed origin: {}", self.config.server.allowed_origin);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Answer CORS preflights with 204 instead of 200
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
