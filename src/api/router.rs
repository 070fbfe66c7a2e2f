//! API router configuration.

use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    api_info, create_session, delete_session, get_session, get_transcript, health, index,
    ingest_url, send_message, set_credential, AppState,
};
use crate::error::SiteChatError;
use crate::session::spawn_reaper;

/// Create the API router with the given state.
pub fn create_router_with_state(state: AppState) -> Router {
    // Session routes
    let session_routes = Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/credential", put(set_credential))
        .route("/{id}/ingest", post(ingest_url))
        .route("/{id}/messages", post(send_message))
        .route("/{id}/transcript", get(get_transcript));

    // API v1 routes
    let api_v1 = Router::new()
        .route("/", get(api_info))
        .nest("/sessions", session_routes);

    // Build main router
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Stop accepting connections on Ctrl-C and drain in-flight requests.
    pub graceful_shutdown: bool,
    /// Sessions idle for longer than this are discarded.
    pub idle_timeout: Duration,
    /// How often idle sessions are swept.
    pub reap_interval: Duration,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            graceful_shutdown: true,
            idle_timeout: Duration::from_secs(3600),
            reap_interval: Duration::from_secs(60),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// Start the API server with the given state.
pub async fn serve_with_state(config: ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let reaper = spawn_reaper(
        state.store.clone(),
        config.idle_timeout,
        config.reap_interval,
    );
    let router = create_router_with_state(state);

    tracing::info!("Starting site-chat server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(SiteChatError::Io)?;

    let result = if config.graceful_shutdown {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    } else {
        axum::serve(listener, router).await
    };

    reaper.abort();
    result.map_err(SiteChatError::Io)?;

    Ok(())
}
