//! Application startup and lifecycle management.

use crate::config::InsightConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::AnalysisService;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    create_ip_rate_limiter, http_trace_layer, ip_rate_limit_middleware, request_id_middleware,
    IpRateLimiter,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub analysis: AnalysisService,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(analysis: AnalysisService, ip_rate_limiter: IpRateLimiter) -> Self {
        Self {
            analysis,
            ip_rate_limiter,
        }
    }
}

/// Build the HTTP router. Only the relay endpoints are rate limited.
/// Webhook bodies are accepted at any size.
pub fn build_router(state: AppState) -> Router {
    let relay_routes = Router::new()
        .route("/analyze-data", post(handlers::analyze_data))
        .route("/analize-data", post(handlers::analyze_data))
        .route("/generate-data", post(handlers::generate_data))
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .merge(relay_routes)
        .with_state(state)
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: InsightConfig) -> Result<Self, AppError> {
        // Initialize Gemini text provider
        let gemini_config = GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.models.text_model.clone(),
            api_base: config.models.api_base.clone(),
            timeout: config.provider.timeout,
        };
        let text_provider: Arc<dyn TextProvider> =
            Arc::new(GeminiTextProvider::new(gemini_config).map_err(|e| {
                tracing::error!("Failed to initialize Gemini provider: {}", e);
                AppError::ConfigError(anyhow::anyhow!(e))
            })?);

        tracing::info!(
            model = %config.models.text_model,
            timeout_secs = config.provider.timeout.as_secs(),
            "Initialized Gemini text provider"
        );

        let ip_rate_limiter =
            create_ip_rate_limiter(config.rate_limit.requests, config.rate_limit.window_seconds)?
                .trust_forwarded_for(config.rate_limit.trust_forwarded_for);
        tracing::info!(
            requests = config.rate_limit.requests,
            window_seconds = config.rate_limit.window_seconds,
            trust_forwarded_for = config.rate_limit.trust_forwarded_for,
            "Initialized IP rate limiter"
        );

        let state = AppState::new(
            AnalysisService::new(text_provider, config.provider.timeout),
            ip_rate_limiter,
        );

        Self::with_state(config.common.port, state).await
    }

    /// Bind a listener for an already assembled state (port 0 = random port for testing).
    pub async fn with_state(port: u16, state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Insight service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
