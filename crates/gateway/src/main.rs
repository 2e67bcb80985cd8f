//! Signet API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Rate limiting
//! - Document, contact, and signing workflow routes
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use signet_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    metrics,
    notify::{transport_from_config, Notifier},
    signing::SigningService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub signing: SigningService,
    pub notifier: Notifier,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .json()
        .init();

    info!("Starting Signet API Gateway v{}", signet_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();

    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .set_buckets_for_metric(
                metrics_exporter_prometheus::Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .with_http_listener(addr)
            .install()?;
        info!("Prometheus exporter listening on {}", addr);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    let repo = Repository::new(db.clone());
    let transport = transport_from_config(&config.notify)?;
    let base_url = config.public_base_url().to_string();

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        signing: SigningService::new(repo.clone(), base_url.clone()),
        notifier: Notifier::new(repo, transport, base_url),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Health endpoints (no auth)
    let health_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready));

    // Authenticated API routes
    let mut api_routes = Router::new()
        // Document endpoints
        .route("/documents", post(handlers::documents::create_document))
        .route("/documents", get(handlers::documents::list_documents))
        .route("/documents/{id}", get(handlers::documents::get_document))
        .route("/documents/{id}", delete(handlers::documents::delete_document))

        // Contact endpoints
        .route("/contacts", post(handlers::contacts::create_contact))
        .route("/contacts/{id}", get(handlers::contacts::get_contact))
        .route("/contacts/{id}", patch(handlers::contacts::update_contact))

        // Signing workflow endpoints
        .route("/documents/{id}/signing-links", post(handlers::signing::issue_links))
        .route("/documents/{id}/notifications", post(handlers::notifications::notify_document));

    api_routes = api_routes.layer(axum::middleware::from_fn(signet_common::auth::auth_middleware));

    // Per-workspace rate limiting
    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        api_routes = api_routes.layer(axum::middleware::from_fn(
            move |request, next| {
                middleware::rate_limit::rate_limit_middleware(request, next, limiter.clone())
            },
        ));
    }

    // Public signer endpoints live at the root: the externally addressable
    // contract is {APP_URL}/sign/{token}, token-gated rather than auth-gated.
    let signer_routes = Router::new()
        .route("/sign/{token}", get(handlers::signing::resolve_token))
        .route("/sign/{token}", post(handlers::signing::submit_fields));

    // Compose the app
    Router::new()
        .nest("/v1", health_routes.merge(api_routes))
        .merge(signer_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
