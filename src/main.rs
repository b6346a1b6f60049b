//! Hate Speech Classification Server
//!
//! Serves a pre-trained text classifier behind `POST /predict`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     HATECHECK SERVER                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌──────────────────────┐ │
//! │  │  API      │──▶│  clean_text  │──▶│  Vectorizer (TF-IDF) │ │
//! │  │  (Axum)   │   │  (regex +    │   └──────────┬───────────┘ │
//! │  │  + CORS   │   │  stopwords)  │              ▼             │
//! │  └───────────┘   └──────────────┘   ┌──────────────────────┐ │
//! │                                     │  Classifier          │ │
//! │                                     └──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both artifacts are loaded once at startup and shared read-only.

mod config;
mod error;
mod handlers;
mod model;
mod text;


use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "hatecheck_server=debug,tower_http=debug".into()));
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Hatecheck server starting ({})...", config.environment);
    tracing::info!(
        "CORS origins: {:?} (credentials: {})",
        config.allowed_origins,
        config.allow_credentials
    );

    // Load model artifacts
    let predictor = model::load_predictor(&config.vectorizer_path, &config.model_path)
        .context("Failed to load model artifacts")?;
    tracing::info!(
        "Model ready: {} + {} over {} features",
        predictor.info().vectorizer_kind,
        predictor.info().classifier_kind,
        predictor.info().n_features
    );

    // Build application state
    let state = AppState {
        predictor: Arc::new(predictor),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state)?;

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("🚀 Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<model::Predictor>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> anyhow::Result<Router> {
    let config = &state.config;

    let mut routes = Router::new()
        .route("/", get(handlers::status::root))
        .route("/health", get(handlers::status::health))
        .route("/predict", post(handlers::predict::predict));

    // GET also answers HEAD
    if config.enable_ping {
        routes = routes.route("/ping", get(handlers::status::ping));
    }

    let mut app = routes
        .fallback(handlers::status::not_found)
        // request text has no size cap
        .layer(DefaultBodyLimit::disable())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config)?);

    if config.enable_preflight {
        app = app.layer(axum_middleware::from_fn(handlers::preflight::handle));
    }

    Ok(app.with_state(state))
}

/// CORS policy from configuration.
///
/// Credentialed responses cannot use wildcards, so origins, methods and
/// headers are mirrored from the request instead.
fn cors_layer(config: &config::Config) -> anyhow::Result<CorsLayer> {
    let origins = if config.allows_any_origin() {
        if config.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        AllowOrigin::list(config.origin_header_values().map_err(anyhow::Error::msg)?)
    };

    let layer = CorsLayer::new().allow_origin(origins);

    Ok(if config.allow_credentials {
        layer
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    } else {
        layer.allow_methods(Any).allow_headers(Any)
    })
}
