mod config;
mod error;
mod handlers;
mod models;
mod nutrition;
mod server;
mod services;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;

use config::Config;
use nutrition::Pipeline;
use server::{create_router, AppState, RateLimiter};
use services::{ChatCompletion, OpenAIService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting Food Analyzer API Server...");

    let config = Config::from_env().context("Invalid configuration")?;

    let ai: Option<Arc<dyn ChatCompletion>> = match &config.api_key {
        Some(key) => {
            let service = OpenAIService::new(key.clone(), config.model.clone(), config.api_url.clone());
            log::info!("✅ OpenAI service initialized with model: {}", service.model());
            Some(Arc::new(service))
        }
        None => {
            log::warn!("⚠️ OPENAI_API_KEY not set, API routes will answer with a configuration error");
            None
        }
    };

    let rate_limiter = RateLimiter::new(config.rate_limit);
    match &rate_limiter {
        Some(_) => log::info!("🚦 Rate limit: {} requests per minute per IP", config.rate_limit),
        None => log::info!("🚦 Rate limiting disabled"),
    }

    if config.allowed_origins.is_empty() {
        log::info!("🌍 CORS: any origin");
    } else {
        log::info!("🌍 CORS allowed origins: {}", config.allowed_origins.join(", "));
    }

    log::info!("🍽️ Fallback profile: {:?}", config.fallback_profile);
    let state = Arc::new(AppState {
        ai,
        pipeline: Pipeline::new(config.fallback_profile),
        rate_limiter,
    });

    let app = create_router(state, &config.allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("🌐 Server running on port {}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        // Keep running until Ctrl+C
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("❌ Failed to listen for shutdown signal: {}", e);
        }
        log::info!("🛑 Shutting down...");
    })
    .await
    .context("Server error")?;

    Ok(())
}
