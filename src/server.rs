mod rate_limit;

pub use rate_limit::RateLimiter;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::RelayError;
use crate::handlers;
use crate::nutrition::Pipeline;
use crate::services::ChatCompletion;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    /// `None` when no API key is configured.
    pub ai: Option<Arc<dyn ChatCompletion>>,
    pub pipeline: Pipeline,
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    pub fn completion(&self) -> Result<&dyn ChatCompletion, RelayError> {
        self.ai.as_deref().ok_or(RelayError::NotConfigured)
    }
}

pub fn create_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/analyze-food", post(handlers::analyze_food))
        .route("/nutrition", post(handlers::nutrition))
        .route("/fix-food", post(handlers::fix_food))
        .route("/chat", post(handlers::chat))
        .route("/chat/stream", post(handlers::chat_stream))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/", get(root_handler))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(allowed_origins))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn root_handler() -> Json<Value> {
    log::debug!("Health check endpoint called");
    Json(json!({
        "message": "Food Analyzer API Server",
        "status": "operational",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// First `X-Forwarded-For` entry, else the socket peer.
fn client_ip(request: &Request) -> IpAddr {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

async fn rate_limit(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if let Some(limiter) = &state.rate_limiter {
        let ip = client_ip(&request);
        if !limiter.acquire(ip).await {
            log::warn!("🚦 Rate limit exceeded for {} on {}", ip, request.uri().path());
            return RelayError::RateLimited.into_response();
        }
    }
    next.run(request).await
}
