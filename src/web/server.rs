use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::cli::{build_extractor, load_config, load_store, ServeArgs};
use crate::core::types::TrialId;
use crate::extract::CodeExtractor;
use crate::matching::engine::{MatchError, MatchingConfig, MatchingEngine};
use crate::store::memory::InMemoryStore;
use crate::utils::validation::validate_codes;

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024; // 64KB
pub const MAX_CONCURRENT_REQUESTS: usize = 100;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Upper bound on the `limit` a client may request
pub const MAX_RESULT_LIMIT: usize = 100;

/// Shared application state
pub struct AppState {
    pub store: InMemoryStore,
    pub extractor: Arc<dyn CodeExtractor>,
    pub config: MatchingConfig,
}

/// Body of `POST /api/match`. Codes, when given and non-empty, bypass extraction.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub description: Option<String>,
    pub codes: Option<Vec<String>>,
    pub limit: Option<usize>,
}

/// Enhanced error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

impl IntoResponse for MatchError {
    fn into_response(self) -> Response {
        match &self {
            MatchError::InvalidInput(e) => error_response(
                StatusCode::BAD_REQUEST,
                create_safe_error_response("invalid_input", &e.to_string(), None),
            ),
            MatchError::Timeout { .. } => error_response(
                StatusCode::GATEWAY_TIMEOUT,
                create_safe_error_response(
                    "timeout",
                    "A matching dependency did not respond in time",
                    Some(&self.to_string()),
                ),
            ),
            MatchError::Extraction(_) | MatchError::Store(_) => error_response(
                StatusCode::BAD_GATEWAY,
                create_safe_error_response(
                    "upstream_error",
                    "A matching dependency failed",
                    Some(&self.to_string()),
                ),
            ),
        }
    }
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created, the store, lexicon or
/// config cannot be loaded, or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// Build application state from the serve arguments.
///
/// # Errors
///
/// Returns an error if any input file cannot be loaded.
pub fn build_state(args: &ServeArgs) -> anyhow::Result<AppState> {
    let store = load_store(args.store.as_deref())?;
    let config = load_config(args.config.as_deref(), None)?;
    let extractor = build_extractor(args.lexicon.as_deref(), args.extractor_url.as_deref(), &config)?;
    Ok(AppState {
        store,
        extractor,
        config,
    })
}

/// Create the application router with routes and middleware, except per-IP
/// rate limiting, which needs connection info and is added by the server.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/match", post(match_handler))
        .route("/api/trials", get(trials_handler))
        .route("/api/trials/{id}", get(trial_handler))
        .route("/api/stats", get(stats_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Security headers for browser protection
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("cache-control"),
                    HeaderValue::from_static("no-store"),
                ))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                ))
                .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
                .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE)),
        )
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let state = Arc::new(build_state(&args)?);

    // 10 requests per second per IP, bursts of 50
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(50)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?;

    let app = create_router(state).layer(GovernorLayer {
        config: Arc::new(governor_conf),
    });

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting trial-matcher API at http://{addr}");

    if args.open {
        if let Err(e) = open::that(format!("http://{addr}/api/stats")) {
            tracing::warn!("Could not open browser: {}", e);
        }
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// API endpoint for matching a patient against the store
async fn match_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MatchRequest>,
) -> Response {
    let start_time = std::time::Instant::now();

    let mut config = state.config.clone();
    match request.limit {
        Some(0) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                create_safe_error_response("invalid_input", "limit must be positive", None),
            );
        }
        Some(limit) => config.result_limit = Some(limit.min(MAX_RESULT_LIMIT)),
        None => {}
    }

    let engine = MatchingEngine::with_config(&state.store, state.extractor.as_ref(), config);

    let codes = request.codes.as_deref().unwrap_or_default();
    let result = if codes.iter().any(|c| !c.trim().is_empty()) {
        match validate_codes(codes) {
            Ok(codes) => engine.match_codes(&codes).await,
            Err(e) => Err(e.into()),
        }
    } else {
        engine
            .match_description(request.description.as_deref().unwrap_or_default())
            .await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return e.into_response(),
    };

    #[allow(clippy::cast_possible_truncation)] // Processing time won't exceed u64
    let processing_time = start_time.elapsed().as_millis() as u64;

    Json(serde_json::json!({
        "query": {
            "families": outcome.families(),
        },
        "status": outcome.status(),
        "matches": outcome.trials(),
        "processing_info": {
            "processing_time_ms": processing_time,
            "configuration": {
                "result_limit": engine.config().result_limit,
                "scoring_weights": engine.config().scoring,
            }
        }
    }))
    .into_response()
}

async fn trials_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let trials: Vec<serde_json::Value> = state
        .store
        .trials()
        .iter()
        .map(|t| {
            serde_json::json!({
                "nct_id": t.nct_id,
                "title": t.title,
                "inclusion_count": t.inclusion_count(),
                "exclusion_count": t.exclusion_count(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "count": trials.len(),
        "trials": trials,
    }))
}

async fn trial_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.store.get(&TrialId::new(id)) {
        Some(trial) => Json(trial).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            create_safe_error_response("not_found", "Trial not found", None),
        ),
    }
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.store.stats();
    let coverage = stats.coding_coverage();
    Json(serde_json::json!({
        "trial_count": stats.trial_count,
        "criteria_count": stats.criteria_count,
        "by_category": stats.by_category,
        "condition_total": stats.condition_total,
        "condition_coded": stats.condition_coded,
        "coding_coverage": coverage,
    }))
}
