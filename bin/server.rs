// Coverage Effect - Results Server
// Serves the rendered chart and the run's results over HTTP

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use coverage_effect::{EffectRecord, ResultsArtifact, RunConfig, RunSummary};

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<RunConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

fn load_artifact(config: &RunConfig) -> Result<ResultsArtifact, String> {
    let path = config.results_path();
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {:?}: {}", path, e))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/records - Per-entity effect records
async fn get_records(State(state): State<AppState>) -> impl IntoResponse {
    match load_artifact(&state.config) {
        Ok(artifact) => {
            let records: Vec<EffectRecord> = artifact.results.records().to_vec();
            (StatusCode::OK, Json(ApiResponse::ok(records))).into_response()
        }
        Err(e) => {
            eprintln!("Error loading records: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<EffectRecord>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/summary - Run summary counts
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    match load_artifact(&state.config) {
        Ok(artifact) => {
            (StatusCode::OK, Json(ApiResponse::ok(artifact.summary))).into_response()
        }
        Err(e) => {
            eprintln!("Error loading summary: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(RunSummary::default())),
            )
                .into_response()
        }
    }
}

/// GET / - Serve the rendered chart
async fn serve_chart(State(state): State<AppState>) -> impl IntoResponse {
    match std::fs::read_to_string(state.config.chart_html_path()) {
        Ok(page) => Html(page).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Html("<h1>No chart yet</h1><p>Run <code>coverage-effect</code> first.</p>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Coverage Effect - Results Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Optional --config <file>, otherwise defaults
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.as_slice() {
        [] => RunConfig::default(),
        [flag, path] if flag == "--config" => {
            RunConfig::load(std::path::Path::new(path)).unwrap_or_else(|e| {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            })
        }
        _ => {
            eprintln!("Usage: coverage-server [--config <file>]");
            std::process::exit(1);
        }
    };

    if !config.results_path().exists() {
        eprintln!("❌ Results not found at {:?}", config.results_path());
        eprintln!("   Run: cargo run --bin coverage-effect");
        eprintln!("   to produce results first.");
        std::process::exit(1);
    }
    println!("✓ Serving output dir: {:?}", config.output_dir);

    let output_dir = config.output_dir.clone();
    let state = AppState {
        config: Arc::new(config),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/records", get(get_records))
        .route("/summary", get(get_summary));

    // Build main router
    let app = Router::new()
        .route("/", get(serve_chart))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(output_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Chart: http://localhost:3000");
    println!("   API:   http://localhost:3000/api/records");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
