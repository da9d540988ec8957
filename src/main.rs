mod auth;
mod config;
mod dto;
mod handlers;
mod models;
mod pagination;
mod repository;
mod service;
mod state;
mod summarizer;
mod supabase;

use handlers::rest;
use state::AppState;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt::init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to locate or load config: {e}");
    });
    tracing::info!("Successfully loaded notes server config");
    tracing::info!(
        "Using supabase project {} and model {}",
        cfg.supabase.url,
        cfg.gemini.model
    );

    // One pooled client for supabase and the model API
    let client = reqwest::Client::builder()
        .timeout(cfg.request_timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!("Failed to create HTTP client: {e}");
            panic!("failed to create HTTP client: {e}");
        });

    // Router config
    let router = rest::router(AppState::new(&client, &cfg));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind port {}: {e}", cfg.port);
            panic!("failed to bind port {}: {e}", cfg.port);
        });

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Notes server starting, listening on {}", addr),
        Err(e) => tracing::warn!("Notes server starting, local address unknown: {e}"),
    }

    axum::serve(listener, router).await.unwrap_or_else(|e| {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to start HTTP server: {e}");
    });
}
