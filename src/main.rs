//! Atelier - visual chat over a hosted multimodal model
//!
//! Serves a single page where the user attaches an image and talks about it
//! with a vision-capable model behind an OpenAI-compatible endpoint.

mod api;
mod chat;
mod config;
mod llm;
mod session;
mod system_prompt;
mod upload;

use api::{create_router, AppState};
use chat::ChatOrchestrator;
use config::AppConfig;
use llm::{LoggingService, OpenAiCompatService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env()?;

    let api_key = config.api_key.clone().unwrap_or_else(|| {
        tracing::warn!("GROQ_API_KEY is not set; every turn will fail until it is configured");
        String::new()
    });

    let backend = OpenAiCompatService::new(
        api_key,
        config.model.clone(),
        &config.api_base,
        config.request_timeout,
    )?;
    let llm = Arc::new(LoggingService::new(Arc::new(backend)));
    tracing::info!(
        model = %config.model,
        api_base = %config.api_base,
        temperature = config.turn.temperature,
        max_tokens = config.turn.max_tokens,
        "Inference backend configured"
    );

    let chat = ChatOrchestrator::new(llm, system_prompt::build_system_prompt(), config.turn);
    let state = AppState::new(chat, config.max_upload_bytes);
    state.sessions.clone().spawn_eviction(config.session_ttl);
    tracing::info!(ttl_secs = config.session_ttl.as_secs(), "Idle session sweep started");

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        "{} {} listening on {}",
        system_prompt::APP_NAME,
        system_prompt::APP_EMOJI,
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
