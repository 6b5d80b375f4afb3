mod config;
mod content;
mod errors;
mod generation;
mod llm_client;
mod planning;
mod profiles;
mod report;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::content::fetch::HttpPageFetcher;
use crate::generation::orchestrator::OrchestratorSettings;
use crate::llm_client::GeminiClient;
use crate::profiles::github::GitHubProfileStore;
use crate::profiles::store::{FileProfileStore, ProfileStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Caption API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize generation client
    let generator = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    info!("LLM client initialized (model: {})", generator.model());

    let fetcher = HttpPageFetcher::new()?;

    // Profile store: GitHub when a token is configured, local files otherwise
    let profiles: Arc<dyn ProfileStore> = match &config.github {
        Some(github) => {
            info!(
                "Profile store: GitHub {}@{}",
                github.repo, github.branch
            );
            Arc::new(GitHubProfileStore::new(github.clone())?)
        }
        None => {
            info!("Profile store: {}", config.clients_dir.display());
            Arc::new(FileProfileStore::new(config.clients_dir.clone()))
        }
    };

    let orchestrator = OrchestratorSettings::from_config(&config);
    info!(
        "Run pacing: {}s between posts, {}s retry base",
        orchestrator.inter_slot_delay.as_secs(),
        config.retry_base_delay.as_secs()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        generator: Arc::new(generator),
        fetcher: Arc::new(fetcher),
        profiles,
        orchestrator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
