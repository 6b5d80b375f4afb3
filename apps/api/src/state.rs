use std::sync::Arc;

use crate::config::Config;
use crate::content::fetch::PageFetcher;
use crate::generation::orchestrator::OrchestratorSettings;
use crate::llm_client::TextGenerator;
use crate::profiles::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Gemini in production; a stub in tests.
    pub generator: Arc<dyn TextGenerator>,
    pub fetcher: Arc<dyn PageFetcher>,
    /// Local JSON files, or a GitHub repository when `GITHUB_TOKEN` is set.
    pub profiles: Arc<dyn ProfileStore>,
    pub orchestrator: OrchestratorSettings,
}
