pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::content::handlers as documents;
use crate::generation::handlers as generation;
use crate::profiles::handlers as profiles;
use crate::report::handlers as reports;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profiles
        .route("/api/v1/profiles", get(profiles::handle_list_profiles))
        .route("/api/v1/profiles/default", get(profiles::handle_default_profile))
        .route(
            "/api/v1/profiles/brand-concept",
            post(profiles::handle_brand_concept),
        )
        .route(
            "/api/v1/profiles/:id",
            get(profiles::handle_get_profile)
                .put(profiles::handle_save_profile)
                .delete(profiles::handle_delete_profile),
        )
        // Source documents
        .route("/api/v1/documents/extract", post(documents::handle_extract))
        // Planning and generation
        .route(
            "/api/v1/schedule/preview",
            post(generation::handle_schedule_preview),
        )
        .route("/api/v1/runs", post(generation::handle_run))
        // Export
        .route("/api/v1/reports/xlsx", post(reports::handle_export_xlsx))
        .with_state(state)
}
