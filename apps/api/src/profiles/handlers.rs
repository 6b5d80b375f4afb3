//! Axum route handlers for tone profiles.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::retry::RetryPolicy;
use crate::profiles::brand_concept::summarize_brand_concept;
use crate::profiles::models::ToneProfile;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    /// id → display name.
    pub profiles: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct BrandConceptRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct BrandConceptResponse {
    pub brand_concept: String,
}

/// GET /api/v1/profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
) -> Result<Json<ProfileListResponse>, AppError> {
    let profiles = state.profiles.list().await?;
    Ok(Json(ProfileListResponse { profiles }))
}

/// GET /api/v1/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToneProfile>, AppError> {
    state
        .profiles
        .load(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")))
}

/// GET /api/v1/profiles/default
///
/// A fresh profile with the editable defaults, for the "new client" form.
pub async fn handle_default_profile() -> Json<ToneProfile> {
    Json(ToneProfile::default())
}

/// PUT /api/v1/profiles/:id
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<ToneProfile>,
) -> Result<Json<ToneProfile>, AppError> {
    state.profiles.save(&id, &profile).await?;
    Ok(Json(profile))
}

/// DELETE /api/v1/profiles/:id
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.profiles.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/profiles/brand-concept
///
/// Summarises a brand site. The caller stores the result in a profile's `brand_concept`.
pub async fn handle_brand_concept(
    State(state): State<AppState>,
    Json(request): Json<BrandConceptRequest>,
) -> Result<Json<BrandConceptResponse>, AppError> {
    let policy = RetryPolicy::summarization(state.config.retry_base_delay);
    let brand_concept = summarize_brand_concept(
        &request.url,
        state.fetcher.as_ref(),
        state.generator.as_ref(),
        &policy,
    )
    .await?;
    Ok(Json(BrandConceptResponse { brand_concept }))
}
