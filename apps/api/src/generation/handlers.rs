//! Axum route handlers for schedule previews and generation runs.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::orchestrator::{GenerationOrchestrator, RunReport};
use crate::planning::plan::{PlanSize, RunPlan};
use crate::planning::schedule::generate_schedule;
use crate::planning::seasonal::{all_events, suggested_events};
use crate::profiles::models::ToneProfile;
use crate::report::{date_label, Report};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SchedulePreviewRequest {
    pub plan_size: PlanSize,
    pub start_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct PreviewSlot {
    pub index: usize,
    pub date: NaiveDate,
    pub date_label: String,
    pub suggested_events: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SchedulePreviewResponse {
    pub weekdays: &'static str,
    pub slots: Vec<PreviewSlot>,
    pub all_events: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub profile_id: String,
    /// Unsaved edits to the stored profile; used instead of it when present.
    #[serde(default)]
    pub profile: Option<ToneProfile>,
    pub plan: RunPlan,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run: RunReport,
    /// Rows ready for review and `POST /api/v1/reports/xlsx`.
    pub report: Report,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/schedule/preview
///
/// Dated slots for a plan size and start date, with seasonal suggestions per slot.
pub async fn handle_schedule_preview(
    Json(request): Json<SchedulePreviewRequest>,
) -> Result<Json<SchedulePreviewResponse>, AppError> {
    let policy = request.plan_size.weekday_policy();
    let slots = generate_schedule(request.plan_size.get(), request.start_date, policy.weekdays())?
        .into_iter()
        .map(|slot| PreviewSlot {
            index: slot.index,
            date: slot.date,
            date_label: date_label(slot.date),
            suggested_events: suggested_events(slot.date),
        })
        .collect();

    Ok(Json(SchedulePreviewResponse {
        weekdays: policy.label(),
        slots,
        all_events: all_events(),
    }))
}

/// POST /api/v1/runs
///
/// Runs the full plan synchronously. Per-slot failures come back as placeholder captions
/// plus warnings; only plan-level problems fail the request.
pub async fn handle_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let profile = match request.profile {
        Some(profile) => profile,
        None => state
            .profiles
            .load(&request.profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", request.profile_id)))?,
    };

    let orchestrator = GenerationOrchestrator::new(
        state.generator.as_ref(),
        state.fetcher.as_ref(),
        state.orchestrator,
    );
    let run = orchestrator.run(&request.plan, &profile).await?;
    let report = Report::from_results(profile.display_label(&request.profile_id), &run.results);

    Ok(Json(RunResponse { run, report }))
}
