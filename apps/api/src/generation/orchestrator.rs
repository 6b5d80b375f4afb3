//! Generation run: drives a validated plan through the generation service.
//!
//! Flow: validate plan → schedule + round-robin assignments → fetch every distinct page
//! once → for each slot in order: compose prompt → generate under the retry policy →
//! record result. Slots run one at a time with a fixed pause between them.
//!
//! A failed slot never aborts the run. It gets a placeholder caption and a warning.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::content::cache::{FetchWarning, PageContentCache};
use crate::content::fetch::PageFetcher;
use crate::content::models::ContentItem;
use crate::errors::AppError;
use crate::generation::composer::{compose_prompt, PromptContext};
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::{LlmError, TextGenerator};
use crate::planning::assignment::{build_assignments, Assignment, VariationCounter};
use crate::planning::plan::RunPlan;
use crate::planning::schedule::{generate_schedule, ScheduleSlot};
use crate::profiles::models::ToneProfile;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub retry: RetryPolicy,
    /// Pause between successive slots, on top of any retry backoff.
    pub inter_slot_delay: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry: RetryPolicy::generation(config.retry_base_delay),
            inter_slot_delay: config.inter_slot_delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Succeeded,
    Failed,
}

/// One slot's outcome. Operators may edit the caption before export.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub slot_index: usize,
    pub date: NaiveDate,
    pub kind_label: &'static str,
    pub item_label: String,
    pub source_url: Option<String>,
    /// Generated text, or a placeholder describing the failure.
    pub caption_text: String,
    pub seasonal_event: Option<String>,
    pub status: SlotStatus,
    pub attempts: u32,
    pub backoff_waits: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub message: String,
}

impl From<FetchWarning> for RunWarning {
    fn from(w: FetchWarning) -> Self {
        Self {
            slot_index: None,
            url: Some(w.url),
            message: w.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub weekdays: &'static str,
    pub results: Vec<GenerationResult>,
    pub warnings: Vec<RunWarning>,
}

impl RunReport {
    pub fn failed_slots(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == SlotStatus::Failed)
            .count()
    }
}

/// Everything one run owns. Created per run and dropped when it ends.
#[derive(Debug)]
pub struct RunState {
    pub run_id: Uuid,
    pub schedule: Vec<ScheduleSlot>,
    pub assignments: Vec<Assignment>,
    pub page_cache: PageContentCache,
    pub variations: VariationCounter,
    pub results: Vec<GenerationResult>,
    pub warnings: Vec<RunWarning>,
}

impl RunState {
    fn new(schedule: Vec<ScheduleSlot>, assignments: Vec<Assignment>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            schedule,
            assignments,
            page_cache: PageContentCache::new(),
            variations: VariationCounter::new(),
            results: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

pub struct GenerationOrchestrator<'a> {
    generator: &'a dyn TextGenerator,
    fetcher: &'a dyn PageFetcher,
    settings: OrchestratorSettings,
}

/// Generation outcome for one slot, before it is dated and labelled.
struct SlotOutcome {
    caption_text: String,
    status: SlotStatus,
    attempts: u32,
    backoff_waits: u32,
    error: Option<String>,
}

impl<'a> GenerationOrchestrator<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        fetcher: &'a dyn PageFetcher,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            generator,
            fetcher,
            settings,
        }
    }

    /// Runs the whole plan. Only plan-level problems (including a repeat total that does
    /// not match the plan size) return `Err`, and they do so before any request is made.
    pub async fn run(&self, plan: &RunPlan, profile: &ToneProfile) -> Result<RunReport, AppError> {
        plan.validate()?;

        let policy = plan.plan_size.weekday_policy();
        let schedule = generate_schedule(plan.plan_size.get(), plan.start_date, policy.weekdays())?;
        let assignments = build_assignments(&plan.items);
        if assignments.len() != schedule.len() {
            return Err(AppError::ConfigurationMismatch {
                expected: schedule.len(),
                actual: assignments.len(),
            });
        }

        let mut state = RunState::new(schedule, assignments);
        info!(
            "Run {} started: {} posts ({}), {} items",
            state.run_id,
            state.schedule.len(),
            policy.label(),
            plan.items.len()
        );

        let urls = state
            .assignments
            .iter()
            .flat_map(|a| plan.items[a.item_index].page_urls());
        let fetch_warnings = state.page_cache.warm(self.fetcher, urls).await;
        state.warnings.extend(fetch_warnings.into_iter().map(RunWarning::from));

        for (slot, assignment) in state.schedule.iter().zip(&state.assignments) {
            if slot.index > 0 {
                tokio::time::sleep(self.settings.inter_slot_delay).await;
            }

            let item = &plan.items[assignment.item_index];
            let seasonal_hint = plan.seasonal_hint(slot.index);
            let ctx = PromptContext {
                position: slot.index + 1,
                total_slots: Some(state.schedule.len()),
                variation: state.variations.next(item),
                seasonal_hint,
                date: Some(slot.date),
            };

            info!(
                "Generating post {}/{} ({}, variation {})",
                ctx.position,
                state.schedule.len(),
                item.kind_label(),
                ctx.variation
            );
            let outcome = self.generate_slot(item, profile, &state.page_cache, &ctx).await;
            if let Some(message) = outcome.error {
                state.warnings.push(RunWarning {
                    slot_index: Some(slot.index),
                    url: None,
                    message,
                });
            }

            let page_text = item.display_url().map(|url| state.page_cache.text(&url).to_string());
            state.results.push(GenerationResult {
                slot_index: slot.index,
                date: slot.date,
                kind_label: item.kind_label(),
                item_label: item.display_name(page_text.as_deref()),
                source_url: item.display_url(),
                caption_text: outcome.caption_text,
                seasonal_event: seasonal_hint.map(str::to_string),
                status: outcome.status,
                attempts: outcome.attempts,
                backoff_waits: outcome.backoff_waits,
            });
        }

        let report = RunReport {
            run_id: state.run_id,
            weekdays: policy.label(),
            results: state.results,
            warnings: state.warnings,
        };
        info!(
            "Run {} finished: {} posts, {} failed, {} warnings",
            report.run_id,
            report.results.len(),
            report.failed_slots(),
            report.warnings.len()
        );
        Ok(report)
    }

    async fn generate_slot(
        &self,
        item: &ContentItem,
        profile: &ToneProfile,
        pages: &PageContentCache,
        ctx: &PromptContext<'_>,
    ) -> SlotOutcome {
        let prompt = match compose_prompt(item, profile, pages, ctx) {
            Ok(prompt) => prompt,
            Err(e) => return failed_slot(ctx.position, e.to_string(), 0, 0),
        };

        let generator = self.generator;
        let p = prompt.as_str();
        let outcome = self
            .settings
            .retry
            .run(move || generator.generate(p), LlmError::is_rate_limited)
            .await;

        match outcome.result {
            Ok(text) => SlotOutcome {
                caption_text: text.trim().to_string(),
                status: SlotStatus::Succeeded,
                attempts: outcome.attempts,
                backoff_waits: outcome.waits,
                error: None,
            },
            Err(e) => failed_slot(ctx.position, e.to_string(), outcome.attempts, outcome.waits),
        }
    }
}

fn failed_slot(position: usize, error: String, attempts: u32, waits: u32) -> SlotOutcome {
    warn!("Post {position} failed after {attempts} attempt(s): {error}");
    SlotOutcome {
        caption_text: format!("Generation error: {error}"),
        status: SlotStatus::Failed,
        attempts,
        backoff_waits: waits,
        error: Some(format!("Post {position}: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fetch::FetchError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers from a script keyed on call number; records every prompt.
    struct ScriptedGenerator {
        prompts: Mutex<Vec<String>>,
        respond: Box<dyn Fn(usize, &str) -> Result<String, LlmError> + Send + Sync>,
    }

    impl ScriptedGenerator {
        fn new(respond: impl Fn(usize, &str) -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
            Self {
                prompts: Mutex::new(vec![]),
                respond: Box::new(respond),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            let call = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            (self.respond)(call, prompt)
        }
    }

    fn rate_limited() -> LlmError {
        LlmError::RateLimited {
            message: "Resource has been exhausted".to_string(),
        }
    }

    struct StubFetcher {
        fetched: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                fetched: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            if url.contains("missing") {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            Ok(format!("Mineral Milk\nGentle UV milk for {url}"))
        }
    }

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            retry: RetryPolicy::generation(Duration::from_secs(15)),
            inter_slot_delay: Duration::from_secs(5),
        }
    }

    fn plan(value: serde_json::Value) -> RunPlan {
        serde_json::from_value(value).unwrap()
    }

    fn brand_only_plan() -> RunPlan {
        plan(json!({
            "plan_size": 8,
            "start_date": "2026-03-02",
            "items": [{"kind": "brand_concept", "repeat_count": 8}]
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_twice_then_succeeds() {
        let generator = ScriptedGenerator::new(|call, _| {
            if call <= 2 {
                Err(rate_limited())
            } else {
                Ok(format!("caption {call}"))
            }
        });
        let fetcher = StubFetcher::new();
        let orchestrator = GenerationOrchestrator::new(&generator, &fetcher, settings());

        let report = orchestrator
            .run(&brand_only_plan(), &ToneProfile::default())
            .await
            .unwrap();

        let first = &report.results[0];
        assert_eq!(first.status, SlotStatus::Succeeded);
        assert_eq!(first.backoff_waits, 2);
        assert_eq!(first.attempts, 3);
        assert_eq!(first.caption_text, "caption 3");
        assert!(report.results[1..].iter().all(|r| r.backoff_waits == 0));
        assert_eq!(generator.calls(), 10);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_slot_fails_and_run_continues() {
        let generator = ScriptedGenerator::new(|_, prompt| {
            if prompt.contains("This is post 1 of 8.") {
                Err(rate_limited())
            } else {
                Ok("fine".to_string())
            }
        });
        let fetcher = StubFetcher::new();
        let orchestrator = GenerationOrchestrator::new(&generator, &fetcher, settings());

        let report = orchestrator
            .run(&brand_only_plan(), &ToneProfile::default())
            .await
            .unwrap();

        let first = &report.results[0];
        assert_eq!(first.status, SlotStatus::Failed);
        assert_eq!(first.attempts, 5);
        assert_eq!(first.backoff_waits, 4);
        assert!(first.caption_text.starts_with("Generation error:"));
        assert_eq!(report.results.len(), 8);
        assert!(report.results[1..].iter().all(|r| r.status == SlotStatus::Succeeded));
        assert_eq!(report.failed_slots(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].slot_index, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_rate_limit_error_is_not_retried() {
        let generator = ScriptedGenerator::new(|call, _| {
            if call == 1 {
                Err(LlmError::Api {
                    status: 500,
                    message: "internal".to_string(),
                })
            } else {
                Ok("fine".to_string())
            }
        });
        let fetcher = StubFetcher::new();
        let orchestrator = GenerationOrchestrator::new(&generator, &fetcher, settings());

        let report = orchestrator
            .run(&brand_only_plan(), &ToneProfile::default())
            .await
            .unwrap();
        assert_eq!(report.results[0].status, SlotStatus::Failed);
        assert_eq!(report.results[0].attempts, 1);
        assert_eq!(generator.calls(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inter_slot_delay_between_slots_only() {
        let generator = ScriptedGenerator::new(|_, _| Ok("fine".to_string()));
        let fetcher = StubFetcher::new();
        let orchestrator = GenerationOrchestrator::new(&generator, &fetcher, settings());
        let started = tokio::time::Instant::now();

        orchestrator
            .run(&brand_only_plan(), &ToneProfile::default())
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(5 * 7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatch_blocks_run_before_any_request() {
        let generator = ScriptedGenerator::new(|_, _| Ok("fine".to_string()));
        let fetcher = StubFetcher::new();
        let orchestrator = GenerationOrchestrator::new(&generator, &fetcher, settings());
        let plan = plan(json!({
            "plan_size": 12,
            "start_date": "2026-03-02",
            "items": [
                {"kind": "single", "source": {"type": "url", "url": "https://shop.example/a"}, "repeat_count": 10}
            ]
        }));

        let err = orchestrator.run(&plan, &ToneProfile::default()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ConfigurationMismatch {
                expected: 12,
                actual: 10
            }
        ));
        assert_eq!(generator.calls(), 0);
        assert!(fetcher.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_fetched_once_and_failures_degrade() {
        let generator = ScriptedGenerator::new(|_, _| Ok("fine".to_string()));
        let fetcher = StubFetcher::new();
        let orchestrator = GenerationOrchestrator::new(&generator, &fetcher, settings());
        let plan = plan(json!({
            "plan_size": 8,
            "start_date": "2026-03-03",
            "items": [
                {"kind": "single", "source": {"type": "url", "url": "https://shop.example/milk"}, "repeat_count": 3},
                {"kind": "single", "source": {"type": "url", "url": "https://shop.example/missing"}, "repeat_count": 1},
                {"kind": "collection", "source": {"type": "urls", "urls": ["https://shop.example/milk", "https://shop.example/gel"]}, "repeat_count": 2},
                {"kind": "single", "source": {"type": "document", "file_name": "release.pdf", "text": "New serum"}, "product_name": "Night Serum", "repeat_count": 2}
            ],
            "seasonal_events": {"0": "White Day"}
        }));

        let report = orchestrator.run(&plan, &ToneProfile::default()).await.unwrap();

        let fetched = fetcher.fetched.lock().unwrap().clone();
        assert_eq!(
            fetched,
            vec![
                "https://shop.example/milk",
                "https://shop.example/missing",
                "https://shop.example/gel"
            ]
        );
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].url.as_deref(), Some("https://shop.example/missing"));
        assert!(report.results.iter().all(|r| r.status == SlotStatus::Succeeded));

        // round-robin: milk, missing, collection, serum, milk, collection, serum, milk
        let labels: Vec<_> = report.results.iter().map(|r| r.item_label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Mineral Milk",
                "Unknown product",
                "Group shot",
                "Night Serum",
                "Mineral Milk",
                "Group shot",
                "Night Serum",
                "Mineral Milk"
            ]
        );
        assert_eq!(report.results[0].seasonal_event.as_deref(), Some("White Day"));
        assert_eq!(report.results[0].source_url.as_deref(), Some("https://shop.example/milk"));
        assert_eq!(report.results[3].source_url, None);
        // first slot lands on the Friday after a Tuesday start
        assert_eq!(report.results[0].date, NaiveDate::from_ymd_opt(2026, 3, 6).unwrap());

        let prompts = generator.prompts.lock().unwrap();
        assert!(!prompts[0].contains("[Variation]"));
        assert!(prompts[4].contains("This is the 2nd post of this item."));
        assert!(prompts[7].contains("This is the 3rd post of this item."));
        assert!(prompts[0].contains("Related event: White Day"));
    }
}
