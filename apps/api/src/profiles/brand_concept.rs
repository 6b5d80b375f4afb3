// Brand concept summarisation: the secondary generation path.
// Fetches the brand's site and asks the generation service for a short summary
// that every later brand-concept post is written from.

use tracing::info;

use crate::content::fetch::PageFetcher;
use crate::errors::AppError;
use crate::llm_client::prompts::OUTPUT_ONLY_INSTRUCTION;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::{LlmError, TextGenerator};

/// Pages with less text than this are treated as unusable (usually script-rendered sites).
const MIN_PAGE_CHARS: usize = 50;

fn summary_prompt(site_text: &str) -> String {
    format!(
        "The text below comes from a brand's official website.\n\
         Summarise the brand's concept, philosophy, story and commitments in roughly 300-500 characters.\n\
         {OUTPUT_ONLY_INSTRUCTION}\n\n\
         [Website text]\n{site_text}\n"
    )
}

/// Fetches `url` and summarises it under `policy`.
pub async fn summarize_brand_concept(
    url: &str,
    fetcher: &dyn PageFetcher,
    generator: &dyn TextGenerator,
    policy: &RetryPolicy,
) -> Result<String, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("Brand site URL is required".to_string()));
    }

    let text = fetcher
        .fetch(url)
        .await
        .map_err(|e| AppError::Validation(format!("Failed to fetch {url}: {e}")))?;
    if text.trim().chars().count() < MIN_PAGE_CHARS {
        return Err(AppError::Validation(
            "Not enough text could be read from the brand site".to_string(),
        ));
    }

    let prompt = summary_prompt(&text);
    let p = prompt.as_str();
    let outcome = policy
        .run(move || generator.generate(p), LlmError::is_rate_limited)
        .await;

    let summary = outcome
        .result
        .map_err(|e| AppError::Llm(format!("Brand concept summary failed: {e}")))?;
    info!(
        "Summarised brand concept from {url} ({} chars, {} attempts)",
        summary.chars().count(),
        outcome.attempts
    );
    Ok(summary.trim().to_string())
}
