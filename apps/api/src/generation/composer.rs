//! Prompt composition for one slot.
//!
//! Sections are appended in a fixed order: profile rules, the item-kind block, position,
//! variation, seasonal event, then sample captions. Optional data that is missing is
//! left out; the only hard failure is a document-sourced single with no product name.

use chrono::NaiveDate;

use crate::content::cache::PageContentCache;
use crate::content::models::{CollectionSource, ContentItem, ProductSource};
use crate::errors::AppError;
use crate::generation::prompts::{
    ordinal, VariationGuide, BRAND_SECTION, BRAND_VARIATION, CAPTION_SYSTEM_TEMPLATE,
    COLLECTION_SECTION, COLLECTION_VARIATION, SEASONAL_INSTRUCTION, SINGLE_SECTION,
    SINGLE_VARIATION,
};
use crate::llm_client::prompts::{CLAIMS_INSTRUCTION, OUTPUT_ONLY_INSTRUCTION};
use crate::profiles::models::ToneProfile;

/// Where a slot sits in the run.
#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    /// 1-based.
    pub position: usize,
    pub total_slots: Option<usize>,
    /// 1-based count of this item's occurrences so far.
    pub variation: u32,
    pub seasonal_hint: Option<&'a str>,
    pub date: Option<NaiveDate>,
}

fn section(prompt: &mut String, heading: &str, body: &str) {
    prompt.push_str(&format!("[{heading}]\n{}\n\n", body.trim_end()));
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn compose_prompt(
    item: &ContentItem,
    profile: &ToneProfile,
    pages: &PageContentCache,
    ctx: &PromptContext<'_>,
) -> Result<String, AppError> {
    let mut prompt = CAPTION_SYSTEM_TEMPLATE
        .replace("{output_only}", OUTPUT_ONLY_INSTRUCTION)
        .replace("{claims}", CLAIMS_INSTRUCTION);
    prompt.push_str("\n\n");

    section(&mut prompt, "Brand name", &profile.brand_name);
    section(&mut prompt, "Tone and manner", &profile.tone_instructions);
    section(&mut prompt, "Cautions", &profile.notes);
    section(
        &mut prompt,
        "Hashtag rules",
        &format!(
            "- Fixed hashtag: {}\n- At most {} hashtags\n- Include a hashtag for the brand name",
            profile.hashtag_fixed, profile.hashtag_limit
        ),
    );
    section(
        &mut prompt,
        "Template (always append this text at the end of the caption)",
        &profile.template,
    );

    let guide: VariationGuide = match item {
        ContentItem::Single {
            source,
            product_name,
            ..
        } => {
            prompt.push_str(SINGLE_SECTION);
            prompt.push_str("\n\n");
            match source {
                ProductSource::Url { url } => {
                    let url = url.trim();
                    section(
                        &mut prompt,
                        "Product page",
                        &format!("URL: {url}\n\n{}", pages.text(url)),
                    );
                }
                ProductSource::Document { file_name, text } => {
                    let name = trimmed(product_name).ok_or_else(|| {
                        AppError::Validation(format!(
                            "Product name is required for document '{file_name}'"
                        ))
                    })?;
                    section(&mut prompt, "Product name", name);
                    section(&mut prompt, "Product information from the release document", text);
                }
            }
            SINGLE_VARIATION
        }
        ContentItem::Collection { source, note, .. } => {
            prompt.push_str(COLLECTION_SECTION);
            prompt.push_str("\n\n");
            if let Some(note) = trimmed(note) {
                section(&mut prompt, "What the photo shows / angle", note);
            }
            match source {
                CollectionSource::Urls { .. } => {
                    for (j, url) in item.page_urls().into_iter().enumerate() {
                        let text = pages.text(url);
                        if !text.is_empty() {
                            section(
                                &mut prompt,
                                &format!("Product {} page", j + 1),
                                &format!("URL: {url}\n\n{text}"),
                            );
                        }
                    }
                }
                CollectionSource::Documents { text, .. } => {
                    section(&mut prompt, "Product information from the release documents", text);
                }
            }
            COLLECTION_VARIATION
        }
        ContentItem::BrandConcept { angle, .. } => {
            prompt.push_str(BRAND_SECTION);
            prompt.push_str("\n\n");
            if !profile.brand_concept.trim().is_empty() {
                section(&mut prompt, "Brand concept", &profile.brand_concept);
            }
            if let Some(angle) = trimmed(angle) {
                section(&mut prompt, "Angle / theme for this post", angle);
            }
            BRAND_VARIATION
        }
    };

    if let Some(total) = ctx.total_slots {
        section(
            &mut prompt,
            "Post position",
            &format!("This is post {} of {total}.", ctx.position),
        );
    }

    if ctx.variation > 1 {
        section(
            &mut prompt,
            "Variation",
            &format!(
                "{}\nThis is the {} post of this item.\nExamples: {}",
                guide.lead,
                ordinal(ctx.variation),
                guide.examples()
            ),
        );
    }

    if let Some(event) = ctx.seasonal_hint {
        let date = ctx
            .date
            .map(|d| format!("Planned post date: {}\n", d.format("%m/%d")))
            .unwrap_or_default();
        section(
            &mut prompt,
            "Seasonal event",
            &format!("{date}Related event: {event}\n{SEASONAL_INSTRUCTION}"),
        );
    }

    if !profile.sample_captions.trim().is_empty() {
        section(
            &mut prompt,
            "Sample captions (match this style and tone)",
            &profile.sample_captions,
        );
    }

    Ok(prompt)
}
