// Prompt fragments for caption generation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Opening of every caption prompt. Replace: {output_only}, {claims}.
pub const CAPTION_SYSTEM_TEMPLATE: &str = "You are an Instagram caption writer.
Write one Instagram caption that follows the brand's tone and manner.
{output_only}
{claims}";

pub const SINGLE_SECTION: &str = "[Post type: single product]
Write a caption focused on one product.
Include a hashtag for the product name.";

pub const COLLECTION_SECTION: &str = "[Post type: group shot (several products)]
The photo shows several products together.
Introduce the line-up and how the products work as a routine.
Describe each product briefly, and emphasise the benefit of using them together and the line's overall coherence rather than any single product.";

pub const BRAND_SECTION: &str = "[Post type: brand concept]
Write a caption introducing the brand's overall concept, world view and commitments.
Convey the brand's values and story. Do not name a specific product.";

pub const SEASONAL_INSTRUCTION: &str = "Weave this event or the feel of the season naturally into the opening.
Keep the product or brand as the main subject.";

/// Worked examples of different angles, one set per item kind.
#[derive(Debug, Clone, Copy)]
pub struct VariationGuide {
    pub lead: &'static str,
    pub angles: [&'static str; 4],
}

pub const SINGLE_VARIATION: VariationGuide = VariationGuide {
    lead: "This product is posted several times. Use a different angle and selling point from earlier posts.",
    angles: [
        "product features",
        "how to use / texture",
        "ingredient commitments",
        "review-style first-hand impression",
    ],
};

pub const COLLECTION_VARIATION: VariationGuide = VariationGuide {
    lead: "This combination is posted several times. Use a different angle from earlier posts.",
    angles: [
        "line-up introduction",
        "order of use / routine",
        "how the products complement each other",
        "morning vs. evening use",
    ],
};

pub const BRAND_VARIATION: VariationGuide = VariationGuide {
    lead: "This is another brand concept post. Use a different angle from earlier posts.",
    angles: [
        "brand story",
        "development commitments",
        "message to customers",
        "the brand's future",
    ],
};

impl VariationGuide {
    /// "1st → product features, 2nd → ..."
    pub fn examples(&self) -> String {
        self.angles
            .iter()
            .enumerate()
            .map(|(i, angle)| format!("{} → {angle}", ordinal(i as u32 + 1)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
