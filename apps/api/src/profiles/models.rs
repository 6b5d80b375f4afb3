use serde::{Deserialize, Serialize};

/// Client-level voice and formatting rules applied to every caption.
///
/// Stored as one JSON document per client. Missing fields fall back to the defaults,
/// so profiles saved by older versions still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneProfile {
    /// Display name in the client list.
    pub name: String,
    pub brand_name: String,
    /// Site the brand concept was summarised from.
    pub brand_site_url: String,
    pub brand_concept: String,
    /// Hashtag that must appear on every post.
    pub hashtag_fixed: String,
    pub hashtag_limit: u8,
    /// Footer appended verbatim to every caption.
    pub template: String,
    pub tone_instructions: String,
    /// Previously approved captions, used as a style reference.
    pub sample_captions: String,
    /// Compliance and wording cautions.
    pub notes: String,
}

impl Default for ToneProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            brand_name: String::new(),
            brand_site_url: String::new(),
            brand_concept: String::new(),
            hashtag_fixed: "#skincarecommunity".to_string(),
            hashtag_limit: 5,
            template: [
                "-———— -———— -————",
                "",
                "(Account details go here)",
                "@account_name",
                "",
                "Introduce the brand here.",
                "",
                "See the official site via the link in our profile",
                "for details on each product ☑️",
                "",
                "-———— -———— -————",
            ]
            .join("\n"),
            tone_instructions: [
                "- Open with a bracketed headline like 【Headline✨】",
                "- Name the product before describing it",
                "- Break lines short for Instagram (about 15–20 characters)",
                "- Use polite language",
                "- End each positive feature with ◎",
                "- Use half-width asterisks for footnotes (*1, *2)",
            ]
            .join("\n"),
            sample_captions: String::new(),
            notes: [
                "- Only use expressions that appear on the product page",
                "- Avoid asserting efficacy",
                "- Keep wording concise and based on the product page text",
            ]
            .join("\n"),
        }
    }
}

impl ToneProfile {
    /// Label used in export file names.
    pub fn display_label<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.name.trim().is_empty() {
            fallback
        } else {
            self.name.trim()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_profile_fills_defaults() {
        let profile: ToneProfile =
            serde_json::from_value(serde_json::json!({"name": "Tout Vert", "brand_name": "toutvert"}))
                .unwrap();
        assert_eq!(profile.brand_name, "toutvert");
        assert_eq!(profile.hashtag_limit, 5);
        assert!(profile.template.contains("@account_name"));
    }

    #[test]
    fn test_display_label_falls_back_to_id() {
        let profile = ToneProfile::default();
        assert_eq!(profile.display_label("client_a"), "client_a");
    }
}
