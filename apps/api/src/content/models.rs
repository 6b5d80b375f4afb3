//! Content items: the declared units a run turns into posts.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

fn one() -> u32 {
    1
}

/// Where a single product's information comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductSource {
    Url { url: String },
    /// Text already extracted from an uploaded release document.
    Document { file_name: String, text: String },
}

/// Where a group shot's product information comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollectionSource {
    Urls { urls: Vec<String> },
    /// Combined text of one or more uploaded documents.
    Documents { file_names: Vec<String>, text: String },
}

/// One declared content unit. Immutable once a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Single {
        source: ProductSource,
        /// Required when the source is a document (there is no page title to fall back on).
        #[serde(default)]
        product_name: Option<String>,
        #[serde(default = "one")]
        repeat_count: u32,
    },
    Collection {
        source: CollectionSource,
        /// What the photo shows / which angle to take.
        #[serde(default)]
        note: Option<String>,
        #[serde(default = "one")]
        repeat_count: u32,
    },
    BrandConcept {
        #[serde(default)]
        angle: Option<String>,
        #[serde(default = "one")]
        repeat_count: u32,
    },
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ContentItem {
    pub fn repeat_count(&self) -> u32 {
        match self {
            ContentItem::Single { repeat_count, .. }
            | ContentItem::Collection { repeat_count, .. }
            | ContentItem::BrandConcept { repeat_count, .. } => *repeat_count,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ContentItem::Single { .. } => "Single product",
            ContentItem::Collection { .. } => "Group shot",
            ContentItem::BrandConcept { .. } => "Brand concept",
        }
    }

    /// Identity of the logical item, used to count variations.
    /// Two items with the same source are the same item even if declared twice.
    pub fn identity_key(&self) -> String {
        match self {
            ContentItem::Single { source, .. } => match source {
                ProductSource::Url { url } => format!("single:{}", url.trim()),
                ProductSource::Document { file_name, .. } => format!("single:file:{file_name}"),
            },
            ContentItem::Collection { source, .. } => match source {
                CollectionSource::Urls { .. } => {
                    format!("collection:{}", self.page_urls().join("\n"))
                }
                CollectionSource::Documents { file_names, .. } => {
                    format!("collection:file:{}", file_names.join(", "))
                }
            },
            ContentItem::BrandConcept { angle, .. } => {
                format!("brand:{}", non_empty(angle).unwrap_or_default())
            }
        }
    }

    /// URLs whose page text must be fetched before generation. Document-sourced items have none.
    pub fn page_urls(&self) -> Vec<&str> {
        match self {
            ContentItem::Single {
                source: ProductSource::Url { url },
                ..
            } => {
                let url = url.trim();
                if url.is_empty() {
                    vec![]
                } else {
                    vec![url]
                }
            }
            ContentItem::Collection {
                source: CollectionSource::Urls { urls },
                ..
            } => urls
                .iter()
                .map(|u| u.trim())
                .filter(|u| !u.is_empty())
                .collect(),
            _ => vec![],
        }
    }

    /// URL shown next to the post in the report.
    pub fn display_url(&self) -> Option<String> {
        self.page_urls().first().map(|u| u.to_string())
    }

    /// Human-facing name of the post. URL singles use the first non-empty line
    /// of the fetched page, so the page text is passed in.
    pub fn display_name(&self, page_text: Option<&str>) -> String {
        match self {
            ContentItem::Single {
                source: ProductSource::Url { .. },
                ..
            } => page_text
                .and_then(|text| text.lines().map(str::trim).find(|l| !l.is_empty()))
                .map(|line| line.chars().take(50).collect())
                .unwrap_or_else(|| "Unknown product".to_string()),
            ContentItem::Single {
                source: ProductSource::Document { file_name, .. },
                product_name,
                ..
            } => non_empty(product_name)
                .map(str::to_string)
                .or_else(|| Some(file_name.clone()).filter(|f| !f.is_empty()))
                .unwrap_or_else(|| "New product".to_string()),
            ContentItem::Collection { note, .. } => non_empty(note)
                .map(str::to_string)
                .unwrap_or_else(|| "Group shot".to_string()),
            ContentItem::BrandConcept { angle, .. } => non_empty(angle)
                .map(str::to_string)
                .unwrap_or_else(|| "Brand concept".to_string()),
        }
    }

    /// Checks the item carries everything generation needs.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.repeat_count() == 0 {
            return Err(AppError::Validation(format!(
                "{} item must be posted at least once",
                self.kind_label()
            )));
        }
        match self {
            ContentItem::Single { source, product_name, .. } => match source {
                ProductSource::Url { url } if url.trim().is_empty() => Err(AppError::Validation(
                    "Single product item is missing its URL".to_string(),
                )),
                ProductSource::Document { text, file_name } => {
                    if text.trim().is_empty() {
                        return Err(AppError::Validation(format!(
                            "Document '{file_name}' has no extracted text"
                        )));
                    }
                    if non_empty(product_name).is_none() {
                        return Err(AppError::Validation(format!(
                            "Product name is required for document '{file_name}'"
                        )));
                    }
                    Ok(())
                }
                ProductSource::Url { .. } => Ok(()),
            },
            ContentItem::Collection { source, .. } => match source {
                CollectionSource::Urls { urls } if urls.iter().all(|u| u.trim().is_empty()) => Err(
                    AppError::Validation("Group shot item has no product URLs".to_string()),
                ),
                CollectionSource::Documents { text, .. } if text.trim().is_empty() => Err(
                    AppError::Validation("Group shot documents have no extracted text".to_string()),
                ),
                _ => Ok(()),
            },
            ContentItem::BrandConcept { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_single(url: &str) -> ContentItem {
        ContentItem::Single {
            source: ProductSource::Url {
                url: url.to_string(),
            },
            product_name: None,
            repeat_count: 1,
        }
    }

    #[test]
    fn test_deserializes_tagged_items_with_default_repeat() {
        let json = serde_json::json!([
            {"kind": "single", "source": {"type": "url", "url": "https://shop.example/serum"}},
            {"kind": "collection", "source": {"type": "urls", "urls": ["https://a", "https://b"]}, "note": "Morning set", "repeat_count": 2},
            {"kind": "brand_concept", "angle": "Founder story"}
        ]);
        let items: Vec<ContentItem> = serde_json::from_value(json).unwrap();
        assert_eq!(items[0].repeat_count(), 1);
        assert_eq!(items[1].repeat_count(), 2);
        assert!(matches!(items[2], ContentItem::BrandConcept { .. }));
    }

    #[test]
    fn test_identity_key_ignores_repeat_count() {
        let mut a = url_single("https://shop.example/serum");
        let b = url_single("https://shop.example/serum ");
        if let ContentItem::Single { repeat_count, .. } = &mut a {
            *repeat_count = 3;
        }
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_collection_identity_ignores_url_whitespace() {
        let collection = |urls: &[&str]| ContentItem::Collection {
            source: CollectionSource::Urls {
                urls: urls.iter().map(|u| u.to_string()).collect(),
            },
            note: None,
            repeat_count: 1,
        };
        let clean = collection(&["https://a", "https://b"]);
        let padded = collection(&[" https://a", "", "https://b\t"]);
        assert_eq!(clean.identity_key(), padded.identity_key());
        assert_ne!(clean.identity_key(), collection(&["https://a"]).identity_key());
    }

    #[test]
    fn test_page_urls_skip_blank_lines_and_documents() {
        let collection = ContentItem::Collection {
            source: CollectionSource::Urls {
                urls: vec!["https://a".into(), "  ".into(), " https://b ".into()],
            },
            note: None,
            repeat_count: 1,
        };
        assert_eq!(collection.page_urls(), vec!["https://a", "https://b"]);

        let document = ContentItem::Single {
            source: ProductSource::Document {
                file_name: "release.pdf".into(),
                text: "Serum".into(),
            },
            product_name: Some("Serum".into()),
            repeat_count: 1,
        };
        assert!(document.page_urls().is_empty());
        assert_eq!(document.display_url(), None);
    }

    #[test]
    fn test_display_name_uses_first_page_line() {
        let item = url_single("https://shop.example/serum");
        let long = "x".repeat(80);
        assert_eq!(item.display_name(Some("\n  Mineral Serum  \nmore")), "Mineral Serum");
        assert_eq!(item.display_name(Some(&long)).chars().count(), 50);
        assert_eq!(item.display_name(Some("")), "Unknown product");
    }

    #[test]
    fn test_document_single_requires_product_name() {
        let item = ContentItem::Single {
            source: ProductSource::Document {
                file_name: "release.pdf".into(),
                text: "New mineral sunscreen".into(),
            },
            product_name: Some("  ".into()),
            repeat_count: 1,
        };
        let err = item.validate().unwrap_err();
        assert!(err.to_string().contains("Product name is required"));
    }

    #[test]
    fn test_url_single_never_requires_product_name() {
        assert!(url_single("https://shop.example/serum").validate().is_ok());
        assert!(url_single("   ").validate().is_err());
    }

    #[test]
    fn test_zero_repeat_count_is_rejected() {
        let item = ContentItem::BrandConcept {
            angle: None,
            repeat_count: 0,
        };
        assert!(item.validate().is_err());
    }
}
