//! Product page fetching and HTML → text extraction.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use tracing::debug;

use crate::content::text::normalize_source_text;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Elements whose content is page chrome rather than product information.
const STRIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside",
];

/// How far into the body a `<meta charset>` declaration is looked for.
const CHARSET_PRESCAN_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Resolves a URL to extracted page text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(FETCH_TIMEOUT)
                .build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        let html = decode_html(&body, content_type.as_deref());
        let text = html_to_text(&html);
        debug!("Fetched {url}: {} chars of text", text.chars().count());
        Ok(text)
    }
}

fn meta_charset() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<meta\b[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9_:.\-]+)"#)
            .expect("valid regex")
    })
}

/// `charset` parameter of a Content-Type header value.
fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Decodes a page body. A byte order mark wins, then the Content-Type charset,
/// then a `<meta>` declaration near the top of the document, then UTF-8.
pub fn decode_html(body: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            let head = String::from_utf8_lossy(&body[..body.len().min(CHARSET_PRESCAN_BYTES)]);
            meta_charset()
                .captures(&head)
                .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
        });
    let (text, encoding, had_errors) = declared.unwrap_or(UTF_8).decode(body);
    if had_errors {
        debug!("Page body had malformed {} sequences", encoding.name());
    }
    text.into_owned()
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn main_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("main"))
}

fn body_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("body"))
}

fn is_stripped(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| STRIPPED_ELEMENTS.contains(&e.name()))
}

/// Extracts readable text: drops page chrome, prefers `<main>` over `<body>`,
/// and puts every text node on its own trimmed line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let scope: ElementRef<'_> = document
        .select(main_selector())
        .next()
        .or_else(|| document.select(body_selector()).next())
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for node in scope.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        if node.ancestors().any(|a| is_stripped(a.value())) {
            continue;
        }
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    normalize_source_text(&lines.join("\n"))
}
