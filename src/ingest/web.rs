//! Web page adapter.
//!
//! Fetches a page with reqwest and extracts readable text with `scraper`.

use super::models::{ContentMetadata, ContentPackage, SourceType};
use super::segment::{collapse_whitespace, segment_text};
use crate::config::IngestionSettings;
use crate::error::{PodsmithError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Candidate containers for the main content, in priority order.
const MAIN_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=main]",
    ".content",
    "#content",
    ".post-content",
    ".article-content",
    ".entry-content",
];

/// A fetched HTML document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects.
    pub final_url: String,
    pub html: String,
}

/// Fetches raw HTML for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// reqwest-backed page fetcher with a browser user agent.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(settings: &IngestionSettings) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .build()
            .map_err(|e| PodsmithError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PodsmithError::Ingestion(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PodsmithError::Ingestion(format!("HTTP {} for {}", status, url)));
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| PodsmithError::Ingestion(format!("Failed to read {}: {}", url, e)))?;

        Ok(FetchedPage { final_url, html })
    }
}

/// Adapter turning a web page into a [`ContentPackage`].
pub struct WebAdapter {
    fetcher: Arc<dyn PageFetcher>,
    max_block_chars: usize,
}

impl WebAdapter {
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_block_chars: usize) -> Self {
        Self {
            fetcher,
            max_block_chars,
        }
    }

    pub async fn normalize(&self, url: &Url) -> Result<ContentPackage> {
        info!("Fetching web page: {}", url);
        let page = self.fetcher.fetch(url).await?;
        Ok(parse_page(&page.html, &page.final_url, self.max_block_chars))
    }
}

/// Extract metadata and text blocks from an HTML document.
pub fn parse_page(html: &str, final_url: &str, max_block_chars: usize) -> ContentPackage {
    let document = Html::parse_document(html);

    let title = select_text(&document, "title").or_else(|| meta_content(&document, "og:title"));
    let mut metadata = ContentMetadata::default()
        .with_title(title.as_deref())
        .with_author(meta_content(&document, "author").as_deref())
        .with_published(meta_content(&document, "article:published_time").as_deref());
    metadata.source_url = Some(final_url.to_string());
    metadata.language = html_lang(&document);

    for name in ["description", "author", "article:published_time", "og:site_name", "og:description"] {
        if let Some(value) = meta_content(&document, name) {
            metadata.insert_extra(name, value);
        }
    }

    let container = main_container(&document);
    let blocks = match container {
        Some(el) => collect_blocks(el, max_block_chars),
        None => Vec::new(),
    };

    debug!(url = final_url, blocks = blocks.len(), "Parsed web page");

    ContentPackage::new(SourceType::Web, blocks, metadata, vec![final_url.to_string()])
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Content of `<meta name=...>` or `<meta property=...>`.
fn meta_content(document: &Html, name: &str) -> Option<String> {
    let css = format!(r#"meta[name="{0}"], meta[property="{0}"]"#, name);
    let selector = Selector::parse(&css).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

fn html_lang(document: &Html) -> Option<String> {
    let selector = Selector::parse("html").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("lang"))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

fn main_container(document: &Html) -> Option<ElementRef<'_>> {
    for selector_str in MAIN_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(el) = document.select(&selector).next() {
                return Some(el);
            }
        }
    }

    if let Ok(body) = Selector::parse("body") {
        return document.select(&body).next();
    }
    None
}

/// Headings and paragraphs in document order; whole-container text when there are no paragraphs.
/// Paragraphs longer than `max_block_chars` are regrouped from their sentences.
fn collect_blocks(container: ElementRef<'_>, max_block_chars: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6, p") else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    let mut paragraphs = 0;

    for el in container.select(&selector) {
        let text = collapse_whitespace(&el.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        if el.value().name() == "p" {
            paragraphs += 1;
            if text.chars().count() > max_block_chars {
                blocks.extend(segment_text(&text, max_block_chars));
            } else {
                blocks.push(text);
            }
        } else {
            blocks.push(format!("Heading: {}", text));
        }
    }

    if paragraphs == 0 {
        let text = container.text().collect::<Vec<_>>().join("\n");
        return segment_text(&text, max_block_chars);
    }

    blocks
}
