//! Wikipedia document source backed by the MediaWiki action API.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

use newsroom_core::config::SourceSettings;
use newsroom_core::traits::DocumentSource;
use newsroom_core::{Error, ProviderError, ProviderErrorCode, Result, SourceDocument};
use newsroom_embed::http;

/// Searches Wikipedia for the topic and returns the plain-text extracts of up
/// to `max_pages` results. Pages that fail to load are skipped, as are hits
/// that redirect to a page already returned.
pub struct WikipediaSource {
    client: Client,
    api: String,
    max_pages: usize,
}

impl WikipediaSource {
    pub fn new(api: &str, max_pages: usize, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(ProviderError::new(ProviderErrorCode::Config, e.to_string())))?;
        Ok(Self { client, api: api.to_string(), max_pages })
    }

    pub fn from_settings(settings: &SourceSettings) -> Result<Self> {
        Self::new(
            &settings.wikipedia_api,
            settings.max_pages,
            &settings.user_agent,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn search(&self, topic: &str) -> Result<Vec<String>> {
        let limit = self.max_pages.to_string();
        let body = self.get(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", topic),
            ("srlimit", limit.as_str()),
            ("format", "json"),
        ])?;
        parse_search(&body)
    }

    pub fn page(&self, title: &str) -> Result<Option<SourceDocument>> {
        let body = self.get(&[
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
        ])?;
        parse_extract(&body)
    }

    fn get(&self, params: &[(&str, &str)]) -> Result<String> {
        let url = Url::parse_with_params(&self.api, params)
            .map_err(|e| Error::InvalidConfig(format!("bad wikipedia_api url '{}': {}", self.api, e)))?;
        let resp = self.client.get(url).send().map_err(|e| Error::Provider(http::transport_error(&e)))?;
        let status = resp.status();
        let text = resp.text().map_err(|e| Error::Provider(http::transport_error(&e)))?;
        if !status.is_success() {
            return Err(Error::Provider(http::status_error(status, &text)));
        }
        Ok(text)
    }
}

impl DocumentSource for WikipediaSource {
    fn documents(&self, topic: &str) -> Result<Vec<SourceDocument>> {
        let titles = self.search(topic)?;
        info!(topic, results = titles.len(), "wikipedia search");
        let mut docs: Vec<SourceDocument> = Vec::with_capacity(titles.len());
        for title in titles.iter().take(self.max_pages) {
            match self.page(title) {
                Ok(Some(doc)) if docs.iter().any(|d| d.source_id == doc.source_id) => {
                    warn!(title = %title, page = %doc.source_id, "search hit redirects to a page already fetched, skipping")
                }
                Ok(Some(doc)) => docs.push(doc),
                Ok(None) => warn!(title = %title, "wikipedia page has no text, skipping"),
                Err(e) => warn!(title = %title, error = %e, "failed to fetch wikipedia page, skipping"),
            }
        }
        info!(topic, pages = docs.len(), "wikipedia pages fetched");
        Ok(docs)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    title: String,
    extract: Option<String>,
}

/// Result titles of a `list=search` response, in rank order.
pub fn parse_search(body: &str) -> Result<Vec<String>> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| Error::Provider(ProviderError::invalid_response(format!("wikipedia search: {}", e))))?;
    Ok(parsed.query.search.into_iter().map(|h| h.title).collect())
}

/// The first page with non-blank text in a `prop=extracts` response.
pub fn parse_extract(body: &str) -> Result<Option<SourceDocument>> {
    let parsed: ExtractResponse = serde_json::from_str(body)
        .map_err(|e| Error::Provider(ProviderError::invalid_response(format!("wikipedia extract: {}", e))))?;
    Ok(parsed.query.pages.into_values().find_map(|page| match page.extract {
        Some(text) if !text.trim().is_empty() => Some(SourceDocument::new(format!("wikipedia:{}", page.title), text)),
        _ => None,
    }))
}
