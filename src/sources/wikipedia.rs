//! MediaWiki source: a random catalog of article titles, then one plain-text
//! extract per article.
//!
//! The catalog is fetched once when the source is opened. An empty catalog
//! is fatal since there is nothing to iterate. Each article fetch waits
//! `request_delay_ms` after the previous request and is bounded by
//! `request_timeout_secs`.

use super::{DocumentSource, RemoteDocument};
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, RecordError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// The API caps anonymous `list=random` requests at this many titles.
const CATALOG_PAGE_MAX: usize = 500;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
}

#[derive(Deserialize)]
struct CatalogResponse {
    query: Option<CatalogQuery>,
}

#[derive(Deserialize)]
struct CatalogQuery {
    #[serde(default)]
    random: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    pageid: Option<u64>,
    title: Option<String>,
    extract: Option<String>,
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
    lang: Option<String>,
    touched: Option<String>,
}

pub struct WikipediaSource {
    id: String,
    api_url: String,
    client: reqwest::blocking::Client,
    catalog: VecDeque<CatalogEntry>,
    delay: Duration,
    ordinal: usize,
}

impl WikipediaSource {
    /// Open `https://{lang}.wikipedia.org` and fetch `count` random titles.
    pub fn open(lang: &str, count: usize, config: &ExtractionConfig) -> Result<Self, ExtractError> {
        if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ExtractError::InvalidSource {
                input: format!("wikipedia:{lang}"),
                reason: "expected a language code such as 'en'".into(),
            });
        }
        let api_url = format!("https://{lang}.wikipedia.org/w/api.php");
        Self::with_endpoint(format!("wikipedia:{lang}"), api_url, count, config)
    }

    /// Open against an arbitrary MediaWiki `api.php` endpoint.
    pub fn with_endpoint(
        id: String,
        api_url: String,
        count: usize,
        config: &ExtractionConfig,
    ) -> Result<Self, ExtractError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ExtractError::DownloadFailed {
                url: api_url.clone(),
                reason: e.to_string(),
            })?;

        let catalog = fetch_catalog(&client, &api_url, count.min(CATALOG_PAGE_MAX), config)?;
        if catalog.is_empty() {
            return Err(ExtractError::EmptyCatalog { source_id: id });
        }
        info!("Catalog '{}' returned {} titles", id, catalog.len());

        Ok(Self {
            id,
            api_url,
            client,
            catalog: catalog.into(),
            delay: Duration::from_millis(config.request_delay_ms),
            ordinal: 0,
        })
    }

    fn fetch_page(&self, entry: &CatalogEntry) -> Result<RemoteDocument, String> {
        let pageid = entry.id.to_string();
        let response: PageResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts|info"),
                ("inprop", "url"),
                ("explaintext", "1"),
                ("pageids", pageid.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| e.to_string())?;

        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| format!("no page returned for '{}'", entry.title))?;
        if page.missing {
            return Err(format!("page '{}' no longer exists", entry.title));
        }
        Ok(page_to_document(page, entry))
    }
}

fn fetch_catalog(
    client: &reqwest::blocking::Client,
    api_url: &str,
    count: usize,
    config: &ExtractionConfig,
) -> Result<Vec<CatalogEntry>, ExtractError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let limit = count.to_string();
    let response = client
        .get(api_url)
        .query(&[
            ("action", "query"),
            ("list", "random"),
            ("rnnamespace", "0"),
            ("rnlimit", limit.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
        ])
        .send()
        .map_err(|e| {
            if e.is_timeout() {
                ExtractError::DownloadTimeout {
                    url: api_url.to_string(),
                    secs: config.request_timeout_secs,
                }
            } else {
                ExtractError::DownloadFailed {
                    url: api_url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

    let failed = |reason: String| ExtractError::DownloadFailed {
        url: api_url.to_string(),
        reason,
    };
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }
    let body: CatalogResponse = response.json().map_err(|e| failed(e.to_string()))?;
    Ok(body.query.map(|q| q.random).unwrap_or_default())
}

fn page_to_document(page: Page, entry: &CatalogEntry) -> RemoteDocument {
    let mut attributes = Map::new();
    if let Some(lang) = page.lang {
        attributes.insert("lang".into(), Value::String(lang));
    }
    if let Some(touched) = page.touched {
        attributes.insert("touched".into(), Value::String(touched));
    }
    RemoteDocument {
        doc_id: Some(page.pageid.unwrap_or(entry.id).to_string()),
        title: page.title.or_else(|| Some(entry.title.clone())),
        text: page.extract,
        body: None,
        url: page.fullurl,
        attributes,
    }
}

impl DocumentSource for WikipediaSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_document(&mut self) -> Option<Result<RemoteDocument, RecordError>> {
        let entry = self.catalog.pop_front()?;
        if self.ordinal > 0 && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.ordinal += 1;
        debug!("Fetching page {} ('{}')", entry.id, entry.title);
        Some(
            self.fetch_page(&entry)
                .map_err(|detail| RecordError::FetchFailed {
                    ordinal: self.ordinal,
                    detail,
                }),
        )
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.catalog.len())
    }

    fn peek_doc_id(&self) -> Option<String> {
        self.catalog.front().map(|entry| entry.id.to_string())
    }

    fn skip_document(&mut self) -> bool {
        match self.catalog.pop_front() {
            Some(entry) => {
                debug!("Not fetching page {} ('{}'): already rendered", entry.id, entry.title);
                true
            }
            None => false,
        }
    }
}
