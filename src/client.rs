use crate::types::{ArticleRecord, ClientError, NewsApiConfig};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Seam to the external news provider. Implementations must distinguish
/// "no results" (an empty Ok) from "the call failed" (an Err).
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch articles matching `keyword`, optionally only those published
    /// at or after `from`. The provider may ignore the lower bound, so
    /// callers still have to deduplicate.
    async fn fetch(
        &self,
        keyword: &str,
        from: Option<DateTime<Utc>>,
    ) -> std::result::Result<Vec<ArticleRecord>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(rename = "totalResults")]
    total_results: Option<u32>,
    articles: Option<Vec<RawArticle>>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Decode a provider response body into normalized records. Articles
/// missing a title, url, or parseable timestamp are dropped with a warning
/// rather than failing the whole batch.
pub fn decode_everything(
    body: &str,
    default_language: &str,
) -> std::result::Result<Vec<ArticleRecord>, ClientError> {
    let response: EverythingResponse =
        serde_json::from_str(body).map_err(|e| ClientError::BadPayload(e.to_string()))?;

    if response.status != "ok" {
        return Err(ClientError::Api {
            code: response.code.unwrap_or_else(|| "unknown".to_string()),
            message: response.message.unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    let raw = response.articles.unwrap_or_default();
    let mut records = Vec::with_capacity(raw.len());
    for article in raw {
        match normalize_article(article, default_language) {
            Some(record) => records.push(record),
            None => warn!("dropping provider article with missing or invalid fields"),
        }
    }

    debug!(
        "decoded provider response: {:?} total results, {} usable",
        response.total_results,
        records.len()
    );
    Ok(records)
}

fn normalize_article(raw: RawArticle, default_language: &str) -> Option<ArticleRecord> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let url = raw.url.filter(|u| is_valid_article_url(u))?;
    let published_at = DateTime::parse_from_rfc3339(raw.published_at.as_deref()?)
        .ok()?
        .with_timezone(&Utc);

    Some(ArticleRecord {
        title,
        description: raw.description.filter(|d| !d.is_empty()),
        url,
        published_at,
        source_name: raw
            .source
            .and_then(|s| s.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        language: raw.language.unwrap_or_else(|| default_language.to_string()),
    })
}

fn is_valid_article_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}

/// HTTP client for a NewsAPI-style `/everything` endpoint.
pub struct NewsApiClient {
    client: Client,
    config: NewsApiConfig,
}

impl NewsApiClient {
    pub fn new(config: NewsApiConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn query_params(&self, keyword: &str, from: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = vec![
            ("q", keyword.to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", self.config.page_size.to_string()),
        ];
        if let Some(language) = &self.config.query_language {
            params.push(("language", language.clone()));
        }
        if let Some(from) = from {
            params.push(("from", from.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
        }
        params.push(("apiKey", self.config.api_key.clone()));
        params
    }

    async fn fetch_once(
        &self,
        keyword: &str,
        from: Option<DateTime<Utc>>,
    ) -> std::result::Result<Vec<ArticleRecord>, ClientError> {
        let url = format!("{}/everything", self.config.base_url);
        let params = self.query_params(keyword, from);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        decode_everything(&body, &self.config.default_language)
    }
}

fn map_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(e)
    }
}

fn is_retryable(e: &ClientError) -> bool {
    matches!(
        e,
        ClientError::Timeout
            | ClientError::Http(_)
            | ClientError::BadStatus { status: 500..=599 }
    )
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch(
        &self,
        keyword: &str,
        from: Option<DateTime<Utc>>,
    ) -> std::result::Result<Vec<ArticleRecord>, ClientError> {
        debug!("querying news provider for '{}' (from: {:?})", keyword, from);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 16),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(keyword, from).await {
                Ok(records) => {
                    info!("fetched {} articles for '{}'", records.len(), keyword);
                    return Ok(records);
                }
                Err(e) if is_retryable(&e) && attempt < self.config.max_retries => {
                    if let Some(delay) = backoff.next_backoff() {
                        warn!(
                            "attempt {} for '{}' failed: {}; retrying in {:?}",
                            attempt + 1,
                            keyword,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        last_error = Some(e);
                        continue;
                    }
                    last_error = Some(e);
                    break;
                }
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        let e = last_error.unwrap_or(ClientError::Timeout);
        error!("news provider call for '{}' failed: {}", keyword, e);
        Err(e)
    }
}
