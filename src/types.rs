use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minutes a prior search stays "recent" enough to be served from the store.
pub const RECENT_SEARCH_WINDOW_MINUTES: i64 = 15;
/// Minimum minutes between targeted refreshes of the same keyword search.
pub const REFRESH_COOLDOWN_MINUTES: i64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Staff and superusers bypass quota and block checks entirely.
    pub fn is_privileged(&self) -> bool {
        self.is_superuser || self.is_staff
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub keyword_quota: i32,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSearch {
    pub id: Uuid,
    pub user_id: Uuid,
    pub keyword: String,
    pub searched_at: DateTime<Utc>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: Uuid,
    pub keyword_search_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// One normalized article as returned by the news provider client.
/// Timestamps are parsed inside the client; coordinators never see the
/// provider's string formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct NewsApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub user_agent: String,
    /// Optional provider-side language filter for queries.
    pub query_language: Option<String>,
    /// Language recorded for articles the provider returns without one.
    pub default_language: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            api_key: String::new(),
            user_agent: "newswatch/0.1".to_string(),
            query_language: None,
            default_language: "en".to_string(),
            page_size: 100,
            timeout_seconds: 10,
            max_retries: 3,
            retry_delay_seconds: 2,
        }
    }
}

/// Result of the quota/block policy check. `remaining_quota` is `None` for
/// privileged users, for whom quotas are undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchAllowance {
    pub remaining_quota: Option<i64>,
}

#[derive(Debug)]
pub enum SearchOutcome {
    /// Fresh results were fetched and persisted.
    Fetched {
        search: KeywordSearch,
        articles: Vec<NewsArticle>,
        remaining_quota: Option<i64>,
    },
    /// The keyword was searched within the recency window; the stored
    /// results are returned and nothing was written or fetched.
    NeedsConfirmation {
        search: KeywordSearch,
        articles: Vec<NewsArticle>,
    },
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Refreshed { new_articles: usize },
    /// Still inside the cooldown window; no provider call was made.
    RateLimited { next_allowed_at: DateTime<Utc> },
}

#[derive(Debug, Default, Clone)]
pub struct BatchOutcome {
    pub keywords_total: usize,
    pub keywords_failed: usize,
    pub articles_added: usize,
}

#[derive(Debug, Default, Clone)]
pub struct HistoryFilter {
    /// Calendar day of `published_at`.
    pub date: Option<chrono::NaiveDate>,
    /// Case-insensitive substring of `source_name`.
    pub source: Option<String>,
    /// Exact language code.
    pub language: Option<String>,
}

#[derive(Debug)]
pub struct HistoryEntry {
    pub search: KeywordSearch,
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug)]
pub struct SearchHistory {
    pub entries: Vec<HistoryEntry>,
    /// Distinct source names across all of the caller's articles.
    pub sources: Vec<String>,
    /// Distinct language codes across all of the caller's articles.
    pub languages: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("news provider request timed out")]
    Timeout,

    #[error("news provider returned HTTP {status}")]
    BadStatus { status: u16 },

    #[error("news provider error {code}: {message}")]
    Api { code: String, message: String },

    #[error("news provider payload could not be decoded: {0}")]
    BadPayload(String),

    #[error("news provider request failed: {0}")]
    Http(reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("user is blocked from searching")]
    Blocked,

    #[error("keyword quota reached ({quota})")]
    QuotaExceeded { quota: i32 },

    #[error("no profile found for user {user_id}")]
    ProfileNotFound { user_id: Uuid },

    #[error("user {id} not found")]
    UserNotFound { id: Uuid },

    #[error("keyword search {id} not found")]
    SearchNotFound { id: Uuid },

    #[error("keyword must be 1 to 255 characters after trimming")]
    InvalidKeyword,

    #[error("news client error: {0}")]
    Client(#[from] ClientError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
