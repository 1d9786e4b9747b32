use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use newswatch::{ArticleRecord, ClientError, NewsSource};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted stand-in for the news provider. Responses are served in the
/// order they were queued; an empty queue answers with an empty Ok so
/// incidental calls don't panic. Every call is recorded for assertions.
pub struct MockNewsSource {
    responses: Mutex<VecDeque<Result<Vec<ArticleRecord>, ClientError>>>,
    calls: Mutex<Vec<(String, Option<DateTime<Utc>>)>>,
}

impl MockNewsSource {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_ok(&self, articles: Vec<ArticleRecord>) {
        self.responses.lock().unwrap().push_back(Ok(articles));
    }

    pub fn push_err(&self, error: ClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<(String, Option<DateTime<Utc>>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    async fn fetch(
        &self,
        keyword: &str,
        from: Option<DateTime<Utc>>,
    ) -> Result<Vec<ArticleRecord>, ClientError> {
        self.calls.lock().unwrap().push((keyword.to_string(), from));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn article(title: &str, published_at: DateTime<Utc>) -> ArticleRecord {
    article_from(title, published_at, "BBC News", "en")
}

pub fn article_from(
    title: &str,
    published_at: DateTime<Utc>,
    source_name: &str,
    language: &str,
) -> ArticleRecord {
    ArticleRecord {
        title: title.to_string(),
        description: Some(format!("{} in depth", title)),
        url: format!(
            "https://example.com/{}",
            title.to_lowercase().replace(' ', "-")
        ),
        published_at,
        source_name: source_name.to_string(),
        language: language.to_string(),
    }
}
