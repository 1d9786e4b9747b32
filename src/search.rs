use crate::articles::ArticleStore;
use crate::client::NewsSource;
use crate::policy::AccessPolicy;
use crate::registry::{self, SearchRegistry};
use crate::types::{
    Error, KeywordSearch, Result, SearchOutcome, User, RECENT_SEARCH_WINDOW_MINUTES,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Orchestrates a new keyword search: policy gate, recency check,
/// provider call, then replace-or-create persistence.
pub struct SearchCoordinator {
    policy: AccessPolicy,
    registry: SearchRegistry,
    articles: ArticleStore,
    source: Arc<dyn NewsSource>,
}

impl SearchCoordinator {
    pub fn new(
        policy: AccessPolicy,
        registry: SearchRegistry,
        articles: ArticleStore,
        source: Arc<dyn NewsSource>,
    ) -> Self {
        Self {
            policy,
            registry,
            articles,
            source,
        }
    }

    pub async fn search(
        &self,
        user: &User,
        keyword: &str,
        force_refresh: bool,
    ) -> Result<SearchOutcome> {
        let allowance = self.policy.can_search(user).await?;
        let keyword = registry::normalize_keyword(keyword)?;

        let window = Duration::minutes(RECENT_SEARCH_WINDOW_MINUTES);
        if let Some(recent) = self.registry.find_recent(user.id, &keyword, window).await? {
            if !force_refresh {
                debug!(
                    "serving recent search for '{}' from {}",
                    keyword, recent.searched_at
                );
                let articles = self.articles.list_for_search(recent.id).await?;
                return Ok(SearchOutcome::NeedsConfirmation {
                    search: recent,
                    articles,
                });
            }
        }

        // The provider call comes before any write: a failure here must
        // leave the previously stored articles untouched.
        let fetched = self.source.fetch(&keyword, None).await.map_err(Error::Client)?;

        let search = self.upsert_search(user.id, &keyword).await?;

        let mut saved = Vec::with_capacity(fetched.len());
        for record in &fetched {
            match self.articles.insert(search.id, record).await {
                Ok(article) => saved.push(article),
                Err(e) => warn!("failed to save article '{}': {}", record.title, e),
            }
        }

        info!(
            "search for '{}' fetched {} articles, saved {}",
            keyword,
            fetched.len(),
            saved.len()
        );
        Ok(SearchOutcome::Fetched {
            search,
            articles: saved,
            remaining_quota: allowance.remaining_quota,
        })
    }

    /// Re-searching an existing keyword replaces its article set wholesale;
    /// a first search creates the record.
    async fn upsert_search(&self, user_id: Uuid, keyword: &str) -> Result<KeywordSearch> {
        match self.registry.find_by_keyword(user_id, keyword).await? {
            Some(mut existing) => {
                let now = Utc::now();
                self.registry.touch_searched_at(existing.id, now).await?;
                let dropped = self.articles.delete_for_search(existing.id).await?;
                debug!("cleared {} prior results for '{}' before replace", dropped, keyword);
                existing.searched_at = now;
                Ok(existing)
            }
            None => self.registry.create(user_id, keyword).await,
        }
    }
}
