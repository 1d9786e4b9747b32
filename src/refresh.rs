use crate::articles::ArticleStore;
use crate::client::NewsSource;
use crate::registry::SearchRegistry;
use crate::types::{Error, RefreshOutcome, Result, User, REFRESH_COOLDOWN_MINUTES};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Targeted refresh of one existing keyword search: cooldown gate, fetch
/// only newer articles, merge without duplicates.
pub struct RefreshCoordinator {
    registry: SearchRegistry,
    articles: ArticleStore,
    source: Arc<dyn NewsSource>,
}

impl RefreshCoordinator {
    pub fn new(
        registry: SearchRegistry,
        articles: ArticleStore,
        source: Arc<dyn NewsSource>,
    ) -> Self {
        Self {
            registry,
            articles,
            source,
        }
    }

    pub async fn refresh(&self, user: &User, search_id: Uuid) -> Result<RefreshOutcome> {
        let search = self
            .registry
            .get_owned(search_id, user.id)
            .await?
            .ok_or(Error::SearchNotFound { id: search_id })?;

        if let Some(last) = search.last_refreshed {
            let cooldown = Duration::minutes(REFRESH_COOLDOWN_MINUTES);
            if Utc::now() - last < cooldown {
                debug!(
                    "refresh of '{}' inside cooldown window (last refreshed {})",
                    search.keyword, last
                );
                return Ok(RefreshOutcome::RateLimited {
                    next_allowed_at: last + cooldown,
                });
            }
        }

        // Lower bound for the provider; it may still return older articles,
        // so the per-search dedup below stays authoritative.
        let from = self.articles.latest_published(search.id).await?;

        let fetched = self
            .source
            .fetch(&search.keyword, from)
            .await
            .map_err(Error::Client)?;

        let mut new_articles = 0;
        for record in &fetched {
            match self.articles.insert_new(search.id, record).await {
                Ok(true) => new_articles += 1,
                Ok(false) => {}
                Err(e) => warn!("failed to save refreshed article '{}': {}", record.title, e),
            }
        }

        // Updated even when nothing new arrived, so the cooldown always
        // starts from the last successful provider call.
        self.registry.set_last_refreshed(search.id, Utc::now()).await?;

        info!(
            "refresh of '{}' fetched {} articles, {} new",
            search.keyword,
            fetched.len(),
            new_articles
        );
        Ok(RefreshOutcome::Refreshed { new_articles })
    }
}
