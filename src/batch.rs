use crate::articles::ArticleStore;
use crate::client::NewsSource;
use crate::registry::SearchRegistry;
use crate::types::{BatchOutcome, Error, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// System-wide refresh cycle, driven by an external scheduler (hourly by
/// default). No user context and no per-user cooldown: one provider call
/// per distinct keyword, merged into every search tracking that keyword.
pub struct BatchRefresher {
    registry: SearchRegistry,
    articles: ArticleStore,
    source: Arc<dyn NewsSource>,
}

impl BatchRefresher {
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

    pub async fn run(&self) -> Result<BatchOutcome> {
        // A failure to resolve the keyword set aborts the whole job; one
        // keyword failing later does not.
        let keywords = self.registry.distinct_keywords().await?;
        info!("starting batch refresh of {} keywords", keywords.len());

        let mut outcome = BatchOutcome {
            keywords_total: keywords.len(),
            ..Default::default()
        };

        // Sequential on purpose: writes within one keyword must not race.
        for keyword in &keywords {
            match self.refresh_keyword(keyword).await {
                Ok(added) => outcome.articles_added += added,
                Err(e) => {
                    outcome.keywords_failed += 1;
                    error!("batch refresh failed for keyword '{}': {}", keyword, e);
                }
            }
        }

        info!(
            "batch refresh finished: {}/{} keywords succeeded, {} new articles",
            outcome.keywords_total - outcome.keywords_failed,
            outcome.keywords_total,
            outcome.articles_added
        );
        Ok(outcome)
    }

    async fn refresh_keyword(&self, keyword: &str) -> Result<usize> {
        let fetched = self.source.fetch(keyword, None).await.map_err(Error::Client)?;
        if fetched.is_empty() {
            return Ok(0);
        }

        let searches = self.registry.find_all_for_keyword(keyword).await?;
        let mut added = 0;
        for search in &searches {
            for record in &fetched {
                match self.articles.insert_new(search.id, record).await {
                    Ok(true) => added += 1,
                    Ok(false) => {}
                    Err(e) => warn!(
                        "failed to save article '{}' during batch refresh: {}",
                        record.title, e
                    ),
                }
            }
        }
        Ok(added)
    }
}
