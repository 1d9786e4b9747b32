use crate::articles::ArticleStore;
use crate::registry::SearchRegistry;
use crate::types::{HistoryEntry, HistoryFilter, Result, SearchHistory, User};
use tracing::debug;

/// Read-side view of a user's tracked keywords and their articles,
/// narrowed by optional date/source/language filters.
pub struct HistoryService {
    registry: SearchRegistry,
    articles: ArticleStore,
}

impl HistoryService {
    pub fn new(registry: SearchRegistry, articles: ArticleStore) -> Self {
        Self { registry, articles }
    }

    pub async fn history(&self, user: &User, filter: &HistoryFilter) -> Result<SearchHistory> {
        let searches = self.registry.list_for_user(user.id).await?;

        let mut entries = Vec::with_capacity(searches.len());
        for search in searches {
            let articles = self.articles.list_filtered(search.id, filter).await?;
            // Searches whose filtered subset is empty are left out of the
            // listing.
            if articles.is_empty() {
                continue;
            }
            entries.push(HistoryEntry { search, articles });
        }

        let sources = self.articles.distinct_sources(user.id).await?;
        let languages = self.articles.distinct_languages(user.id).await?;

        debug!(
            "built search history for {}: {} entries",
            user.username,
            entries.len()
        );
        Ok(SearchHistory {
            entries,
            sources,
            languages,
        })
    }
}
