use crate::accounts::UserDirectory;
use crate::articles::ArticleStore;
use crate::batch::BatchRefresher;
use crate::client::{NewsApiClient, NewsSource};
use crate::history::HistoryService;
use crate::policy::AccessPolicy;
use crate::profiles::ProfileStore;
use crate::refresh::RefreshCoordinator;
use crate::registry::SearchRegistry;
use crate::search::SearchCoordinator;
use crate::types::{
    BatchOutcome, HistoryFilter, NewsApiConfig, RefreshOutcome, Result, SearchHistory,
    SearchOutcome, User,
};
use crate::db;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Front door wiring the stores, the policy, and the coordinators around
/// one connection pool and one news source.
pub struct NewsWatch {
    pool: PgPool,
    users: UserDirectory,
    profiles: ProfileStore,
    search: SearchCoordinator,
    refresh: RefreshCoordinator,
    batch: BatchRefresher,
    history: HistoryService,
}

impl NewsWatch {
    pub async fn connect(database_url: &str, config: NewsApiConfig) -> Result<Self> {
        let pool = db::connect(database_url).await?;
        Ok(Self::with_source(pool, Arc::new(NewsApiClient::new(config))))
    }

    /// Build against an arbitrary news source. Tests use this to swap in
    /// a scripted source.
    pub fn with_source(pool: PgPool, source: Arc<dyn NewsSource>) -> Self {
        let users = UserDirectory::new(pool.clone());
        let profiles = ProfileStore::new(pool.clone());
        let policy = AccessPolicy::new(
            ProfileStore::new(pool.clone()),
            SearchRegistry::new(pool.clone()),
        );
        let search = SearchCoordinator::new(
            policy,
            SearchRegistry::new(pool.clone()),
            ArticleStore::new(pool.clone()),
            source.clone(),
        );
        let refresh = RefreshCoordinator::new(
            SearchRegistry::new(pool.clone()),
            ArticleStore::new(pool.clone()),
            source.clone(),
        );
        let batch = BatchRefresher::new(
            SearchRegistry::new(pool.clone()),
            ArticleStore::new(pool.clone()),
            source,
        );
        let history = HistoryService::new(
            SearchRegistry::new(pool.clone()),
            ArticleStore::new(pool.clone()),
        );

        Self {
            pool,
            users,
            profiles,
            search,
            refresh,
            batch,
            history,
        }
    }

    pub async fn setup_schema(&self) -> Result<()> {
        db::setup_schema(&self.pool).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> Result<User> {
        self.users.create_user(username, is_staff, is_superuser).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.users.get(id).await
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        self.users.find_by_username(username).await
    }

    pub async fn set_quota(&self, user_id: Uuid, quota: i32) -> Result<()> {
        self.profiles.set_quota(user_id, quota).await
    }

    pub async fn set_blocked(&self, user_id: Uuid, blocked: bool) -> Result<()> {
        self.profiles.set_blocked(user_id, blocked).await
    }

    pub async fn search(
        &self,
        user: &User,
        keyword: &str,
        force_refresh: bool,
    ) -> Result<SearchOutcome> {
        self.search.search(user, keyword, force_refresh).await
    }

    pub async fn refresh(&self, user: &User, search_id: Uuid) -> Result<RefreshOutcome> {
        self.refresh.refresh(user, search_id).await
    }

    pub async fn history(&self, user: &User, filter: &HistoryFilter) -> Result<SearchHistory> {
        self.history.history(user, filter).await
    }

    pub async fn run_batch_refresh(&self) -> Result<BatchOutcome> {
        self.batch.run().await
    }
}
