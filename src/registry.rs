use crate::types::{Error, KeywordSearch, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

/// Trim a raw keyword and enforce the 1..=255 character bound. Case is
/// preserved; comparisons elsewhere are case-insensitive.
pub fn normalize_keyword(raw: &str) -> Result<String> {
    let keyword = raw.trim();
    let len = keyword.chars().count();
    if len == 0 || len > 255 {
        return Err(Error::InvalidKeyword);
    }
    Ok(keyword.to_string())
}

/// Persistence for `KeywordSearch` rows: one per (user, keyword) under
/// case-insensitive comparison.
pub struct SearchRegistry {
    pool: PgPool,
}

impl SearchRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM keyword_searches WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// The user's search for this keyword, if it happened within `window`
    /// of now. The window's lower bound is inclusive.
    pub async fn find_recent(
        &self,
        user_id: Uuid,
        keyword: &str,
        window: Duration,
    ) -> Result<Option<KeywordSearch>> {
        let cutoff = Utc::now() - window;
        let row = sqlx::query(
            "SELECT id, user_id, keyword, searched_at, last_refreshed \
             FROM keyword_searches \
             WHERE user_id = $1 AND LOWER(keyword) = LOWER($2) AND searched_at >= $3",
        )
        .bind(user_id)
        .bind(keyword)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_search(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_keyword(
        &self,
        user_id: Uuid,
        keyword: &str,
    ) -> Result<Option<KeywordSearch>> {
        let row = sqlx::query(
            "SELECT id, user_id, keyword, searched_at, last_refreshed \
             FROM keyword_searches \
             WHERE user_id = $1 AND LOWER(keyword) = LOWER($2)",
        )
        .bind(user_id)
        .bind(keyword)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_search(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, user_id: Uuid, keyword: &str) -> Result<KeywordSearch> {
        let search = KeywordSearch {
            id: Uuid::new_v4(),
            user_id,
            keyword: keyword.to_string(),
            searched_at: Utc::now(),
            last_refreshed: None,
        };

        sqlx::query(
            "INSERT INTO keyword_searches (id, user_id, keyword, searched_at, last_refreshed) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(search.id)
        .bind(search.user_id)
        .bind(&search.keyword)
        .bind(search.searched_at)
        .bind(search.last_refreshed)
        .execute(&self.pool)
        .await?;

        info!(
            "created keyword search '{}' with ID: {}",
            search.keyword, search.id
        );
        Ok(search)
    }

    pub async fn touch_searched_at(&self, id: Uuid, when: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE keyword_searches SET searched_at = $1 WHERE id = $2")
            .bind(when)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Written only by the refresh coordinator.
    pub async fn set_last_refreshed(&self, id: Uuid, when: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE keyword_searches SET last_refreshed = $1 WHERE id = $2")
            .bind(when)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Fetch a search by id, scoped to its owner.
    pub async fn get_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<KeywordSearch>> {
        let row = sqlx::query(
            "SELECT id, user_id, keyword, searched_at, last_refreshed \
             FROM keyword_searches WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_search(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<KeywordSearch>> {
        let rows = sqlx::query(
            "SELECT id, user_id, keyword, searched_at, last_refreshed \
             FROM keyword_searches WHERE user_id = $1 ORDER BY searched_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut searches = Vec::with_capacity(rows.len());
        for row in rows {
            searches.push(row_to_search(&row)?);
        }
        Ok(searches)
    }

    /// The distinct lower-cased keyword set across all users.
    pub async fn distinct_keywords(&self) -> Result<Vec<String>> {
        let keywords: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT LOWER(keyword) FROM keyword_searches ORDER BY 1",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(keywords)
    }

    /// Every user's search matching this keyword, case-insensitive.
    pub async fn find_all_for_keyword(&self, keyword: &str) -> Result<Vec<KeywordSearch>> {
        let rows = sqlx::query(
            "SELECT id, user_id, keyword, searched_at, last_refreshed \
             FROM keyword_searches WHERE LOWER(keyword) = LOWER($1)",
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;

        let mut searches = Vec::with_capacity(rows.len());
        for row in rows {
            searches.push(row_to_search(&row)?);
        }
        Ok(searches)
    }
}

fn row_to_search(row: &PgRow) -> std::result::Result<KeywordSearch, sqlx::Error> {
    Ok(KeywordSearch {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        keyword: row.try_get("keyword")?,
        searched_at: row.try_get("searched_at")?,
        last_refreshed: row.try_get("last_refreshed")?,
    })
}
