use crate::types::{ArticleRecord, HistoryFilter, NewsArticle, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, keyword_search_id, title, description, url, published_at, \
                              source_name, language, created_at";

/// Persistence for articles. Each article belongs to exactly one keyword
/// search and is cascade-deleted with it.
pub struct ArticleStore {
    pool: PgPool,
}

impl ArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Plain insert. A duplicate within the search surfaces as an error the
    /// caller may log and skip.
    pub async fn insert(&self, search_id: Uuid, record: &ArticleRecord) -> Result<NewsArticle> {
        let article = Self::build(search_id, record);
        sqlx::query(
            "INSERT INTO news_articles \
             (id, keyword_search_id, title, description, url, published_at, source_name, language, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(article.id)
        .bind(article.keyword_search_id)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.url)
        .bind(article.published_at)
        .bind(&article.source_name)
        .bind(&article.language)
        .bind(article.created_at)
        .execute(&self.pool)
        .await?;
        Ok(article)
    }

    /// Insert unless an article with the same (title, published_at) already
    /// exists under this search. Reports whether a row actually landed.
    pub async fn insert_new(&self, search_id: Uuid, record: &ArticleRecord) -> Result<bool> {
        let article = Self::build(search_id, record);
        let result = sqlx::query(
            "INSERT INTO news_articles \
             (id, keyword_search_id, title, description, url, published_at, source_name, language, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (keyword_search_id, title, published_at) DO NOTHING",
        )
        .bind(article.id)
        .bind(article.keyword_search_id)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.url)
        .bind(article.published_at)
        .bind(&article.source_name)
        .bind(&article.language)
        .bind(article.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_search(&self, search_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM news_articles WHERE keyword_search_id = $1")
            .bind(search_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_search(&self, search_id: Uuid) -> Result<Vec<NewsArticle>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM news_articles \
             WHERE keyword_search_id = $1 ORDER BY published_at DESC"
        ))
        .bind(search_id)
        .fetch_all(&self.pool)
        .await?;
        collect_articles(rows)
    }

    /// Publication timestamp of the newest stored article, used as the
    /// lower bound for incremental refreshes.
    pub async fn latest_published(&self, search_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(published_at) FROM news_articles WHERE keyword_search_id = $1",
        )
        .bind(search_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }

    /// Articles of one search narrowed by the optional history filters:
    /// calendar day of publication, source-name substring, exact language.
    pub async fn list_filtered(
        &self,
        search_id: Uuid,
        filter: &HistoryFilter,
    ) -> Result<Vec<NewsArticle>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM news_articles \
             WHERE keyword_search_id = $1 \
               AND ($2::date IS NULL OR (published_at AT TIME ZONE 'UTC')::date = $2) \
               AND ($3::text IS NULL OR source_name ILIKE '%' || $3 || '%') \
               AND ($4::text IS NULL OR language = $4) \
             ORDER BY published_at DESC"
        ))
        .bind(search_id)
        .bind(filter.date)
        .bind(&filter.source)
        .bind(&filter.language)
        .fetch_all(&self.pool)
        .await?;
        collect_articles(rows)
    }

    pub async fn distinct_sources(&self, user_id: Uuid) -> Result<Vec<String>> {
        let sources: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT a.source_name FROM news_articles a \
             JOIN keyword_searches s ON s.id = a.keyword_search_id \
             WHERE s.user_id = $1 ORDER BY 1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sources)
    }

    pub async fn distinct_languages(&self, user_id: Uuid) -> Result<Vec<String>> {
        let languages: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT a.language FROM news_articles a \
             JOIN keyword_searches s ON s.id = a.keyword_search_id \
             WHERE s.user_id = $1 ORDER BY 1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(languages)
    }

    fn build(search_id: Uuid, record: &ArticleRecord) -> NewsArticle {
        NewsArticle {
            id: Uuid::new_v4(),
            keyword_search_id: search_id,
            title: record.title.clone(),
            description: record.description.clone(),
            url: record.url.clone(),
            published_at: record.published_at,
            source_name: record.source_name.clone(),
            language: record.language.clone(),
            created_at: Utc::now(),
        }
    }
}

fn collect_articles(rows: Vec<PgRow>) -> Result<Vec<NewsArticle>> {
    let mut articles = Vec::with_capacity(rows.len());
    for row in rows {
        articles.push(row_to_article(&row)?);
    }
    Ok(articles)
}

fn row_to_article(row: &PgRow) -> std::result::Result<NewsArticle, sqlx::Error> {
    Ok(NewsArticle {
        id: row.try_get("id")?,
        keyword_search_id: row.try_get("keyword_search_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        url: row.try_get("url")?,
        published_at: row.try_get("published_at")?,
        source_name: row.try_get("source_name")?,
        language: row.try_get("language")?,
        created_at: row.try_get("created_at")?,
    })
}
