use crate::types::Result;
use sqlx::PgPool;
use tracing::info;

pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPool::connect(database_url).await?;
    Ok(pool)
}

/// Create the persistent schema if it does not exist yet. Idempotent, so
/// it is safe to run on every startup.
pub async fn setup_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            is_staff BOOLEAN NOT NULL DEFAULT false,
            is_superuser BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            user_id UUID PRIMARY KEY REFERENCES users (id) ON DELETE CASCADE,
            keyword_quota INTEGER NOT NULL DEFAULT 10 CHECK (keyword_quota >= 0),
            is_blocked BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS keyword_searches (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            keyword TEXT NOT NULL,
            searched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            last_refreshed TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS news_articles (
            id UUID PRIMARY KEY,
            keyword_search_id UUID NOT NULL REFERENCES keyword_searches (id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            url TEXT NOT NULL,
            published_at TIMESTAMPTZ NOT NULL,
            source_name TEXT NOT NULL,
            language TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One search per (user, keyword), case-insensitive.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_searches_user_keyword \
         ON keyword_searches (user_id, LOWER(keyword))",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_searches_searched_at \
         ON keyword_searches (user_id, searched_at DESC)",
    )
    .execute(pool)
    .await?;

    // Dedup key for refresh merges, scoped to the owning search.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_dedup \
         ON news_articles (keyword_search_id, title, published_at)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_articles_published \
         ON news_articles (keyword_search_id, published_at DESC)",
    )
    .execute(pool)
    .await?;

    info!("database schema is ready");
    Ok(())
}
