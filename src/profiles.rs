use crate::types::{Error, Result, User, UserProfile};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

pub struct ProfileStore {
    pool: PgPool,
}

impl ProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent get-or-create for a user's profile. Privileged accounts
    /// never get one; they bypass quota and block checks anyway.
    pub async fn ensure(&self, user: &User) -> Result<Option<UserProfile>> {
        if user.is_privileged() {
            debug!("skipping profile for privileged account {}", user.username);
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO user_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        let profile = self
            .get(user.id)
            .await?
            .ok_or(Error::ProfileNotFound { user_id: user.id })?;
        Ok(Some(profile))
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT user_id, keyword_quota, is_blocked, created_at, updated_at \
             FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    /// Administrative mutation of the keyword quota.
    pub async fn set_quota(&self, user_id: Uuid, quota: i32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_profiles SET keyword_quota = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(quota)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ProfileNotFound { user_id });
        }
        info!("set keyword quota for {} to {}", user_id, quota);
        Ok(())
    }

    /// Administrative block/unblock toggle.
    pub async fn set_blocked(&self, user_id: Uuid, blocked: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_profiles SET is_blocked = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(blocked)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ProfileNotFound { user_id });
        }
        info!("set block flag for {} to {}", user_id, blocked);
        Ok(())
    }
}

fn row_to_profile(row: &PgRow) -> std::result::Result<UserProfile, sqlx::Error> {
    Ok(UserProfile {
        user_id: row.try_get("user_id")?,
        keyword_quota: row.try_get("keyword_quota")?,
        is_blocked: row.try_get("is_blocked")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
