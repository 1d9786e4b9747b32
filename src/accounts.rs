use crate::profiles::ProfileStore;
use crate::types::{Error, Result, User};
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

/// The user-creation boundary. Owns the single lifecycle hook that gives
/// every new non-privileged user a profile.
pub struct UserDirectory {
    pool: PgPool,
    profiles: ProfileStore,
}

impl UserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            profiles: ProfileStore::new(pool.clone()),
            pool,
        }
    }

    pub async fn create_user(
        &self,
        username: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.trim().to_string(),
            is_staff,
            is_superuser,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, is_staff, is_superuser, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        self.profiles.ensure(&user).await?;

        info!("created user {} with ID: {}", user.username, user.id);
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query(
            "SELECT id, username, is_staff, is_superuser, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row_to_user(&row)?),
            None => Err(Error::UserNotFound { id }),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, is_staff, is_superuser, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}

fn row_to_user(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        created_at: row.try_get("created_at")?,
    })
}
