use crate::{Result, Store, StoreError, User};
use tracing::{info, warn};

/// Account provisioned at startup.
#[derive(Debug, Clone, Default)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub token: String,
    pub is_staff: bool,
}

impl Store {
    /// Insert or refresh accounts keyed by username.
    pub async fn seed_users(&self, users: &[SeedUser]) -> Result<usize> {
        let mut tx = self.pool().begin().await?;
        for u in users {
            if u.token.trim().is_empty() {
                return Err(StoreError::Invalid(format!(
                    "user `{}` has an empty token",
                    u.username
                )));
            }
            sqlx::query(
                r#"INSERT INTO users (username, email, first_name, last_name, token, is_staff)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                   ON CONFLICT(username) DO UPDATE SET
                     email=excluded.email,
                     first_name=excluded.first_name,
                     last_name=excluded.last_name,
                     token=excluded.token,
                     is_staff=excluded.is_staff"#,
            )
            .bind(&u.username)
            .bind(&u.email)
            .bind(&u.first_name)
            .bind(&u.last_name)
            .bind(&u.token)
            .bind(u.is_staff)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(users = users.len(), "store.seed_users");
        Ok(users.len())
    }

    /// Resolve a bearer token. `None` when no account carries it.
    pub async fn user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user: Option<User> = sqlx::query_as(
            r#"SELECT id, username, first_name, last_name, email, is_staff
               FROM users WHERE token = ?"#,
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?;
        if user.is_none() {
            warn!("store.user_by_token.unknown");
        }
        Ok(user)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<User> {
        sqlx::query_as(
            r#"SELECT id, username, first_name, last_name, email, is_staff
               FROM users WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| StoreError::not_found("user", id))
    }
}
