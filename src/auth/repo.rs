use std::{collections::HashMap, sync::Mutex};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

/// Returned (inside `anyhow::Error`) by [`UserStore::create`] when the email is taken.
#[derive(Debug, Error)]
#[error("email already registered: {0}")]
pub struct EmailTaken(pub String);

/// Returned by [`UserStore::create`] when another user already holds the code.
#[derive(Debug, Error)]
#[error("verification code already in use")]
pub struct CodeTaken;

const CODE_CONSTRAINT: &str = "users_verification_code_key";

/// Persistence port for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<User>>;

    async fn create(&self, user: NewUser) -> anyhow::Result<User>;

    /// Flip `verified` for the unverified user holding `code`.
    /// `None` when no such unverified user exists.
    async fn mark_verified(&self, code: &str) -> anyhow::Result<Option<User>>;

    /// Remove a user that was never verified. Used to undo a signup whose
    /// code could not be delivered; verified users are left alone.
    async fn discard_unverified(&self, id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, verification_code, verified, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, verification_code, verified, created_at
            FROM users
            WHERE verification_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await
        .context("find user by code")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, verification_code)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, verification_code, verified, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.verification_code)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                if e.constraint() == Some(CODE_CONSTRAINT) {
                    Err(CodeTaken.into())
                } else {
                    Err(EmailTaken(user.email).into())
                }
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }

    async fn mark_verified(&self, code: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET verified = TRUE
             WHERE verification_code = $1 AND verified = FALSE
            RETURNING id, email, password_hash, verification_code, verified, created_at
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await
        .context("mark user verified")?;
        Ok(user)
    }

    async fn discard_unverified(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1 AND verified = FALSE")
            .bind(id)
            .execute(&self.db)
            .await
            .context("discard unverified user")?;
        Ok(())
    }
}

/// Process-local store for `STORE_BACKEND=memory` and tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<Uuid, User>>> {
        self.users
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock()?.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .lock()?
            .values()
            .find(|u| u.verification_code == code)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let mut users = self.lock()?;
        if users.values().any(|u| u.email == user.email) {
            return Err(EmailTaken(user.email).into());
        }
        if users
            .values()
            .any(|u| u.verification_code == user.verification_code)
        {
            return Err(CodeTaken.into());
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            verification_code: user.verification_code,
            verified: false,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn mark_verified(&self, code: &str) -> anyhow::Result<Option<User>> {
        let mut users = self.lock()?;
        let Some(user) = users
            .values_mut()
            .find(|u| u.verification_code == code && !u.verified)
        else {
            return Ok(None);
        };
        user.verified = true;
        Ok(Some(user.clone()))
    }

    async fn discard_unverified(&self, id: Uuid) -> anyhow::Result<()> {
        let mut users = self.lock()?;
        if users.get(&id).is_some_and(|u| !u.verified) {
            users.remove(&id);
        }
        Ok(())
    }
}
