use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{
    code::NumericCodeGenerator,
    delivery::{CodeSender, LogCodeSender, SmtpCodeSender},
    jwt::JwtKeys,
    password::Argon2Hasher,
    repo::{MemoryUserStore, PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::{AppConfig, StoreBackend};
use crate::exercises::repo::{ExerciseStore, MemoryExerciseStore, PgExerciseStore};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub exercises: Arc<dyn ExerciseStore>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let (users, exercises) = match config.backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                tracing::info!("database migrations applied");

                (
                    Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>,
                    Arc::new(PgExerciseStore::new(db)) as Arc<dyn ExerciseStore>,
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory stores; data is lost on restart");
                (
                    Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>,
                    Arc::new(MemoryExerciseStore::new()) as Arc<dyn ExerciseStore>,
                )
            }
        };

        let sender: Arc<dyn CodeSender> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpCodeSender::new(smtp)?) as Arc<dyn CodeSender>,
            None => Arc::new(LogCodeSender) as Arc<dyn CodeSender>,
        };

        let auth = AuthService {
            users,
            hasher: Arc::new(Argon2Hasher),
            tokens: Arc::new(JwtKeys::from_config(&config.jwt)),
            codes: Arc::new(NumericCodeGenerator::new(config.code_length)),
            sender,
            require_verified_login: config.require_verified_login,
        };

        Ok(Self::from_parts(auth, exercises))
    }

    pub fn from_parts(auth: AuthService, exercises: Arc<dyn ExerciseStore>) -> Self {
        Self { auth, exercises }
    }
}
