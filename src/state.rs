use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::token::TokenKeys;
use crate::config::AppConfig;
use crate::users::repo::{PgUsers, UserRepo};

/// Shared per-request state: the bounded connection pool, the repository in
/// front of it and the immutable signing keys. Built once at startup, no
/// ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub users: Arc<dyn UserRepo>,
    pub keys: TokenKeys,
}

impl AppState {
    /// Startup sequence: decode the signing key, then connect to storage.
    /// Both must succeed before the server starts serving.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let keys = TokenKeys::from_base64_secret(&config.auth_token_key)
            .context("decode AUTH_TOKEN_KEY")?;

        let db = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        Ok(Self {
            users: Arc::new(PgUsers::new(db.clone())),
            db,
            keys,
        })
    }
}
