use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::auth::jwt::SessionKeys;
use crate::config::{AppConfig, JwtConfig};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub keys: SessionKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = crate::db::connect(&config.database_url, config.max_connections).await?;
        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        let keys = SessionKeys::from_config(&config.jwt);
        Self { db, config, keys }
    }

    /// State over an in-memory database with a fixed signing key.
    pub async fn fake() -> anyhow::Result<Self> {
        let db = crate::db::memory_pool().await?;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                ttl_hours: 120,
                refresh_window_hours: 24,
                cookie_name: "wrenchturn-jwt".into(),
                cookie_domain: "localhost".into(),
                cookie_secure: false,
            },
            allow_passwordless: true,
        });
        Ok(Self::from_parts(db, config))
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}
