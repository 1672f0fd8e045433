use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
    pub refresh_window_hours: i64,
    pub cookie_name: String,
    pub cookie_domain: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    /// Lets users without a stored password hash sign in by username alone.
    pub allow_passwordless: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://wrenchturn.db?mode=rwc".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_KEY")?,
            ttl_hours: env_parse("JWT_TTL_HOURS").unwrap_or(120),
            refresh_window_hours: env_parse("JWT_REFRESH_WINDOW_HOURS").unwrap_or(24),
            cookie_name: std::env::var("JWT_COOKIE_NAME")
                .unwrap_or_else(|_| "wrenchturn-jwt".into()),
            cookie_domain: std::env::var("API_DOMAIN").unwrap_or_default(),
            cookie_secure: env_parse("COOKIE_SECURE").unwrap_or(false),
        };
        Ok(Self {
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(5),
            jwt,
            allow_passwordless: env_parse("AUTH_ALLOW_PASSWORDLESS").unwrap_or(true),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
