use anyhow::Context;

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database_url: String,
    /// Base64-encoded HS256 signing secret; decoded and validated before
    /// the server accepts traffic.
    pub auth_token_key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(4000),
            environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            auth_token_key: std::env::var("AUTH_TOKEN_KEY")
                .context("AUTH_TOKEN_KEY is required")?,
        })
    }
}
