use anyhow::Context;
use serde::Deserialize;

/// Upper bound for token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            ttl_minutes: lookup("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .map(|v| v.min(MAX_TTL_MINUTES))
                .unwrap_or(60 * 24),
        };

        Ok(Self {
            database_url: database_url(&lookup),
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: lookup("APP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8081),
            jwt,
        })
    }
}

// DATABASE_URL wins; otherwise assemble one from the discrete DB_* variables.
fn database_url<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
        return url;
    }
    let var = |key: &str, default: &str| {
        lookup(key)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    };
    format!(
        "postgres://{}:{}@{}:{}/{}?sslmode=disable",
        var("DB_USER", "postgres"),
        lookup("DB_PASSWORD").unwrap_or_default(),
        var("DB_HOST", "localhost"),
        var("DB_PORT", "5432"),
        var("DB_NAME", "todolistapi"),
    )
}
