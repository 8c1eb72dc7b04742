//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token lifetime
    pub jwt_expiry_hours: i64,
    /// sqlx pool size
    pub db_max_connections: u32,
    /// Allowed CORS origins for the frontend; empty means any origin
    pub cors_origins: Vec<String>,
    /// Behind a reverse proxy that sets `X-Forwarded-For`
    pub trust_proxy: bool,
    /// Bootstrap admin, created when the users table is empty
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BoxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());
        // Secrets fall back to a placeholder only in development
        let secret = |name: &str| -> Result<String, BoxError> {
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(v) => Ok(v),
                None if environment == "development" => {
                    Ok(format!("dev-{name}-not-for-production"))
                }
                None => Err(format!(
                    "{name} must be set and non-empty in {environment} environment"
                )
                .into()),
            }
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            http_port: parse_or(lookup("HTTP_PORT"), 8080),
            jwt_secret: secret("JWT_SECRET")?,
            jwt_expiry_hours: parse_or(lookup("JWT_EXPIRY_HOURS"), 24),
            db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), 10),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty() && s != "*")
                        .collect()
                })
                .unwrap_or_default(),
            trust_proxy: parse_or(lookup("TRUST_PROXY"), false),
            admin_username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            admin_password: secret("ADMIN_PASSWORD")?,
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
