//! Application state

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::JwtService;
use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::db;
use crate::db::users::NewUser;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Access token service
    pub jwt: JwtService,
    /// Rate limiter for the login route
    pub rate_limiter: RateLimiter,
    /// Take the client IP from `X-Forwarded-For`
    pub trust_proxy: bool,
}

impl AppState {
    /// Connect, migrate and make sure an admin account exists
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        ensure_admin(&pool, config).await?;

        Ok(Self::with_pool(pool, config))
    }

    /// Build state around an existing pool (no migrations, no bootstrap)
    pub fn with_pool(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            jwt: JwtService::new(&config.jwt_secret, config.jwt_expiry_hours),
            rate_limiter: RateLimiter::new(),
            trust_proxy: config.trust_proxy,
        }
    }
}

/// Create the bootstrap admin when the users table is empty
async fn ensure_admin(pool: &PgPool, config: &Config) -> Result<(), BoxError> {
    if db::users::count_all(pool).await? > 0 {
        return Ok(());
    }

    let role = db::roles::find_by_name(pool, "admin")
        .await?
        .ok_or("admin role missing; migrations not applied?")?;
    let password_hash = crate::util::hash_password(&config.admin_password)
        .map_err(|e| format!("Failed to hash admin password: {e}"))?;

    db::users::create(
        pool,
        &NewUser {
            username: &config.admin_username,
            password_hash: &password_hash,
            full_name: "Administrator",
            email: None,
            role_id: role.id,
            department: None,
        },
    )
    .await?;

    tracing::warn!(username = %config.admin_username, "Created bootstrap admin account");
    Ok(())
}
