//! PostgreSQL API key store with connection pooling

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::repository::DEFAULT_KEY_VALIDITY_DAYS;
use crate::domain::api_key::{ApiKey, ApiKeyStore, KeyMaterial, KeySet};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout_secs: u64,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

/// PostgreSQL implementation of [`ApiKeyStore`]
///
/// Keys live in an `apikey(key, team, created, expires)` table. Rotation runs
/// in one transaction holding a per-team advisory lock, so rotations of the
/// same team serialize and readers never see the old keys expired without
/// the new key present.
#[derive(Debug, Clone)]
pub struct PostgresApiKeyStore {
    pool: PgPool,
    key_validity: Duration,
}

impl PostgresApiKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            key_validity: Duration::days(DEFAULT_KEY_VALIDITY_DAYS),
        }
    }

    /// Connect a pool and make sure the schema exists
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;

        info!(
            max_connections = config.max_connections,
            "Connected to PostgreSQL api key store"
        );

        Ok(store)
    }

    /// Set the lifetime given to newly rotated keys
    pub fn with_key_validity(mut self, validity: Duration) -> Self {
        self.key_validity = validity;
        self
    }

    /// Ensures the key table exists
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS apikey (
                key VARCHAR(255) PRIMARY KEY,
                team VARCHAR(255) NOT NULL,
                created TIMESTAMPTZ NOT NULL,
                expires TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS apikey_team_idx ON apikey (team)")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    fn row_to_api_key(row: &PgRow) -> Result<ApiKey, DomainError> {
        let encoded: String = row
            .try_get("key")
            .map_err(|e| DomainError::storage(format!("Failed to read key: {}", e)))?;
        let team: String = row
            .try_get("team")
            .map_err(|e| DomainError::storage(format!("Failed to read team: {}", e)))?;
        let created: DateTime<Utc> = row
            .try_get("created")
            .map_err(|e| DomainError::storage(format!("Failed to read created: {}", e)))?;
        let expires: DateTime<Utc> = row
            .try_get("expires")
            .map_err(|e| DomainError::storage(format!("Failed to read expires: {}", e)))?;

        let key = KeyMaterial::from_hex(&encoded)
            .map_err(|e| DomainError::storage(format!("Stored key is not hex: {}", e)))?;
        let team = TeamId::new(team)
            .map_err(|e| DomainError::storage(format!("Stored team is invalid: {}", e)))?;

        Ok(ApiKey::new(key, team, created, expires))
    }
}

#[async_trait]
impl ApiKeyStore for PostgresApiKeyStore {
    async fn api_keys(&self, team: &TeamId) -> Result<KeySet, DomainError> {
        let rows = sqlx::query(
            "SELECT key, team, created, expires FROM apikey WHERE team = $1 ORDER BY expires DESC",
        )
        .bind(team.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to query api keys: {}", e)))?;

        if rows.is_empty() {
            return Err(DomainError::not_found(format!(
                "no api keys for team '{}'",
                team
            )));
        }

        let keys = rows
            .iter()
            .map(Self::row_to_api_key)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(KeySet::new(keys))
    }

    async fn rotate_api_key(&self, team: &TeamId, key: KeyMaterial) -> Result<ApiKey, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(team.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to lock team: {}", e)))?;

        let now = Utc::now();
        let api_key = ApiKey::issue(key, team.clone(), now, self.key_validity)?;

        let expired = sqlx::query("UPDATE apikey SET expires = $2 WHERE team = $1 AND expires > $2")
            .bind(team.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to expire old keys: {}", e)))?;

        sqlx::query("INSERT INTO apikey (key, team, created, expires) VALUES ($1, $2, $3, $4)")
            .bind(api_key.key().to_hex())
            .bind(team.as_str())
            .bind(api_key.created())
            .bind(api_key.expires())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert api key: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit rotation: {}", e)))?;

        debug!(
            team = %team,
            expired_keys = expired.rows_affected(),
            "Rotated team api key"
        );

        Ok(api_key)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Database unreachable: {}", e)))?;

        Ok(())
    }
}
