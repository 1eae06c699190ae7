use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::two_factor::models::TwoFactorConfig;
use crate::domain::two_factor::models::TwoFactorRateLimit;
use crate::domain::two_factor::ports::TwoFactorConfigRepository;
use crate::domain::two_factor::ports::TwoFactorRateLimitRepository;

pub struct PostgresTwoFactorConfigRepository {
    pool: PgPool,
}

impl PostgresTwoFactorConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PostgresTwoFactorRateLimitRepository {
    pool: PgPool,
}

impl PostgresTwoFactorRateLimitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn config_from_row(row: &PgRow) -> Result<TwoFactorConfig, AuthError> {
    Ok(TwoFactorConfig {
        credential_id: CredentialId(row.try_get::<Uuid, _>("credential_id").map_err(db_err)?),
        enabled: row.try_get("enabled").map_err(db_err)?,
        enabled_at: row.try_get("enabled_at").map_err(db_err)?,
        disabled_at: row.try_get("disabled_at").map_err(db_err)?,
        code: row.try_get("code").map_err(db_err)?,
        code_expires_at: row.try_get("code_expires_at").map_err(db_err)?,
        failed_attempts: row.try_get("failed_attempts").map_err(db_err)?,
        blocked_until: row.try_get("blocked_until").map_err(db_err)?,
    })
}

fn rate_limit_from_row(row: &PgRow) -> Result<TwoFactorRateLimit, AuthError> {
    Ok(TwoFactorRateLimit {
        credential_id: CredentialId(row.try_get::<Uuid, _>("credential_id").map_err(db_err)?),
        last_send: row.try_get("last_send").map_err(db_err)?,
        quarter_hour_count: row.try_get("quarter_hour_count").map_err(db_err)?,
        hour_count: row.try_get("hour_count").map_err(db_err)?,
        day_count: row.try_get("day_count").map_err(db_err)?,
        blocked_until: row.try_get("blocked_until").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

#[async_trait]
impl TwoFactorConfigRepository for PostgresTwoFactorConfigRepository {
    async fn find(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<TwoFactorConfig>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT credential_id, enabled, enabled_at, disabled_at, code, code_expires_at,
                failed_attempts, blocked_until
            FROM two_factor_configs
            WHERE credential_id = $1
            "#,
        )
        .bind(credential_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(config_from_row).transpose()
    }

    async fn upsert(&self, config: TwoFactorConfig) -> Result<TwoFactorConfig, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO two_factor_configs (credential_id, enabled, enabled_at, disabled_at,
                code, code_expires_at, failed_attempts, blocked_until)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (credential_id) DO UPDATE
            SET enabled = $2, enabled_at = $3, disabled_at = $4, code = $5,
                code_expires_at = $6, failed_attempts = $7, blocked_until = $8
            "#,
        )
        .bind(config.credential_id.0)
        .bind(config.enabled)
        .bind(config.enabled_at)
        .bind(config.disabled_at)
        .bind(&config.code)
        .bind(config.code_expires_at)
        .bind(config.failed_attempts)
        .bind(config.blocked_until)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(config)
    }
}

#[async_trait]
impl TwoFactorRateLimitRepository for PostgresTwoFactorRateLimitRepository {
    async fn find(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<TwoFactorRateLimit>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT credential_id, last_send, quarter_hour_count, hour_count, day_count,
                blocked_until
            FROM two_factor_rate_limits
            WHERE credential_id = $1
            "#,
        )
        .bind(credential_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(rate_limit_from_row).transpose()
    }

    async fn upsert(&self, state: TwoFactorRateLimit) -> Result<TwoFactorRateLimit, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO two_factor_rate_limits (credential_id, last_send, quarter_hour_count,
                hour_count, day_count, blocked_until)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (credential_id) DO UPDATE
            SET last_send = $2, quarter_hour_count = $3, hour_count = $4, day_count = $5,
                blocked_until = $6
            "#,
        )
        .bind(state.credential_id.0)
        .bind(state.last_send)
        .bind(state.quarter_hour_count)
        .bind(state.hour_count)
        .bind(state.day_count)
        .bind(state.blocked_until)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(state)
    }
}
