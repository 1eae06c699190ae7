use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::recovery::models::RecoveryToken;
use crate::domain::recovery::models::RecoveryTokenKind;
use crate::domain::recovery::ports::RecoveryTokenRepository;

pub struct PostgresRecoveryTokenRepository {
    pool: PgPool,
}

impl PostgresRecoveryTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn token_from_row(row: &PgRow) -> Result<RecoveryToken, AuthError> {
    let kind = RecoveryTokenKind::from_str(&row.try_get::<String, _>("kind").map_err(db_err)?)
        .map_err(AuthError::Database)?;

    Ok(RecoveryToken {
        id: row.try_get::<Uuid, _>("id").map_err(db_err)?,
        credential_id: CredentialId(row.try_get::<Uuid, _>("credential_id").map_err(db_err)?),
        kind,
        token_hash: row.try_get("token_hash").map_err(db_err)?,
        used: row.try_get("used").map_err(db_err)?,
        used_at: row.try_get("used_at").map_err(db_err)?,
        expires_at: row.try_get("expires_at").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

#[async_trait]
impl RecoveryTokenRepository for PostgresRecoveryTokenRepository {
    async fn create(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO recovery_tokens (id, credential_id, kind, token_hash, used, used_at,
                expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(token.id)
        .bind(token.credential_id.0)
        .bind(token.kind.as_str())
        .bind(&token.token_hash)
        .bind(token.used)
        .bind(token.used_at)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(token)
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
        kind: RecoveryTokenKind,
    ) -> Result<Option<RecoveryToken>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, credential_id, kind, token_hash, used, used_at, expires_at, created_at
            FROM recovery_tokens
            WHERE token_hash = $1 AND kind = $2
            "#,
        )
        .bind(token_hash)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(token_from_row).transpose()
    }

    async fn update(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE recovery_tokens
            SET used = $2, used_at = $3
            WHERE id = $1
            "#,
        )
        .bind(token.id)
        .bind(token.used)
        .bind(token.used_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::Database(format!(
                "recovery token {} no longer exists",
                token.id
            )));
        }

        Ok(token)
    }

    async fn invalidate_outstanding(
        &self,
        credential_id: &CredentialId,
        kind: RecoveryTokenKind,
    ) -> Result<u64, AuthError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE recovery_tokens
            SET used = TRUE, used_at = $3
            WHERE credential_id = $1
              AND kind = $2
              AND used = FALSE
              AND expires_at > $3
            "#,
        )
        .bind(credential_id.0)
        .bind(kind.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected())
    }
}
