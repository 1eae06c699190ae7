use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::audit::models::LoginAttempt;
use crate::domain::audit::ports::LoginAttemptRepository;
use crate::domain::credential::models::NationalId;
use crate::domain::errors::AuthError;

pub struct PostgresLoginAttemptRepository {
    pool: PgPool,
}

impl PostgresLoginAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

#[async_trait]
impl LoginAttemptRepository for PostgresLoginAttemptRepository {
    async fn append(&self, attempt: LoginAttempt) -> Result<LoginAttempt, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO login_attempts (id, credential_id, national_id, ip, user_agent,
                success, failure_reason, blocked, attempted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.credential_id.map(|id| id.0))
        .bind(attempt.national_id.as_str())
        .bind(&attempt.ip)
        .bind(&attempt.user_agent)
        .bind(attempt.success)
        .bind(attempt.failure_reason.map(|r| r.as_str()))
        .bind(attempt.blocked)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(attempt)
    }

    async fn count_failures_since(
        &self,
        national_id: &NationalId,
        since: DateTime<Utc>,
    ) -> Result<u64, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS failures
            FROM login_attempts
            WHERE national_id = $1
              AND success = FALSE
              AND attempted_at >= $2
            "#,
        )
        .bind(national_id.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let failures: i64 = row.try_get("failures").map_err(db_err)?;
        Ok(failures.max(0) as u64)
    }
}
