use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::ports::SessionRepository;

pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &PgRow) -> Result<Session, AuthError> {
    Ok(Session {
        id: SessionId(row.try_get::<Uuid, _>("id").map_err(db_err)?),
        credential_id: CredentialId(row.try_get::<Uuid, _>("credential_id").map_err(db_err)?),
        token: row.try_get("token").map_err(db_err)?,
        ip: row.try_get("ip").map_err(db_err)?,
        user_agent: row.try_get("user_agent").map_err(db_err)?,
        active: row.try_get("active").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        expires_at: row.try_get("expires_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

const COLUMNS: &str = "id, credential_id, token, ip, user_agent, active, created_at, expires_at";

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, credential_id, token, ip, user_agent, active,
                created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id.0)
        .bind(session.credential_id.0)
        .bind(&session.token)
        .bind(&session.ip)
        .bind(&session.user_agent)
        .bind(session.active)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(session)
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, AuthError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM sessions WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM sessions WHERE token = $1"))
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn update(&self, session: Session) -> Result<Session, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET active = $2, expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(session.id.0)
        .bind(session.active)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::Database(format!(
                "session {} no longer exists",
                session.id
            )));
        }

        Ok(session)
    }

    async fn revoke_all<'a>(
        &self,
        credential_id: &'a CredentialId,
        keep_token: Option<&'a str>,
    ) -> Result<u64, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET active = FALSE
            WHERE credential_id = $1
              AND active
              AND ($2::text IS NULL OR token <> $2)
            "#,
        )
        .bind(credential_id.0)
        .bind(keep_token)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected())
    }
}
