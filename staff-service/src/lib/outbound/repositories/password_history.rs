use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::password_history::models::PasswordHistoryEntry;
use crate::domain::password_history::ports::PasswordHistoryRepository;

pub struct PostgresPasswordHistoryRepository {
    pool: PgPool,
}

impl PostgresPasswordHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn entry_from_row(row: &PgRow) -> Result<PasswordHistoryEntry, AuthError> {
    Ok(PasswordHistoryEntry {
        id: row.try_get::<Uuid, _>("id").map_err(db_err)?,
        credential_id: CredentialId(row.try_get::<Uuid, _>("credential_id").map_err(db_err)?),
        password_hash: row.try_get("password_hash").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

#[async_trait]
impl PasswordHistoryRepository for PostgresPasswordHistoryRepository {
    async fn append(&self, entry: PasswordHistoryEntry) -> Result<PasswordHistoryEntry, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO password_history (id, credential_id, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.id)
        .bind(entry.credential_id.0)
        .bind(&entry.password_hash)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(entry)
    }

    async fn find_recent(
        &self,
        credential_id: &CredentialId,
        limit: u32,
    ) -> Result<Vec<PasswordHistoryEntry>, AuthError> {
        let rows = sqlx::query(
            r#"
            SELECT id, credential_id, password_hash, created_at
            FROM password_history
            WHERE credential_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(credential_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(entry_from_row).collect()
    }
}
