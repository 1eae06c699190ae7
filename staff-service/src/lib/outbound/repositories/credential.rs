use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::credential::models::Credential;
use crate::domain::credential::models::CredentialId;
use crate::domain::credential::models::EmailAddress;
use crate::domain::credential::models::NationalId;
use crate::domain::credential::models::StaffRole;
use crate::domain::credential::ports::CredentialRepository;
use crate::domain::errors::AuthError;

pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn credential_from_row(row: &PgRow) -> Result<Credential, AuthError> {
    Ok(Credential {
        id: CredentialId(row.try_get::<Uuid, _>("id").map_err(db_err)?),
        national_id: NationalId::new(row.try_get::<String, _>("national_id").map_err(db_err)?)?,
        email: EmailAddress::new(row.try_get::<String, _>("email").map_err(db_err)?)?,
        full_name: row.try_get("full_name").map_err(db_err)?,
        password_hash: row.try_get("password_hash").map_err(db_err)?,
        role: StaffRole::from_str(&row.try_get::<String, _>("role").map_err(db_err)?)?,
        active: row.try_get("active").map_err(db_err)?,
        locked_until: row.try_get("locked_until").map_err(db_err)?,
        failed_attempts: row.try_get("failed_attempts").map_err(db_err)?,
        email_verified: row.try_get("email_verified").map_err(db_err)?,
        temporary_password: row.try_get("temporary_password").map_err(db_err)?,
        last_password_change: row.try_get("last_password_change").map_err(db_err)?,
        last_login_at: row.try_get("last_login_at").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

const COLUMNS: &str = "id, national_id, email, full_name, password_hash, role, active, \
     locked_until, failed_attempts, email_verified, temporary_password, \
     last_password_change, last_login_at, created_at";

#[async_trait]
impl CredentialRepository for PostgresCredentialRepository {
    async fn create(&self, credential: Credential) -> Result<Credential, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (id, national_id, email, full_name, password_hash, role,
                active, locked_until, failed_attempts, email_verified, temporary_password,
                last_password_change, last_login_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(credential.id.0)
        .bind(credential.national_id.as_str())
        .bind(credential.email.as_str())
        .bind(&credential.full_name)
        .bind(&credential.password_hash)
        .bind(credential.role.as_str())
        .bind(credential.active)
        .bind(credential.locked_until)
        .bind(credential.failed_attempts)
        .bind(credential.email_verified)
        .bind(credential.temporary_password)
        .bind(credential.last_password_change)
        .bind(credential.last_login_at)
        .bind(credential.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateIdentity;
                }
            }
            AuthError::Database(e.to_string())
        })?;

        Ok(credential)
    }

    async fn find_by_id(&self, id: &CredentialId) -> Result<Option<Credential>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM credentials WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(credential_from_row).transpose()
    }

    async fn find_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<Credential>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM credentials WHERE national_id = $1"
        ))
        .bind(national_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(credential_from_row).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Credential>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM credentials WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(credential_from_row).transpose()
    }

    async fn update(&self, credential: Credential) -> Result<Credential, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET email = $2, full_name = $3, password_hash = $4, role = $5, active = $6,
                locked_until = $7, failed_attempts = $8, email_verified = $9,
                temporary_password = $10, last_password_change = $11, last_login_at = $12
            WHERE id = $1
            "#,
        )
        .bind(credential.id.0)
        .bind(credential.email.as_str())
        .bind(&credential.full_name)
        .bind(&credential.password_hash)
        .bind(credential.role.as_str())
        .bind(credential.active)
        .bind(credential.locked_until)
        .bind(credential.failed_attempts)
        .bind(credential.email_verified)
        .bind(credential.temporary_password)
        .bind(credential.last_password_change)
        .bind(credential.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::Database(format!(
                "credential {} no longer exists",
                credential.id
            )));
        }

        Ok(credential)
    }
}
