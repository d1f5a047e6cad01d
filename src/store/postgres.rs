//! PostgreSQL document-store backend for production use.
//!
//! Incidents are stored as JSONB documents alongside a uniquely-indexed
//! `incident_id` column, so the store-level uniqueness guarantee is carried
//! by the database the same way a document store's unique index would carry
//! it. `case_details` mirrors the external collection's columns.
//!
//! ## Configuration
//!
//! See [`StoreConfig`] for the environment variables.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::types::{CaseRecord, IncidentRecord};

use super::{InsertOutcome, StoreGateway, StoreSession};

/// DDL for the `case_details` table (external schema, read-only here).
pub const CASE_DETAILS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS case_details (
    account_no          TEXT,
    customer_ref        TEXT,
    case_current_status TEXT
);
"#;

/// DDL for the `incidents` table. The unique index on `incident_id` is
/// created by `ensure_unique_incident_index`, not here.
pub const INCIDENTS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS incidents (
    incident_id TEXT NOT NULL,
    body        JSONB NOT NULL,
    updated_at  TIMESTAMPTZ
);
"#;

/// Error type for the PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Stored document failed to decode into the record shape.
    #[error("document decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// PostgreSQL store gateway.
///
/// Holds a connection pool; `connect` verifies liveness with a round-trip
/// before handing out a session. Sessions draw from the pool per statement
/// and the pool reclaims connections when the session is dropped.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: StoreConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            db_name = %config.db_name,
            max_connections = config.max_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            "initializing PostgreSQL connection pool"
        );

        let options: PgConnectOptions = config.url.trim().parse()?;
        let options = options.database(config.db_name.trim());

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, PostgresError> {
        Self::new(StoreConfig::from_env()).await
    }

    /// Check if the database is reachable.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

/// Scoped session over the PostgreSQL pool.
pub struct PostgresSession {
    pool: PgPool,
}

impl PostgresSession {
    fn parse_case_row(row: &sqlx::postgres::PgRow) -> Result<CaseRecord, sqlx::Error> {
        Ok(CaseRecord {
            account_num: row.try_get("account_no")?,
            customer_ref: row.try_get("customer_ref")?,
            case_current_status: row.try_get("case_current_status")?,
        })
    }
}

#[async_trait]
impl StoreGateway for PostgresStore {
    type Error = PostgresError;
    type Session = PostgresSession;

    async fn connect(&self) -> Result<Self::Session, Self::Error> {
        // Explicit round-trip so a dead server fails acquisition, not the
        // first pipeline operation.
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(PostgresSession {
            pool: self.pool.clone(),
        })
    }
}

#[async_trait]
impl StoreSession for PostgresSession {
    type Error = PostgresError;

    async fn find_cases_by_account(
        &self,
        account_num: &str,
    ) -> Result<Vec<CaseRecord>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT account_no, customer_ref, case_current_status
            FROM case_details
            WHERE account_no = $1
            "#,
        )
        .bind(account_num)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(Self::parse_case_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }

    async fn find_cases_by_customer(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<CaseRecord>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT account_no, customer_ref, case_current_status
            FROM case_details
            WHERE customer_ref = $1
            "#,
        )
        .bind(customer_ref)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(Self::parse_case_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }

    async fn find_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<IncidentRecord>, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT body
            FROM incidents
            WHERE incident_id = $1
            "#,
        )
        .bind(incident_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => {
                let body: serde_json::Value = r.try_get("body").map_err(PostgresError::from)?;
                Ok(Some(serde_json::from_value(body)?))
            }
            None => Ok(None),
        }
    }

    async fn ensure_unique_incident_index(&self) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS incidents_incident_id_key
            ON incidents (incident_id)
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_incident(
        &self,
        record: &IncidentRecord,
    ) -> Result<InsertOutcome, Self::Error> {
        let body = serde_json::to_value(record)?;
        let result = sqlx::query(
            r#"
            INSERT INTO incidents (incident_id, body, updated_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&record.incident_id)
        .bind(&body)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(InsertOutcome::DuplicateKey)
            }
            Err(e) => Err(e.into()),
        }
    }
}
