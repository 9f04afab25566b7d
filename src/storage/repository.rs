use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::domain::{Client, OwnerId, Service};

use super::MIGRATION_001_INITIAL;

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// True when a store error is a UNIQUE constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Owns the SQLite connection pool. Account-level operations live in
/// [`super::accounts`] and run on a connection or transaction handed out here.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    ///
    /// WAL lets readers proceed while a writer holds the lock, and the busy
    /// timeout makes contending writers queue instead of failing.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Start a write transaction. Dropping it without commit rolls back.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so read-then-write
    /// sequences on the same rows serialize instead of failing on lock upgrade.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to begin transaction")
    }

    /// Check out a plain connection for single-statement work.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire connection")
    }

    // ========================
    // Client operations
    // ========================

    /// Insert a client and return it with its assigned id.
    /// Returns `None` if the login or phone number is already taken.
    pub async fn save_client(
        &self,
        login: &str,
        name: &str,
        phone: &str,
    ) -> Result<Option<Client>> {
        let created_at = Utc::now();
        let inserted = sqlx::query(
            r#"
            INSERT INTO clients (login, name, phone, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(login)
        .bind(name)
        .bind(phone)
        .bind(created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => return Ok(None),
            Err(err) => return Err(err).context("Failed to save client"),
        };

        Ok(Some(Client {
            id: row.get("id"),
            login: login.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            created_at,
        }))
    }

    pub async fn get_client(&self, id: OwnerId) -> Result<Option<Client>> {
        let row = sqlx::query(
            "SELECT id, login, name, phone, created_at FROM clients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client")?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    pub async fn get_client_by_login(&self, login: &str) -> Result<Option<Client>> {
        let row = sqlx::query(
            "SELECT id, login, name, phone, created_at FROM clients WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client by login")?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    pub async fn get_client_by_phone(&self, phone: &str) -> Result<Option<Client>> {
        let row = sqlx::query(
            "SELECT id, login, name, phone, created_at FROM clients WHERE phone = ?",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client by phone")?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    fn row_to_client(row: &SqliteRow) -> Result<Client> {
        let created_at_str: String = row.get("created_at");
        Ok(Client {
            id: row.get("id"),
            login: row.get("login"),
            name: row.get("name"),
            phone: row.get("phone"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Service operations
    // ========================

    /// Insert a service inside the caller's transaction, so its first account
    /// can be provisioned atomically with it. Returns `None` if the name is taken.
    pub async fn save_service(conn: &mut SqliteConnection, name: &str) -> Result<Option<Service>> {
        let created_at = Utc::now();
        let inserted =
            sqlx::query("INSERT INTO services (name, created_at) VALUES (?, ?) RETURNING id")
                .bind(name)
                .bind(created_at.to_rfc3339())
                .fetch_one(&mut *conn)
                .await;

        let row = match inserted {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => return Ok(None),
            Err(err) => return Err(err).context("Failed to save service"),
        };

        Ok(Some(Service {
            id: row.get("id"),
            name: name.to_string(),
            created_at,
        }))
    }

    pub async fn get_service(&self, id: OwnerId) -> Result<Option<Service>> {
        let row = sqlx::query("SELECT id, name, created_at FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch service")?;

        row.as_ref().map(Self::row_to_service).transpose()
    }

    fn row_to_service(row: &SqliteRow) -> Result<Service> {
        let created_at_str: String = row.get("created_at");
        Ok(Service {
            id: row.get("id"),
            name: row.get("name"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
