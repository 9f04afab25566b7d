//! Account store operations.
//!
//! Every function takes the connection to run on explicitly, so callers can
//! pass either a pooled connection or an open transaction (`&mut *tx`) and
//! group several calls into one unit of work.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::domain::{Account, AccountRef, Cents, OwnerId, OwnerKind};

/// Table layout for one kind of owner.
struct Tables {
    accounts: &'static str,
    owner_column: &'static str,
    owners: &'static str,
}

fn tables(kind: OwnerKind) -> Tables {
    match kind {
        OwnerKind::Client => Tables {
            accounts: "bank_accounts",
            owner_column: "client_id",
            owners: "clients",
        },
        OwnerKind::Service => Tables {
            accounts: "bank_accounts_services",
            owner_column: "service_id",
            owners: "services",
        },
    }
}

/// Check that the owning client or service exists.
pub async fn owner_exists(
    conn: &mut SqliteConnection,
    kind: OwnerKind,
    owner_id: OwnerId,
) -> Result<bool> {
    let t = tables(kind);
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?) AS found", t.owners);
    let row = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("Failed to look up {} {}", kind, owner_id))?;
    Ok(row.get::<i64, _>("found") != 0)
}

/// Number of accounts the owner holds, which is also the next account number.
pub async fn count_accounts(
    conn: &mut SqliteConnection,
    kind: OwnerKind,
    owner_id: OwnerId,
) -> Result<i64> {
    let t = tables(kind);
    let sql = format!(
        "SELECT COUNT(*) AS count FROM {} WHERE {} = ?",
        t.accounts, t.owner_column
    );
    let row = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("Failed to count accounts of {} {}", kind, owner_id))?;
    Ok(row.get("count"))
}

pub async fn insert_account(conn: &mut SqliteConnection, account: &Account) -> Result<()> {
    let t = tables(account.owner_kind);
    let sql = format!(
        "INSERT INTO {} (id, {}, account_number, balance, created_at) VALUES (?, ?, ?, ?, ?)",
        t.accounts, t.owner_column
    );
    sqlx::query(&sql)
        .bind(account.id.to_string())
        .bind(account.owner_id)
        .bind(account.account_number)
        .bind(account.balance)
        .bind(account.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .with_context(|| {
            format!(
                "Failed to insert account {} for {} {}",
                account.account_number, account.owner_kind, account.owner_id
            )
        })?;
    Ok(())
}

/// Current balance, or `None` if the account does not exist.
pub async fn get_balance(conn: &mut SqliteConnection, account: &AccountRef) -> Result<Option<Cents>> {
    let t = tables(account.kind);
    let sql = format!(
        "SELECT balance FROM {} WHERE {} = ? AND account_number = ?",
        t.accounts, t.owner_column
    );
    let row = sqlx::query(&sql)
        .bind(account.owner_id)
        .bind(account.account_number)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to read balance of {}", account))?;
    Ok(row.map(|r| r.get("balance")))
}

/// Overwrite a balance. Returns false if no account matched.
pub async fn set_balance(
    conn: &mut SqliteConnection,
    account: &AccountRef,
    balance: Cents,
) -> Result<bool> {
    let t = tables(account.kind);
    let sql = format!(
        "UPDATE {} SET balance = ? WHERE {} = ? AND account_number = ?",
        t.accounts, t.owner_column
    );
    let result = sqlx::query(&sql)
        .bind(balance)
        .bind(account.owner_id)
        .bind(account.account_number)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to set balance of {}", account))?;
    Ok(result.rows_affected() == 1)
}

/// Subtract `amount` only if the balance covers it, in a single statement.
/// Returns false if the account is missing or the funds are short.
pub async fn debit_if_sufficient(
    conn: &mut SqliteConnection,
    account: &AccountRef,
    amount: Cents,
) -> Result<bool> {
    let t = tables(account.kind);
    let sql = format!(
        "UPDATE {} SET balance = balance - ? WHERE {} = ? AND account_number = ? AND balance >= ?",
        t.accounts, t.owner_column
    );
    let result = sqlx::query(&sql)
        .bind(amount)
        .bind(account.owner_id)
        .bind(account.account_number)
        .bind(amount)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to debit {}", account))?;
    Ok(result.rows_affected() == 1)
}

/// Add `amount` to the balance. Returns false if no account matched.
pub async fn credit(conn: &mut SqliteConnection, account: &AccountRef, amount: Cents) -> Result<bool> {
    let t = tables(account.kind);
    let sql = format!(
        "UPDATE {} SET balance = balance + ? WHERE {} = ? AND account_number = ?",
        t.accounts, t.owner_column
    );
    let result = sqlx::query(&sql)
        .bind(amount)
        .bind(account.owner_id)
        .bind(account.account_number)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to credit {}", account))?;
    Ok(result.rows_affected() == 1)
}

pub async fn get_account(conn: &mut SqliteConnection, account: &AccountRef) -> Result<Option<Account>> {
    let t = tables(account.kind);
    let sql = format!(
        "SELECT id, {owner} AS owner_id, account_number, balance, created_at
         FROM {table}
         WHERE {owner} = ? AND account_number = ?",
        owner = t.owner_column,
        table = t.accounts
    );
    let row = sqlx::query(&sql)
        .bind(account.owner_id)
        .bind(account.account_number)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to fetch {}", account))?;

    row.map(|r| row_to_account(&r, account.kind)).transpose()
}

/// All accounts of one owner, in account-number order.
pub async fn list_accounts(
    conn: &mut SqliteConnection,
    kind: OwnerKind,
    owner_id: OwnerId,
) -> Result<Vec<Account>> {
    let t = tables(kind);
    let sql = format!(
        "SELECT id, {owner} AS owner_id, account_number, balance, created_at
         FROM {table}
         WHERE {owner} = ?
         ORDER BY account_number",
        owner = t.owner_column,
        table = t.accounts
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .with_context(|| format!("Failed to list accounts of {} {}", kind, owner_id))?;

    rows.iter().map(|r| row_to_account(r, kind)).collect()
}

fn row_to_account(row: &SqliteRow, kind: OwnerKind) -> Result<Account> {
    let id_str: String = row.get("id");
    let created_at_str: String = row.get("created_at");

    Ok(Account {
        id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
        owner_id: row.get("owner_id"),
        owner_kind: kind,
        account_number: row.get("account_number"),
        balance: row.get("balance"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .context("Invalid created_at timestamp")?
            .with_timezone(&Utc),
    })
}
