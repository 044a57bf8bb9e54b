//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database. Components call store
//! methods — they never execute SQL directly.
//!
//! Account records are whole snapshots: put_account rewrites every
//! mutable column from the in-memory record, so the last writer of a
//! key wins and interleaved read-modify-write cycles lose earlier
//! increments. That matches the single-writer deployment the desk is
//! built for; multi-writer deployments need per-key versioning, which
//! is an explicit upgrade, not this store.

mod pending;

use crate::{error::FraudDbResult, record::AccountRecord, types::AccountKey};
use rusqlite::{params, Connection, OptionalExtension};

pub struct Store {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl Store {
    pub fn open(path: &str) -> FraudDbResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> FraudDbResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new isolated database.
    pub fn reopen(&self) -> FraudDbResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> FraudDbResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Account records ───────────────────────────────────────────

    pub fn get_account(&self, key: &AccountKey) -> FraudDbResult<Option<AccountRecord>> {
        let columns = self
            .conn
            .query_row(
                "SELECT routing_number, account_number_last4, bank_name, times_checked,
                        is_associated, associated_key, submissions
                 FROM account WHERE storage_key = ?1",
                params![key.storage_key()],
                account_columns,
            )
            .optional()?;
        columns.map(assemble_record).transpose()
    }

    /// Write the record as a whole snapshot. The row keeps its rowid on
    /// conflict, so all_accounts keeps first-insert order.
    pub fn put_account(&self, record: &AccountRecord) -> FraudDbResult<()> {
        self.conn.execute(
            "INSERT INTO account (storage_key, routing_number, account_number_last4,
                                  bank_name, times_checked, is_associated,
                                  associated_key, submissions, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(storage_key) DO UPDATE SET
                 bank_name      = excluded.bank_name,
                 times_checked  = excluded.times_checked,
                 is_associated  = excluded.is_associated,
                 associated_key = excluded.associated_key,
                 submissions    = excluded.submissions,
                 updated_at     = excluded.updated_at",
            params![
                record.key().storage_key(),
                record.routing_number,
                record.account_number_last4,
                record.bank_name,
                record.times_checked,
                if record.is_associated { 1i32 } else { 0i32 },
                record.associated_with.as_ref().map(|k| k.storage_key()),
                serde_json::to_string(&record.submissions)?,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All records in first-insert order.
    pub fn all_accounts(&self) -> FraudDbResult<Vec<(String, AccountRecord)>> {
        let mut stmt = self.conn.prepare(
            "SELECT storage_key, routing_number, account_number_last4, bank_name,
                    times_checked, is_associated, associated_key, submissions
             FROM account ORDER BY rowid ASC",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    (
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i32>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, String>(7)?,
                    ),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(raw.len());
        for (key, columns) in raw {
            records.push((key, assemble_record(columns)?));
        }
        Ok(records)
    }

    pub fn account_count(&self) -> FraudDbResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM account", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

type AccountColumns = (String, String, String, i64, i32, Option<String>, String);

fn account_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn assemble_record(columns: AccountColumns) -> FraudDbResult<AccountRecord> {
    let (routing, last4, bank_name, times_checked, is_associated, associated_key, submissions) =
        columns;
    Ok(AccountRecord {
        routing_number: routing,
        account_number_last4: last4,
        bank_name,
        times_checked,
        submissions: serde_json::from_str(&submissions)?,
        is_associated: is_associated != 0,
        associated_with: associated_key.as_deref().and_then(AccountKey::parse),
    })
}
