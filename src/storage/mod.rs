// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Users and company profiles live in a single embedded redb database (pure
//! Rust, ACID). Values are JSON encoded; secondary indexes map unique keys
//! back to primary ids.
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized [`StoredUser`]
//! - `users_by_email`: lowercase email → user id
//! - `users_by_mobile`: mobile number → user id
//! - `companies`: company id → serialized [`StoredCompany`]
//! - `companies_by_owner`: owner user id → company id
//! - `sequences`: table name → last allocated id
//!
//! Uniqueness is checked inside the write transaction that inserts the row,
//! so two concurrent registrations with the same email cannot both succeed.

pub mod companies;
pub mod instrument;
pub mod ownership;
pub mod users;

use std::{path::Path, sync::Arc};

use redb::{ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

pub use companies::{
    CompanyChanges, CompanyPage, CompanyRepository, CompanySummary, CompanyWithOwner, NewCompany,
    SocialLinks, StoredCompany,
};
pub use instrument::QueryTimer;
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipError};
pub use users::{
    hash_password, verify_password, Gender, NewUser, ProfileChanges, StoredUser, UserRepository,
};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
pub(crate) const USERS_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("users_by_email");
pub(crate) const USERS_BY_MOBILE: TableDefinition<&str, u64> =
    TableDefinition::new("users_by_mobile");
pub(crate) const COMPANIES: TableDefinition<u64, &[u8]> = TableDefinition::new("companies");
pub(crate) const COMPANIES_BY_OWNER: TableDefinition<u64, u64> =
    TableDefinition::new("companies_by_owner");
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: &'static str },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Run a store call on the blocking pool.
///
/// Calls that hash or verify passwords go through here; Argon2 takes tens of
/// milliseconds and must not hold an async worker thread.
pub async fn run_blocking<T, F>(db: &Arc<Database>, f: F) -> StorageResult<T>
where
    F: FnOnce(&Database) -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let db = Arc::clone(db);
    tokio::task::spawn_blocking(move || f(&db)).await?
}

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID database holding users and company profiles.
pub struct Database {
    db: redb::Database,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(USERS_BY_MOBILE)?;
            let _ = write_txn.open_table(COMPANIES)?;
            let _ = write_txn.open_table(COMPANIES_BY_OWNER)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self { db })
    }

    /// Cheap liveness probe used by the health endpoint.
    pub fn ping(&self) -> StorageResult<()> {
        let _timer = QueryTimer::start("db.ping");
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(SEQUENCES)?;
        Ok(())
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    pub fn companies(&self) -> CompanyRepository<'_> {
        CompanyRepository::new(self)
    }

    pub(crate) fn redb(&self) -> &redb::Database {
        &self.db
    }
}

/// Allocate the next id from a named sequence inside an open write transaction.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let current = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

/// Read and decode a JSON row by primary id.
pub(crate) fn read_row<T: serde::de::DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StorageResult<Option<T>> {
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}
