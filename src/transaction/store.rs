//! The transaction store: durable per-user storage with live snapshots.
//!
//! Subscribers always receive the complete, current list of a user's
//! transactions. A snapshot replaces whatever the subscriber had before, so
//! receiving the same snapshot twice is harmless.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, params};
use time::OffsetDateTime;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    auth::UserId,
    transaction::core::{
        NewTransaction, TRANSACTION_COLUMNS, Transaction, TransactionId, TransactionPatch,
        map_transaction_row,
    },
};

/// How many change notifications can queue up before slow subscribers lag.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Errors from creating, updating or deleting a transaction.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreWriteError {
    /// The transaction does not exist or belongs to another user.
    #[error("transaction {0} not found")]
    NotFound(TransactionId),

    /// The store refused the data, e.g. a constraint failed.
    #[error("the store rejected the transaction: {0}")]
    Rejected(String),

    /// The store could not be reached or failed unexpectedly.
    #[error("the store failed: {0}")]
    Backend(String),
}

/// Errors from reading transactions.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreReadError {
    /// The store could not be reached or failed unexpectedly.
    #[error("could not read transactions: {0}")]
    Backend(String),
}

/// The complete list of a user's transactions, newest first.
pub type Snapshot = Vec<Transaction>;

/// A single delivery to a subscriber: a full snapshot or a read failure.
pub type SnapshotEvent = Result<Snapshot, StoreReadError>;

type SnapshotReader = Arc<dyn Fn(&UserId) -> SnapshotEvent + Send + Sync>;

/// Storage for transactions, scoped by owner.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Subscribe to the transactions owned by `owner`.
    ///
    /// Nothing is read until [SnapshotSubscription::next] is first awaited,
    /// which yields the current state.
    fn subscribe(&self, owner: &UserId) -> SnapshotSubscription;

    /// Read the current transactions owned by `owner`, newest first.
    async fn snapshot(&self, owner: &UserId) -> SnapshotEvent;

    /// Save a new transaction for `owner` and return its ID.
    async fn create(
        &self,
        owner: &UserId,
        transaction: NewTransaction,
    ) -> Result<TransactionId, StoreWriteError>;

    /// Apply `patch` to the transaction `id` owned by `owner`.
    async fn update(
        &self,
        owner: &UserId,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<(), StoreWriteError>;

    /// Remove the transaction `id` owned by `owner`.
    async fn delete(&self, owner: &UserId, id: TransactionId) -> Result<(), StoreWriteError>;
}

/// A live feed of snapshots for one owner.
///
/// Dropping the subscription stops delivery.
pub struct SnapshotSubscription {
    owner: UserId,
    changes: broadcast::Receiver<UserId>,
    read_snapshot: SnapshotReader,
    delivered_initial: bool,
}

impl SnapshotSubscription {
    fn new(
        owner: UserId,
        changes: broadcast::Receiver<UserId>,
        read_snapshot: SnapshotReader,
    ) -> Self {
        Self {
            owner,
            changes,
            read_snapshot,
            delivered_initial: false,
        }
    }

    /// The user whose transactions this subscription follows.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Wait for the next snapshot.
    ///
    /// The first call returns immediately with the current state. Later calls
    /// wait until the owner's transactions change. Returns `None` once the
    /// store has shut down.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            return Some(self.read());
        }

        loop {
            match self.changes.recv().await {
                Ok(owner) if owner == self.owner => return Some(self.read()),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        "subscription for {} lagged behind by {skipped} changes, re-reading",
                        self.owner
                    );
                    return Some(self.read());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving snapshots.
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn read(&self) -> SnapshotEvent {
        (self.read_snapshot)(&self.owner)
    }
}

impl Drop for SnapshotSubscription {
    fn drop(&mut self) {
        tracing::debug!("closed transaction subscription for {}", self.owner);
    }
}

/// A [TransactionStore] backed by SQLite.
///
/// Writes notify every live subscription of the affected owner.
#[derive(Clone)]
pub struct SqliteTransactionStore {
    db_connection: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<UserId>,
}

impl SqliteTransactionStore {
    /// Create a store using an initialized database connection.
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            db_connection,
            changes,
        }
    }

    /// The number of subscriptions that have not been dropped yet.
    pub fn live_subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn notify(&self, owner: &UserId) {
        if self.changes.send(owner.clone()).is_err() {
            tracing::trace!("no live subscribers to notify about changes for {owner}");
        }
    }

    fn write<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, StoreWriteError>,
    ) -> Result<T, StoreWriteError> {
        let connection = self
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| StoreWriteError::Backend("could not acquire database lock".to_owned()))?;

        operation(&connection)
    }
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    fn subscribe(&self, owner: &UserId) -> SnapshotSubscription {
        tracing::debug!("opened transaction subscription for {owner}");
        let db_connection = self.db_connection.clone();

        SnapshotSubscription::new(
            owner.clone(),
            self.changes.subscribe(),
            Arc::new(move |owner: &UserId| read_snapshot(owner, &db_connection)),
        )
    }

    async fn snapshot(&self, owner: &UserId) -> SnapshotEvent {
        read_snapshot(owner, &self.db_connection)
    }

    async fn create(
        &self,
        owner: &UserId,
        transaction: NewTransaction,
    ) -> Result<TransactionId, StoreWriteError> {
        let id = self.write(|connection| {
            insert_transaction(owner, &transaction, OffsetDateTime::now_utc(), connection)
                .map_err(map_write_error)
        })?;

        tracing::debug!("created transaction {id} for {owner}");
        self.notify(owner);

        Ok(id)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<(), StoreWriteError> {
        self.write(|connection| {
            let mut transaction = match get_transaction(owner, id, connection) {
                Ok(transaction) => transaction,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(StoreWriteError::NotFound(id));
                }
                Err(error) => return Err(map_write_error(error)),
            };

            patch.apply_to(&mut transaction);
            transaction.updated_at = OffsetDateTime::now_utc();

            match update_transaction(&transaction, connection).map_err(map_write_error)? {
                0 => Err(StoreWriteError::NotFound(id)),
                _ => Ok(()),
            }
        })?;

        tracing::debug!("updated transaction {id} for {owner}");
        self.notify(owner);

        Ok(())
    }

    async fn delete(&self, owner: &UserId, id: TransactionId) -> Result<(), StoreWriteError> {
        let rows_affected = self.write(|connection| {
            delete_transaction(owner, id, connection).map_err(map_write_error)
        })?;

        if rows_affected == 0 {
            return Err(StoreWriteError::NotFound(id));
        }

        tracing::debug!("deleted transaction {id} for {owner}");
        self.notify(owner);

        Ok(())
    }
}

fn read_snapshot(owner: &UserId, db_connection: &Mutex<Connection>) -> SnapshotEvent {
    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| StoreReadError::Backend("could not acquire database lock".to_owned()))?;

    get_transactions_for_owner(owner, &connection).map_err(|error| {
        tracing::error!("could not read transactions for {owner}: {error}");
        StoreReadError::Backend(error.to_string())
    })
}

fn map_write_error(error: rusqlite::Error) -> StoreWriteError {
    match error.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreWriteError::Rejected(error.to_string()),
        _ => {
            tracing::error!("an unhandled SQL error occurred while writing a transaction: {error}");
            StoreWriteError::Backend(error.to_string())
        }
    }
}

type RowsAffected = usize;

fn insert_transaction(
    owner: &UserId,
    transaction: &NewTransaction,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<TransactionId, rusqlite::Error> {
    connection.execute(
        "INSERT INTO transactions \
            (owner_id, kind, description, amount, category, occurred_on, created_at, updated_at) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            owner.as_str(),
            transaction.kind,
            transaction.description,
            transaction.amount.to_string(),
            transaction.category,
            transaction.occurred_on,
            now,
        ],
    )?;

    Ok(TransactionId::new(connection.last_insert_rowid()))
}

fn get_transaction(
    owner: &UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, rusqlite::Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_row(params![id, owner.as_str()], map_transaction_row)
}

fn get_transactions_for_owner(
    owner: &UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, rusqlite::Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
            WHERE owner_id = ?1 \
            ORDER BY occurred_on DESC, id DESC"
        ))?
        .query_map(params![owner.as_str()], map_transaction_row)?
        .collect()
}

fn update_transaction(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<RowsAffected, rusqlite::Error> {
    connection.execute(
        "UPDATE transactions \
        SET kind = ?1, description = ?2, amount = ?3, category = ?4, occurred_on = ?5, updated_at = ?6 \
        WHERE id = ?7 AND owner_id = ?8",
        params![
            transaction.kind,
            transaction.description,
            transaction.amount.to_string(),
            transaction.category,
            transaction.occurred_on,
            transaction.updated_at,
            transaction.id,
            transaction.owner_id.as_str(),
        ],
    )
}

fn delete_transaction(
    owner: &UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, rusqlite::Error> {
    connection.execute(
        "DELETE FROM transactions WHERE id = ?1 AND owner_id = ?2",
        params![id, owner.as_str()],
    )
}
