//! Keeps a view's copy of the transaction list in step with the store.

use tokio::{sync::watch, task::JoinHandle};

use crate::transaction::{
    core::Transaction,
    store::{SnapshotEvent, SnapshotSubscription, StoreReadError},
};

/// A view's copy of a user's transactions.
///
/// Every snapshot replaces the whole list, so applying the same snapshot
/// twice leaves the list as it was after the first time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionList {
    transactions: Vec<Transaction>,
}

impl TransactionList {
    /// The transactions as of the last applied snapshot, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Replace the list with the snapshot in `event`.
    ///
    /// # Errors
    /// If `event` is a read error the list is cleared and the error returned,
    /// so callers show an empty list rather than stale data.
    pub fn apply(&mut self, event: SnapshotEvent) -> Result<(), StoreReadError> {
        match event {
            Ok(snapshot) => {
                self.transactions = snapshot;
                Ok(())
            }
            Err(error) => {
                self.transactions.clear();
                Err(error)
            }
        }
    }
}

/// What a live view should show after a snapshot arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSnapshot {
    /// The transactions to display.
    pub transactions: Vec<Transaction>,
    /// Set if the store could not be read, in which case `transactions` is empty.
    pub error: Option<StoreReadError>,
}

/// A background task that feeds a [SnapshotSubscription] into a view.
///
/// Call [LiveTransactions::teardown] when the view goes away. Dropping it
/// also stops the task, but without waiting for the subscription to close.
pub struct LiveTransactions {
    updates: watch::Receiver<Option<LiveSnapshot>>,
    task: Option<JoinHandle<()>>,
}

impl LiveTransactions {
    /// Start following `subscription`.
    pub fn spawn(mut subscription: SnapshotSubscription) -> Self {
        let (sender, updates) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut list = TransactionList::default();

            while let Some(event) = subscription.next().await {
                let error = list.apply(event).err();
                if let Some(error) = &error {
                    tracing::error!(
                        "live transactions for {} failed to load: {error}",
                        subscription.owner()
                    );
                }

                let update = LiveSnapshot {
                    transactions: list.transactions().to_vec(),
                    error,
                };

                if sender.send(Some(update)).is_err() {
                    break;
                }
            }
        });

        Self {
            updates,
            task: Some(task),
        }
    }

    /// Wait for the next update.
    ///
    /// Updates that arrive faster than they are read are coalesced into the
    /// latest one. Returns `None` once the subscription has ended.
    pub async fn next_update(&mut self) -> Option<LiveSnapshot> {
        self.updates.changed().await.ok()?;
        self.updates.borrow_and_update().clone()
    }

    /// Stop the task and wait until the subscription has been released.
    pub async fn teardown(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        task.abort();

        match task.await {
            Ok(()) => {}
            Err(error) if error.is_cancelled() => {}
            Err(error) => tracing::error!("live transactions task failed: {error}"),
        }
    }
}

impl Drop for LiveTransactions {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        auth::UserId,
        initialize_db,
        transaction::{
            core::{Category, NewTransaction, Transaction, TransactionId, TransactionKind},
            store::{SqliteTransactionStore, StoreReadError, TransactionStore},
        },
    };

    use super::{LiveTransactions, TransactionList};

    fn get_store() -> SqliteTransactionStore {
        let connection = Connection::open_in_memory().expect("could not open in-memory database");
        initialize_db(&connection).expect("could not initialize database");

        SqliteTransactionStore::new(Arc::new(Mutex::new(connection)))
    }

    fn transaction(id: i64) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            kind: TransactionKind::Expense,
            description: format!("transaction {id}"),
            amount: Decimal::ONE,
            category: Category::Other,
            occurred_on: date!(2024 - 03 - 01),
            owner_id: UserId::new("alice"),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn snapshot_replaces_list() {
        let mut list = TransactionList::default();
        list.apply(Ok(vec![transaction(1), transaction(2)])).unwrap();

        list.apply(Ok(vec![transaction(3)])).unwrap();

        assert_eq!(list.transactions(), &[transaction(3)]);
    }

    #[test]
    fn replaying_a_snapshot_changes_nothing() {
        let snapshot = vec![transaction(2), transaction(1)];
        let mut once = TransactionList::default();
        once.apply(Ok(snapshot.clone())).unwrap();
        let mut twice = once.clone();

        twice.apply(Ok(snapshot)).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn read_error_clears_list() {
        let mut list = TransactionList::default();
        list.apply(Ok(vec![transaction(1)])).unwrap();
        let error = StoreReadError::Backend("disk on fire".to_owned());

        let result = list.apply(Err(error.clone()));

        assert_eq!(result, Err(error));
        assert!(list.transactions().is_empty());
    }

    #[tokio::test]
    async fn follows_store_writes() {
        let store = get_store();
        let alice = UserId::new("alice");
        let mut live = LiveTransactions::spawn(store.subscribe(&alice));

        let initial = live.next_update().await.expect("no initial update");
        assert!(initial.transactions.is_empty());
        assert_eq!(initial.error, None);

        let new_transaction = NewTransaction::new(
            TransactionKind::Income,
            "Salary",
            Decimal::new(200, 0),
            Category::Work,
            date!(2024 - 03 - 15),
        )
        .unwrap();
        store.create(&alice, new_transaction).await.unwrap();

        let update = live.next_update().await.expect("no update after write");
        assert_eq!(update.transactions.len(), 1);
        assert_eq!(update.transactions[0].description, "Salary");

        live.teardown().await;
    }

    #[tokio::test]
    async fn teardown_releases_subscription() {
        let store = get_store();
        let alice = UserId::new("alice");
        let mut live = LiveTransactions::spawn(store.subscribe(&alice));
        live.next_update().await.expect("no initial update");
        assert_eq!(store.live_subscriber_count(), 1);

        live.teardown().await;

        assert_eq!(store.live_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn teardown_before_first_update() {
        let store = get_store();
        let live = LiveTransactions::spawn(store.subscribe(&UserId::new("alice")));

        live.teardown().await;

        assert_eq!(store.live_subscriber_count(), 0);
    }
}
