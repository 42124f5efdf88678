use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::macros::date;

use crate::{
    AppState,
    auth::{ForwardedIdentityProvider, Identity, UserId},
    html::CurrencyFormat,
    initialize_db,
    transaction::{
        Category, NewTransaction, SqliteTransactionStore, TransactionId, TransactionKind,
        TransactionStore, parse_amount,
    },
};

/// The user most tests act as.
pub(crate) fn test_identity() -> Identity {
    Identity {
        id: UserId::new("ana"),
        display_name: "Ana".to_owned(),
        email: Some("ana@example.com".to_owned()),
        avatar_url: None,
    }
}

fn test_connection() -> Arc<Mutex<Connection>> {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize_db(&connection).expect("Could not initialize database");

    Arc::new(Mutex::new(connection))
}

/// An empty store backed by an in-memory database.
pub(crate) fn test_store() -> Arc<SqliteTransactionStore> {
    Arc::new(SqliteTransactionStore::new(test_connection()))
}

/// App state with an in-memory database that trusts forwarded proxy headers.
pub(crate) fn test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");

    AppState::new(
        connection,
        "foobar",
        "Etc/UTC",
        CurrencyFormat::default(),
        Arc::new(ForwardedIdentityProvider::default()),
    )
    .expect("Could not create app state")
}

/// Save a food expense on 2025-01-15 for `owner` and return its ID.
pub(crate) async fn seed_transaction(
    store: &SqliteTransactionStore,
    owner: &UserId,
    description: &str,
    amount: &str,
) -> TransactionId {
    let transaction = NewTransaction::new(
        TransactionKind::Expense,
        description,
        parse_amount(amount).expect("Invalid test amount"),
        Category::Food,
        date!(2025 - 01 - 15),
    )
    .expect("Invalid test transaction");

    store
        .create(owner, transaction)
        .await
        .expect("Could not seed transaction")
}
