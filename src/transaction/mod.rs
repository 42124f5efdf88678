//! Transactions: the records of money coming in and going out.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, validation and the SQLite table
//! - Totals, monthly buckets and filtering over a snapshot of transactions
//! - The `TransactionStore` with live snapshot subscriptions
//! - The view handlers for listing, creating, editing and deleting transactions

mod aggregation;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod filter;
mod form;
mod list;
mod live;
mod new_page;
mod store;

pub use aggregation::{MonthlyBucket, Totals, monthly_buckets, totals, years_with_transactions};
pub use core::{
    Category, NewTransaction, Transaction, TransactionId, TransactionKind, TransactionPatch,
    MAX_AMOUNT, create_transaction_table, parse_amount,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use filter::{TransactionFilter, filter_transactions};
pub use form::TRANSACTIONS_CHANGED_EVENT;
pub use list::{TRANSACTIONS_EVENT, get_transaction_list, transactions_section};
pub use live::{LiveSnapshot, LiveTransactions, TransactionList};
pub use new_page::get_new_transaction_page;
pub use store::{
    Snapshot, SnapshotEvent, SnapshotSubscription, SqliteTransactionStore, StoreReadError,
    StoreWriteError, TransactionStore,
};
