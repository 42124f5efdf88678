//! Finance Tracker is a web app for recording income and expenses.
//!
//! This library provides a web server that directly serves HTML pages. The
//! dashboard shows the signed in user's totals, a monthly chart and a
//! filterable list of transactions, and keeps them up to date with
//! server-sent events whenever the transactions change.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    AuthError, ForwardedHeaders, ForwardedIdentityProvider, Identity, IdentityProvider,
    SessionProvider, SignInRequest, UserId, UserProfile, ensure_user_profile,
};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use html::CurrencyFormat;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    Category, LiveSnapshot, LiveTransactions, MonthlyBucket, NewTransaction, Snapshot,
    SnapshotEvent, SnapshotSubscription, SqliteTransactionStore, StoreReadError,
    StoreWriteError, Totals, Transaction, TransactionFilter, TransactionId, TransactionKind,
    TransactionList, TransactionPatch, TransactionStore, filter_transactions, monthly_buckets,
    parse_amount, totals, years_with_transactions,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
