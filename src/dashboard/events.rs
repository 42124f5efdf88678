//! Server-sent events that keep an open dashboard in step with the store.
//!
//! Each snapshot is sent as a `summary` event with the new cards and a
//! `transactions` event that carries only the number of transactions. The
//! page reloads its filtered list and chart when it sees a `transactions`
//! event. Closing the page ends
//! the stream, which stops the live view and drops the subscription.

use std::{convert::Infallible, sync::Arc};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream};

use crate::{
    AppState, Error,
    auth::Identity,
    dashboard::cards::{SUMMARY_EVENT, summary_cards_view},
    html::CurrencyFormat,
    transaction::{
        LiveSnapshot, LiveTransactions, TRANSACTIONS_EVENT, TransactionStore, totals,
    },
};

/// The server-sent event that carries an alert for a failed read.
pub const ALERT_EVENT: &str = "alert";

/// The state needed to stream live updates.
#[derive(Clone)]
pub struct LiveEventsState {
    /// The store to subscribe to.
    pub transaction_store: Arc<dyn TransactionStore>,
    /// How amounts are displayed.
    pub currency_format: CurrencyFormat,
}

impl FromRef<AppState> for LiveEventsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            currency_format: state.currency_format.clone(),
        }
    }
}

fn snapshot_events(
    update: LiveSnapshot,
    currency_format: &CurrencyFormat,
) -> Vec<Result<Event, Infallible>> {
    let summary = summary_cards_view(&totals(&update.transactions), currency_format);

    let mut events = vec![
        Event::default()
            .event(SUMMARY_EVENT)
            .data(summary.into_string()),
        Event::default()
            .event(TRANSACTIONS_EVENT)
            .data(update.transactions.len().to_string()),
    ];

    if let Some(error) = update.error {
        events.push(
            Event::default()
                .event(ALERT_EVENT)
                .data(Error::StoreRead(error).into_alert_markup().into_string()),
        );
    }

    events.into_iter().map(Ok).collect()
}

/// Stream a snapshot of the signed in user's transactions whenever they change.
///
/// The first snapshot is sent as soon as the client connects.
pub async fn get_live_events(
    State(state): State<LiveEventsState>,
    Extension(identity): Extension<Identity>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("opening live transactions for {}", identity.id);

    let live = LiveTransactions::spawn(state.transaction_store.subscribe(&identity.id));
    let currency_format = state.currency_format;

    let updates = stream::unfold(live, |mut live| async move {
        let update = live.next_update().await?;
        Some((update, live))
    });

    let events = updates
        .flat_map(move |update| stream::iter(snapshot_events(update, &currency_format)));

    Sse::new(events).keep_alive(KeepAlive::default())
}
