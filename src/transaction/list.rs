//! The filterable list of transactions shown on the dashboard.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};

use crate::{
    AppState, Error,
    auth::Identity,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CurrencyFormat, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        format_currency,
    },
    transaction::{
        Transaction, TransactionStore,
        core::{Category, TransactionKind},
        delete_endpoint::delete_confirmation_prompt,
        filter::{TransactionFilter, filter_transactions},
        form::TRANSACTIONS_CHANGED_EVENT,
    },
};

/// The server-sent event that tells the list to reload.
pub const TRANSACTIONS_EVENT: &str = "transactions";

/// The state needed to list transactions.
#[derive(Clone)]
pub struct TransactionListState {
    /// Where transactions are read from.
    pub transaction_store: Arc<dyn TransactionStore>,
    /// How amounts are displayed.
    pub currency_format: CurrencyFormat,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            currency_format: state.currency_format.clone(),
        }
    }
}

fn filters_view(filter: &TransactionFilter) -> Markup {
    let date = filter.date.map(|date| date.to_string());

    html! {
        form
            id="transaction-filters"
            hx-get=(endpoints::TRANSACTIONS_VIEW)
            hx-target="#transaction-list"
            hx-trigger="change, input changed delay:300ms from:#search, submit"
            hx-target-error="#alert-container"
            class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-5 gap-4 items-end mb-4"
        {
            div
            {
                label for="filter-kind" class=(FORM_LABEL_STYLE) { "Type" }

                select name="kind" id="filter-kind" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[filter.kind.is_none()] { "Any" }

                    @for kind in TransactionKind::ALL {
                        option value=(kind.as_str()) selected[filter.kind == Some(kind)]
                        {
                            (kind.label())
                        }
                    }
                }
            }

            div
            {
                label for="filter-category" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category" id="filter-category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[filter.category.is_none()] { "Any" }

                    @for category in Category::ALL {
                        option
                            value=(category.as_str())
                            selected[filter.category == Some(category)]
                        {
                            (category.label())
                        }
                    }
                }
            }

            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }

                input
                    type="search"
                    name="search"
                    id="search"
                    placeholder="Description"
                    value=(filter.search)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="filter-date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    type="date"
                    name="date"
                    id="filter-date"
                    value=[date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="pb-2.5"
            {
                button
                    type="reset"
                    class=(LINK_STYLE)
                    hx-get=(endpoints::TRANSACTIONS_VIEW)
                    hx-target="#transaction-list"
                {
                    "Clear filters"
                }
            }
        }
    }
}

fn transaction_row(transaction: &Transaction, currency_format: &CurrencyFormat) -> Markup {
    let (sign, amount_style) = match transaction.kind {
        TransactionKind::Income => ("+", "text-green-600 dark:text-green-400"),
        TransactionKind::Expense => ("-", "text-red-600 dark:text-red-400"),
    };
    let id = transaction.id.as_i64();
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, id);
    let delete_url = format_endpoint(endpoints::TRANSACTION_API, id);

    html! {
        li
            id=(format!("transaction-{id}"))
            class="flex flex-wrap items-center justify-between gap-2 py-3"
        {
            div class="min-w-0"
            {
                p class="font-medium truncate" { (transaction.description) }
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (transaction.category.label()) " · " (transaction.occurred_on)
                }
            }

            div class="flex items-center gap-4"
            {
                span class={"font-semibold " (amount_style)} data-amount
                {
                    (sign) (format_currency(transaction.amount, currency_format))
                }

                button
                    type="button"
                    hx-get=(edit_url)
                    hx-target="#modal"
                    hx-target-error="#alert-container"
                    class=(LINK_STYLE)
                {
                    "Edit"
                }

                button
                    type="button"
                    hx-delete=(delete_url)
                    hx-confirm=(delete_confirmation_prompt(&transaction.description))
                    hx-vals=r#"{"confirmed": true}"#
                    hx-target="#alert-container"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

/// Render `transactions` as a list, or a placeholder if there are none.
pub fn transaction_list_view(
    transactions: &[Transaction],
    currency_format: &CurrencyFormat,
) -> Markup {
    html! {
        @if transactions.is_empty() {
            p class="py-6 text-center text-gray-500 dark:text-gray-400" { "No transactions found" }
        } @else {
            ul class="divide-y divide-gray-200 dark:divide-gray-700"
            {
                @for transaction in transactions {
                    (transaction_row(transaction, currency_format))
                }
            }
        }
    }
}

/// The filters and the list, which reloads whenever the transactions change.
pub fn transactions_section(
    transactions: &[Transaction],
    filter: &TransactionFilter,
    currency_format: &CurrencyFormat,
) -> Markup {
    let filtered = filter_transactions(transactions, filter);
    let trigger = format!("sse:{TRANSACTIONS_EVENT}, {TRANSACTIONS_CHANGED_EVENT} from:body");

    html! {
        section id="transactions" class="w-full"
        {
            h2 class="text-xl font-bold mb-4" { "Transactions" }

            (filters_view(filter))

            div
                id="transaction-list"
                hx-get=(endpoints::TRANSACTIONS_VIEW)
                hx-include="#transaction-filters"
                hx-trigger=(trigger)
                hx-target-error="#alert-container"
            {
                (transaction_list_view(&filtered, currency_format))
            }
        }
    }
}

/// Renders the signed in user's transactions that match the filters in the query string.
///
/// If the transactions cannot be read, an alert is shown in place of the list.
pub async fn get_transaction_list(
    State(state): State<TransactionListState>,
    Extension(identity): Extension<Identity>,
    Query(filter): Query<TransactionFilter>,
) -> Response {
    match state.transaction_store.snapshot(&identity.id).await {
        Ok(transactions) => {
            let filtered = filter_transactions(&transactions, &filter);

            html! {
                (transaction_list_view(&filtered, &state.currency_format))

                @if filtered.is_empty() && !filter.is_empty() {
                    p class="text-center text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Try clearing the filters."
                    }
                }
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not load transactions for {}: {error}", identity.id);
            html! {
                (Error::StoreRead(error).into_alert_markup())
                (transaction_list_view(&[], &state.currency_format))
            }
            .into_response()
        }
    }
}
