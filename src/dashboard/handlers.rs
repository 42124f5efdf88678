//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The dashboard page with the summary cards, chart and transaction list
//! - The chart fragment that is reloaded when the year changes
//! - State and query types used by the handlers

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::Identity,
    dashboard::{
        cards::{SUMMARY_EVENT, summary_cards_view},
        charts::chart_view,
        events::ALERT_EVENT,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CurrencyFormat, PAGE_CONTAINER_STYLE, base, currency_input_styles,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{
        TRANSACTIONS_CHANGED_EVENT, TRANSACTIONS_EVENT, Transaction, TransactionFilter,
        TransactionStore, monthly_buckets, totals, transactions_section,
        years_with_transactions,
    },
};

/// The state needed for displaying the dashboard page and its chart.
#[derive(Clone)]
pub struct DashboardState {
    /// Where transactions are read from.
    pub transaction_store: Arc<dyn TransactionStore>,
    /// How amounts are displayed.
    pub currency_format: CurrencyFormat,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            currency_format: state.currency_format.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The year to chart when none was requested: the earliest year with
/// transactions, otherwise the current year.
fn chart_year(requested: Option<i32>, years: &[i32], local_timezone: &str) -> Result<i32, Error> {
    match requested.or_else(|| years.first().copied()) {
        Some(year) => Ok(year),
        None => local_today(local_timezone).map(|today| today.year()),
    }
}

fn chart_fragment(
    transactions: &[Transaction],
    year: i32,
    currency_format: &CurrencyFormat,
) -> Markup {
    let buckets = monthly_buckets(transactions, year);
    let years = years_with_transactions(transactions);

    chart_view(&buckets, year, &years, currency_format)
}

fn dashboard_view(
    identity: &Identity,
    transactions: &[Transaction],
    year: i32,
    alert: Option<Markup>,
    currency_format: &CurrencyFormat,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, identity).into_html();
    let reload_trigger =
        format!("sse:{TRANSACTIONS_EVENT}, {TRANSACTIONS_CHANGED_EVENT} from:body");

    let content = html! {
        (nav_bar)

        div
            hx-ext="sse"
            sse-connect=(endpoints::LIVE_TRANSACTIONS)
            class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-6"
            {
                @if let Some(alert) = alert {
                    (alert)
                }

                // Errors from the live feed are shown with the other alerts.
                div
                    sse-swap=(ALERT_EVENT)
                    hx-target="#alert-container"
                    hx-swap="innerHTML"
                    class="hidden"
                {}

                div class="flex items-center justify-between"
                {
                    h1 class="text-2xl font-bold" { "Dashboard" }

                    div class="w-48"
                    {
                        button
                            type="button"
                            hx-get=(endpoints::NEW_TRANSACTION_VIEW)
                            hx-target="#modal"
                            hx-target-error="#alert-container"
                            class=(BUTTON_PRIMARY_STYLE)
                        {
                            "New transaction"
                        }
                    }
                }

                div id="summary" sse-swap=(SUMMARY_EVENT)
                {
                    (summary_cards_view(&totals(transactions), currency_format))
                }

                section
                    id="chart-container"
                    hx-get=(endpoints::DASHBOARD_CHART)
                    hx-trigger=(reload_trigger)
                    hx-include="#chart-year"
                    hx-target-error="#alert-container"
                    class="w-full"
                {
                    (chart_fragment(transactions, year, currency_format))
                }

                (transactions_section(transactions, &TransactionFilter::default(), currency_format))
            }
        }
    };

    base("Dashboard", &[currency_input_styles(currency_format)], &content)
}

/// Display a page with an overview of the signed in user's transactions.
///
/// If the transactions cannot be read, the page is shown with an alert and
/// no transactions.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(identity): Extension<Identity>,
) -> Response {
    let (transactions, alert) = match state.transaction_store.snapshot(&identity.id).await {
        Ok(transactions) => (transactions, None),
        Err(error) => {
            tracing::error!("Could not load the dashboard for {}: {error}", identity.id);
            (Vec::new(), Some(Error::StoreRead(error).into_alert_markup()))
        }
    };

    let years = years_with_transactions(&transactions);
    let year = match chart_year(None, &years, &state.local_timezone) {
        Ok(year) => year,
        Err(error) => return error.into_response(),
    };

    dashboard_view(&identity, &transactions, year, alert, &state.currency_format).into_response()
}

/// The query string for the chart fragment.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    /// The year to chart. Defaults to the earliest year with transactions.
    pub year: Option<i32>,
}

/// Render the monthly chart for the year in the query string.
pub async fn get_dashboard_chart(
    State(state): State<DashboardState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ChartQuery>,
) -> Response {
    let transactions = match state.transaction_store.snapshot(&identity.id).await {
        Ok(transactions) => transactions,
        Err(error) => return Error::StoreRead(error).into_alert_response(),
    };

    let years = years_with_transactions(&transactions);
    match chart_year(query.year, &years, &state.local_timezone) {
        Ok(year) => chart_fragment(&transactions, year, &state.currency_format).into_response(),
        Err(error) => error.into_alert_response(),
    }
}
