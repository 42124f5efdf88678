//! Defines the endpoint for creating a new transaction.
use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::Identity,
    html::{CurrencyFormat, format_currency},
    transaction::{
        TransactionStore,
        form::{TransactionForm, saved_response},
    },
};

/// The state needed to create a transaction.
#[derive(Clone)]
pub struct CreateTransactionState {
    /// Where transactions are saved.
    pub transaction_store: Arc<dyn TransactionStore>,
    /// How amounts are displayed in the confirmation.
    pub currency_format: CurrencyFormat,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            currency_format: state.currency_format.clone(),
        }
    }
}

/// A route handler for creating a new transaction for the signed in user.
///
/// Responds with a success alert and closes the modal, or an error alert if
/// the form is invalid or the store rejects the transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let transaction = match form.into_new_transaction() {
        Ok(transaction) => transaction,
        Err(error) => return error.into_alert_response(),
    };
    let kind = transaction.kind();
    let amount = transaction.amount();

    if let Err(error) = state
        .transaction_store
        .create(&identity.id, transaction)
        .await
    {
        tracing::error!("could not create transaction for {}: {error}", identity.id);
        return Error::StoreWrite(error).into_alert_response();
    }

    saved_response(Alert::SuccessSimple {
        message: format!(
            "{} of {} was recorded",
            kind.label(),
            format_currency(amount, &state.currency_format)
        ),
    })
}

#[cfg(test)]
mod tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        html::CurrencyFormat,
        test_utils::{get_header, parse_html_fragment, test_identity, test_store},
        transaction::{
            TransactionStore,
            core::{Category, TransactionKind},
            form::TransactionForm,
        },
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn form(amount: &str, description: &str) -> TransactionForm {
        TransactionForm {
            kind: TransactionKind::Expense,
            amount: amount.to_owned(),
            date: date!(2025 - 10 - 05),
            description: description.to_owned(),
            category: Category::Food,
        }
    }

    #[tokio::test]
    async fn creates_transaction() {
        let store = test_store();
        let identity = test_identity();
        let state = CreateTransactionState {
            transaction_store: store.clone(),
            currency_format: CurrencyFormat::default(),
        };

        let response = create_transaction_endpoint(
            State(state),
            Extension(identity.clone()),
            Form(form("1234.5", "Groceries")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get_header(&response, "hx-trigger"), "transactions-changed");
        let html = parse_html_fragment(response).await;
        assert!(
            html.html().contains("Expense of $1,234.50 was recorded"),
            "got {}",
            html.html()
        );

        let transactions = store.snapshot(&identity.id).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "Groceries");
        assert_eq!(transactions[0].amount, Decimal::new(12345, 1));
        assert_eq!(transactions[0].owner_id, identity.id);
    }

    #[tokio::test]
    async fn invalid_form_is_not_saved() {
        let store = test_store();
        let identity = test_identity();
        let state = CreateTransactionState {
            transaction_store: store.clone(),
            currency_format: CurrencyFormat::default(),
        };

        let response = create_transaction_endpoint(
            State(state),
            Extension(identity.clone()),
            Form(form("-5", "Refund")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("hx-trigger").is_none());
        assert_eq!(store.snapshot(&identity.id).await, Ok(vec![]));
    }
}
