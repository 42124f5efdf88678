//! The modal for editing an existing transaction.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    auth::Identity,
    endpoints::{self, format_endpoint},
    transaction::{
        Transaction, TransactionId, TransactionStore,
        form::{TransactionFormDefaults, modal, modal_buttons, transaction_form_fields},
    },
};

/// The state needed for the edit transaction modal.
#[derive(Clone)]
pub struct EditTransactionPageState {
    /// Where transactions are read from.
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

fn edit_transaction_view(transaction: &Transaction) -> Markup {
    let update_url = format_endpoint(endpoints::TRANSACTION_API, transaction.id.as_i64());
    let defaults = TransactionFormDefaults {
        kind: transaction.kind,
        amount: Some(transaction.amount),
        occurred_on: transaction.occurred_on,
        description: Some(&transaction.description),
        category: transaction.category,
    };

    let form = html! {
        form
            hx-put=(update_url)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4"
        {
            (transaction_form_fields(&defaults))
            (modal_buttons("Save changes"))
        }
    };

    modal("Edit transaction", form)
}

/// Renders the modal for editing one of the signed in user's transactions.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(identity): Extension<Identity>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let transactions = match state.transaction_store.snapshot(&identity.id).await {
        Ok(transactions) => transactions,
        Err(error) => return Error::StoreRead(error).into_alert_response(),
    };

    match transactions
        .iter()
        .find(|transaction| transaction.id == transaction_id)
    {
        Some(transaction) => edit_transaction_view(transaction).into_response(),
        None => Error::NotFound.into_alert_response(),
    }
}
