//! Defines the endpoint for deleting a transaction.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::Identity,
    transaction::{TransactionId, TransactionStore, form::saved_response},
};

/// The state needed to delete a transaction.
#[derive(Clone)]
pub struct DeleteTransactionState {
    /// Where transactions are saved.
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// The answer to the delete confirmation prompt.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    /// The user agreed to delete the transaction. Anything else leaves it in place.
    #[serde(default)]
    pub confirmed: bool,
}

/// The text of the prompt shown before deleting a transaction.
pub fn delete_confirmation_prompt(description: &str) -> String {
    format!("Delete transaction? \"{description}\" will be permanently removed.")
}

/// A route handler for deleting a transaction, responds with an alert.
///
/// Nothing is deleted unless the request says the user confirmed the prompt.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(identity): Extension<Identity>,
    Path(transaction_id): Path<TransactionId>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    if !query.confirmed {
        tracing::debug!("Delete of transaction {transaction_id} was not confirmed");
        return StatusCode::NO_CONTENT.into_response();
    }

    if let Err(error) = state
        .transaction_store
        .delete(&identity.id, transaction_id)
        .await
    {
        tracing::error!("Could not delete transaction {transaction_id}: {error}");
        return Error::StoreWrite(error).into_alert_response();
    }

    saved_response(Alert::SuccessSimple {
        message: "Transaction deleted".to_owned(),
    })
}
