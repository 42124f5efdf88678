//! Defines the endpoint for updating a transaction.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::Response,
};
use axum_extra::extract::Form;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::Identity,
    transaction::{
        TransactionId, TransactionStore,
        form::{TransactionForm, saved_response},
    },
};

/// The state needed to edit a transaction.
#[derive(Clone)]
pub struct EditTransactionState {
    /// Where transactions are saved.
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// A route handler that replaces the fields of a transaction with the form values.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(identity): Extension<Identity>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let patch = match form.into_patch() {
        Ok(patch) => patch,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = state
        .transaction_store
        .update(&identity.id, transaction_id, patch)
        .await
    {
        tracing::error!("Could not update transaction {transaction_id}: {error}");
        return Error::StoreWrite(error).into_alert_response();
    }

    saved_response(Alert::SuccessSimple {
        message: "Changes saved".to_owned(),
    })
}
