//! The modal for creating a new transaction.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    AppState, endpoints,
    timezone::local_today,
    transaction::form::{TransactionFormDefaults, modal, modal_buttons, transaction_form_fields},
};

/// The state needed for the new transaction modal.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn new_transaction_view(today: Date) -> Markup {
    let form = html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4"
        {
            (transaction_form_fields(&TransactionFormDefaults::new(today)))
            (modal_buttons("Add transaction"))
        }
    };

    modal("New transaction", form)
}

/// Renders the modal for creating a transaction, dated today.
pub async fn get_new_transaction_page(State(state): State<NewTransactionPageState>) -> Response {
    match local_today(&state.local_timezone) {
        Ok(today) => new_transaction_view(today).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button_with_text, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_fragment,
        },
    };

    use super::{NewTransactionPageState, get_new_transaction_page};

    #[tokio::test]
    async fn renders_form() {
        let state = NewTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_new_transaction_page(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "date");
        assert_form_input(&form, "description", "text");
        assert_form_submit_button_with_text(&form, "Add transaction");
    }

    #[tokio::test]
    async fn invalid_timezone_returns_alert() {
        let state = NewTransactionPageState {
            local_timezone: "Not/AZone".to_owned(),
        };

        let response = get_new_transaction_page(State(state)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
