//! The form shared by the new and edit transaction modals, and the response
//! sent after a transaction is saved.

use axum::response::{IntoResponse, Response};
use axum_htmx::{HX_RESWAP, HX_RETARGET, HX_TRIGGER};
use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    alert::Alert,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, format_amount_input,
        loading_spinner,
    },
    transaction::core::{Category, NewTransaction, TransactionKind, TransactionPatch, parse_amount},
};

/// The event fired on the page body when a transaction is created, edited or deleted.
pub const TRANSACTIONS_CHANGED_EVENT: &str = "transactions-changed";

/// The values the form starts with.
pub struct TransactionFormDefaults<'a> {
    pub kind: TransactionKind,
    pub amount: Option<Decimal>,
    pub occurred_on: Date,
    pub description: Option<&'a str>,
    pub category: Category,
}

impl TransactionFormDefaults<'_> {
    /// An empty expense on `today`.
    pub fn new(today: Date) -> Self {
        Self {
            kind: TransactionKind::Expense,
            amount: None,
            occurred_on: today,
            description: None,
            category: Category::Food,
        }
    }
}

pub fn transaction_form_fields(defaults: &TransactionFormDefaults<'_>) -> Markup {
    let amount = defaults.amount.map(format_amount_input);

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for kind in TransactionKind::ALL {
                    @let id = format!("transaction-kind-{}", kind.as_str());

                    div class="flex flex-1 items-center"
                    {
                        input
                            name="kind"
                            id=(id)
                            type="radio"
                            value=(kind.as_str())
                            checked[kind == defaults.kind]
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(id) class=(FORM_RADIO_LABEL_STYLE)
                        {
                            (kind.label())
                        }
                    }
                }
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            // w-full needed to ensure input takes the full width when prefilled with a value
            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    required
                    autofocus
                    value=[amount.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.occurred_on)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=[defaults.description]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            select
                name="category"
                id="category"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for category in Category::ALL {
                    option value=(category.as_str()) selected[category == defaults.category]
                    {
                        (category.label())
                    }
                }
            }
        }
    }
}

/// Wrap `form` in a dialog that is swapped into the `#modal` container.
pub fn modal(title: &str, form: Markup) -> Markup {
    html! {
        div
            class="fixed inset-0 z-50 flex items-center justify-center bg-gray-900/50 p-4"
            role="dialog"
            aria-modal="true"
            aria-labelledby="modal-title"
        {
            div class="w-full max-w-md rounded-lg bg-white p-6 shadow dark:bg-gray-800 text-gray-900 dark:text-white"
            {
                h2 id="modal-title" class="mb-4 text-xl font-bold" { (title) }

                (form)
            }
        }
    }
}

/// The buttons at the bottom of a modal form.
pub fn modal_buttons(submit_text: &str) -> Markup {
    html! {
        div class="flex gap-4 pt-2"
        {
            button
                type="button"
                class=(BUTTON_SECONDARY_STYLE)
                onclick="document.getElementById('modal').replaceChildren()"
            {
                "Cancel"
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator"
                {
                    (loading_spinner())
                }
                (submit_text)
            }
        }
    }
}

/// The fields sent by the new and edit transaction forms.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// The amount as typed, e.g. "12.30".
    pub amount: String,
    /// The date the transaction happened.
    pub date: Date,
    /// What the transaction was for.
    pub description: String,
    /// How the transaction is grouped.
    pub category: Category,
}

impl TransactionForm {
    /// Validate the form as a new transaction.
    ///
    /// # Errors
    /// Returns an error if the amount or description is invalid.
    pub fn into_new_transaction(self) -> Result<NewTransaction, Error> {
        NewTransaction::new(
            self.kind,
            &self.description,
            parse_amount(&self.amount)?,
            self.category,
            self.date,
        )
    }

    /// Validate the form as an update that replaces every field.
    ///
    /// # Errors
    /// Returns an error if the amount or description is invalid.
    pub fn into_patch(self) -> Result<TransactionPatch, Error> {
        Ok(TransactionPatch::new()
            .kind(self.kind)
            .description(&self.description)?
            .amount(parse_amount(&self.amount)?)?
            .category(self.category)
            .occurred_on(self.date))
    }
}

/// Show `alert`, close the modal and tell the page the transactions changed.
pub fn saved_response(alert: Alert) -> Response {
    (
        [
            (HX_RETARGET, "#alert-container"),
            (HX_RESWAP, "innerHTML"),
            (HX_TRIGGER, TRANSACTIONS_CHANGED_EVENT),
        ],
        html! {
            (alert.into_html())
            div id="modal" hx-swap-oob="true" {}
        },
    )
        .into_response()
}
