//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element of the base page
//! and can be dismissed by the user.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A dismissable message shown after an action succeeds or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// The action succeeded, with more details below the message.
    Success {
        /// The headline.
        message: String,
        /// More details.
        details: String,
    },
    /// The action succeeded.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// The action failed, with details on how to fix it.
    Error {
        /// The headline.
        message: String,
        /// More details, usually how to fix the problem.
        details: String,
    },
    /// The action failed.
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

const SUCCESS_STYLE: &str = "flex items-start gap-3 p-4 mb-4 rounded-lg shadow \
    text-green-800 bg-green-50 border border-green-300 \
    dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start gap-3 p-4 mb-4 rounded-lg shadow \
    text-red-800 bg-red-50 border border-red-300 \
    dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (style, role, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, "status", message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, "status", message, None),
            Alert::Error { message, details } => (ERROR_STYLE, "alert", message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, "alert", message, None),
        };

        html! {
            div class=(style) role=(role) data-alert
            {
                div class="flex-1 text-sm"
                {
                    p class="font-semibold" { (message) }

                    @if let Some(details) = details.filter(|details| !details.is_empty())
                    {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="ms-auto -my-1.5 p-1.5 rounded-lg hover:opacity-75"
                    onclick="this.closest('[data-alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_has_message_and_details() {
        let html = Alert::Error {
            message: "Could not save transaction".to_owned(),
            details: "Try again.".to_owned(),
        }
        .into_html()
        .into_string();

        let document = Html::parse_fragment(&html);
        let alert = document
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("alert element missing");
        let text = alert.text().collect::<String>();
        assert!(text.contains("Could not save transaction"));
        assert!(text.contains("Try again."));
    }

    #[test]
    fn simple_alert_has_no_details() {
        let html = Alert::SuccessSimple {
            message: "Transaction deleted".to_owned(),
        }
        .into_html()
        .into_string();

        let document = Html::parse_fragment(&html);
        let paragraphs = document.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraphs, 1);
        assert!(html.contains(r#"role="status""#));
    }
}
