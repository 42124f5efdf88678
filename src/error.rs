//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use maud::Markup;
use rust_decimal::Decimal;

use crate::{
    alert::Alert,
    auth::AuthError,
    endpoints,
    internal_server_error::InternalServerError,
    not_found::NotFoundError,
    transaction::{StoreReadError, StoreWriteError},
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// Signing in or out through the identity provider failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The transaction store could not save a change.
    #[error(transparent)]
    StoreWrite(#[from] StoreWriteError),

    /// The transaction store could not be read.
    #[error(transparent)]
    StoreRead(#[from] StoreReadError),

    /// A transaction description was empty or only whitespace.
    #[error("the description cannot be empty")]
    EmptyDescription,

    /// The text entered as an amount is not a number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A negative amount was used for a transaction.
    ///
    /// Whether money comes in or goes out is set by the transaction kind, so
    /// amounts are never negative.
    #[error("{0} is negative, amounts must be zero or more")]
    NegativeAmount(Decimal),

    /// An amount was larger than [crate::transaction::MAX_AMOUNT].
    #[error("{0} is more than the largest allowed amount")]
    AmountTooLarge(Decimal),

    /// There is no valid session cookie in the request.
    #[error("no user is signed in")]
    NotSignedIn,

    /// The session cookie expiry could not be computed.
    #[error("could not compute the session expiry: {0}")]
    InvalidDateFormat(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The title and details to show the user when signing in fails.
pub fn describe_auth_error(error: &AuthError) -> (&'static str, String) {
    match error {
        AuthError::PopupBlocked => (
            "Sign-in popup blocked",
            "Allow popups for this site and try again.".to_owned(),
        ),
        AuthError::Cancelled => (
            "Sign-in cancelled",
            "Wait for the previous sign-in window to close and try again.".to_owned(),
        ),
        AuthError::Other(message) => ("Could not sign in", message.clone()),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound | Error::StoreWrite(StoreWriteError::NotFound(_)) => {
                NotFoundError.into_response()
            }
            Error::NotSignedIn => Redirect::to(endpoints::SIGN_IN_VIEW).into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::StoreRead(error) => {
                tracing::error!("Could not load transactions: {error}");
                InternalServerError {
                    description: "Could not load transactions",
                    fix: "Try again later or check the server logs",
                }
                .into_response()
            }
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = self.into_alert();

        (status_code, alert.into_html()).into_response()
    }

    /// Render the error as an alert, for responses that show it next to other content.
    pub fn into_alert_markup(self) -> Markup {
        self.into_alert().1.into_html()
    }

    fn into_alert(self) -> (StatusCode, Alert) {
        match self {
            Error::Auth(error) => {
                let (message, details) = describe_auth_error(&error);
                let status_code = match error {
                    AuthError::Other(_) => StatusCode::UNAUTHORIZED,
                    AuthError::PopupBlocked | AuthError::Cancelled => StatusCode::BAD_REQUEST,
                };

                (
                    status_code,
                    Alert::Error {
                        message: message.to_owned(),
                        details,
                    },
                )
            }
            Error::StoreWrite(StoreWriteError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not save transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::StoreWrite(StoreWriteError::Rejected(reason)) => {
                tracing::warn!("Transaction was rejected: {reason}");
                (
                    StatusCode::BAD_REQUEST,
                    Alert::Error {
                        message: "Could not save transaction".to_owned(),
                        details: "Check the details of the transaction and try again.".to_owned(),
                    },
                )
            }
            Error::StoreWrite(StoreWriteError::Backend(reason)) => {
                tracing::error!("Could not write transaction: {reason}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Could not save transaction".to_owned(),
                        details: "Try again later or check the server logs.".to_owned(),
                    },
                )
            }
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Transaction not found".to_owned(),
                    details: "It may have been deleted. Try refreshing the page.".to_owned(),
                },
            ),
            Error::StoreRead(error) => {
                tracing::error!("Could not load transactions: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Could not load transactions".to_owned(),
                        details: "Try again later or check the server logs.".to_owned(),
                    },
                )
            }
            Error::EmptyDescription => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Enter a description for the transaction.".to_owned(),
                },
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("\"{amount}\" is not a number. Enter an amount like 12.30."),
                },
            ),
            Error::NegativeAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!(
                        "{amount} is negative. Enter the amount without a sign and \
                        choose income or expense instead."
                    ),
                },
            ),
            Error::AmountTooLarge(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!(
                        "{amount} is too large. Amounts can be at most {}.",
                        crate::transaction::MAX_AMOUNT
                    ),
                },
            ),
            Error::NotSignedIn => (
                StatusCode::UNAUTHORIZED,
                Alert::Error {
                    message: "You are signed out".to_owned(),
                    details: "Sign in again to continue.".to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rust_decimal::Decimal;

    use crate::{
        auth::AuthError,
        transaction::{StoreWriteError, TransactionId},
    };

    use super::Error;

    #[test]
    fn sql_no_rows_is_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn alert_status_codes() {
        let cases = [
            (Error::Auth(AuthError::PopupBlocked), StatusCode::BAD_REQUEST),
            (Error::Auth(AuthError::Cancelled), StatusCode::BAD_REQUEST),
            (
                Error::Auth(AuthError::Other("nope".to_owned())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                Error::StoreWrite(StoreWriteError::NotFound(TransactionId::new(1))),
                StatusCode::NOT_FOUND,
            ),
            (
                Error::StoreWrite(StoreWriteError::Rejected("constraint".to_owned())),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::StoreWrite(StoreWriteError::Backend("disk".to_owned())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::EmptyDescription, StatusCode::BAD_REQUEST),
            (
                Error::NegativeAmount(Decimal::new(-1, 0)),
                StatusCode::BAD_REQUEST,
            ),
            (Error::AmountTooLarge(Decimal::MAX), StatusCode::BAD_REQUEST),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want) in cases {
            let description = error.to_string();
            let response = error.into_alert_response();
            assert_eq!(response.status(), want, "status for {description}");
        }
    }

    #[test]
    fn not_signed_in_page_redirects_to_sign_in() {
        let response = Error::NotSignedIn.into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
