//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_COOKIE_DURATION, IdentityProvider},
    db::initialize,
    html::CurrencyFormat,
    transaction::{SqliteTransactionStore, TransactionStore},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// How amounts are displayed.
    pub currency_format: CurrencyFormat,

    /// Where to send users after they sign out, e.g. the proxy's sign out page.
    ///
    /// Defaults to the sign in page.
    pub sign_out_url: Option<String>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Where transactions are kept.
    pub transaction_store: Arc<dyn TransactionStore>,

    /// Verifies who is signing in.
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        currency_format: CurrencyFormat,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let transaction_store = Arc::new(SqliteTransactionStore::new(connection.clone()));

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            currency_format,
            sign_out_url: None,
            db_connection: connection,
            transaction_store,
            identity_provider,
        })
    }

    /// Send users to `sign_out_url` after they sign out.
    pub fn with_sign_out_url(mut self, sign_out_url: Option<String>) -> Self {
        self.sign_out_url = sign_out_url;
        self
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
