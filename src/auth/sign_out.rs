//! Signs the user out and removes the session cookie.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{
        IdentityProvider, SessionProvider, get_identity_from_cookies, invalidate_session_cookie,
    },
    endpoints,
};

/// The state needed to sign out.
#[derive(Clone)]
pub struct SignOutState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection shared with the session provider.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Ends the session with the identity provider.
    pub identity_provider: Arc<dyn IdentityProvider>,
    /// Where to send the user afterwards. Defaults to the sign-in page.
    pub sign_out_url: Option<String>,
}

impl FromRef<AppState> for SignOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
            identity_provider: state.identity_provider.clone(),
            sign_out_url: state.sign_out_url.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SignOutState> for Key {
    fn from_ref(state: &SignOutState) -> Self {
        state.cookie_key.clone()
    }
}

/// Invalidate the session cookie and redirect the client to the sign-in page.
///
/// Signing out without a session just clears the cookie. If the identity
/// provider refuses, the cookie is kept and an error page is shown.
pub async fn get_sign_out(State(state): State<SignOutState>, jar: PrivateCookieJar) -> Response {
    let identity = get_identity_from_cookies(&jar).ok();
    let session = SessionProvider::new(state.identity_provider, state.db_connection, identity);

    if let Err(error) = session.sign_out().await {
        return Error::Auth(error).into_response();
    }

    let redirect_url = state
        .sign_out_url
        .as_deref()
        .unwrap_or(endpoints::SIGN_IN_VIEW);

    (invalidate_session_cookie(jar), Redirect::to(redirect_url)).into_response()
}
