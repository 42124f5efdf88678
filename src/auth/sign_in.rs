//! This file defines the routes for displaying the sign-in page and completing a sign-in.
//! The session provider handles talking to the identity provider and creating profiles.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::{
        IdentityProvider, SessionProvider, SignInRequest, invalidate_session_cookie,
        map_error_code, normalize_redirect_url, set_session_cookie,
    },
    endpoints,
    error::describe_auth_error,
    html::{BUTTON_PRIMARY_STYLE, auth_card, base, loading_spinner},
};

fn sign_in_form(redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::SIGN_IN_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Sign in with your account to see your income and expenses."
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Sign in"
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// The query string for the sign-in page.
#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    /// Where to go after signing in.
    pub redirect_url: Option<String>,
    /// An error code the identity provider sent back, e.g. "popup_blocked".
    pub error: Option<String>,
}

/// Display the sign-in page.
///
/// If the identity provider sent the user back with an error code, the
/// matching message is shown above the sign-in button.
pub async fn get_sign_in_page(Query(query): Query<SignInQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "sign-in query");
    let alert = query.error.as_deref().map(|code| {
        let (message, details) = describe_auth_error(&map_error_code(code));
        Alert::Error {
            message: message.to_owned(),
            details,
        }
    });

    let content = html! {
        @if let Some(alert) = alert {
            (alert.into_html())
        }

        (sign_in_form(redirect_url.as_deref()))
    };
    let content = auth_card("Sign in to your account", &content);

    base("Sign In", &[], &content).into_response()
}

/// The state needed to complete a sign-in.
#[derive(Clone)]
pub struct SignInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for storing user profiles.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Verifies who is signing in.
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl FromRef<AppState> for SignInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
            identity_provider: state.identity_provider.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SignInState> for Key {
    fn from_ref(state: &SignInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data sent by the sign-in form.
#[derive(Debug, Default, Deserialize)]
pub struct SignInForm {
    /// Optional URL to redirect to after signing in.
    pub redirect_url: Option<String>,
    /// An error code reported by the identity provider.
    pub error: Option<String>,
}

/// Handler for sign-in requests via the POST method.
///
/// On success the session cookie is set and the client is redirected to the
/// dashboard, or the page it came from. On failure an alert explaining the
/// problem is returned and no cookie is set.
pub async fn post_sign_in(
    State(state): State<SignInState>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
    Form(form): Form<SignInForm>,
) -> Response {
    let redirect_url = parse_redirect_url(form.redirect_url.as_deref(), "sign-in form");
    let session = SessionProvider::new(state.identity_provider, state.db_connection, None);
    let request = SignInRequest {
        headers,
        error: form.error,
    };

    let identity = match session.sign_in(&request).await {
        Ok(identity) => identity,
        Err(error) => return Error::Auth(error).into_alert_response(),
    };

    let redirect_url = redirect_url.unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

    set_session_cookie(jar.clone(), &identity, state.cookie_duration)
        .map(|updated_jar| (StatusCode::SEE_OTHER, HxRedirect(redirect_url), updated_jar))
        .map_err(|err| {
            tracing::error!("Error setting session cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_session_cookie(jar),
            )
        })
        .into_response()
}
