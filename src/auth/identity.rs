//! Identities, the identity provider interface and the provider that trusts a
//! single sign-on proxy in front of the app.

use std::fmt::Display;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// The stable ID an identity provider assigns to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an ID issued by an identity provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed-in user as described by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The provider's ID for the user.
    pub id: UserId,
    /// The name to greet the user with.
    pub display_name: String,
    /// The user's email address, if the provider shared it.
    pub email: Option<String>,
    /// A URL for the user's profile picture, if any.
    pub avatar_url: Option<String>,
}

/// Why signing in or out failed.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    /// The browser blocked the provider's sign-in window.
    #[error("the sign-in popup was blocked")]
    PopupBlocked,

    /// The user closed the sign-in window or another sign-in was already in progress.
    #[error("the sign-in was cancelled")]
    Cancelled,

    /// Any other failure, with the provider's message.
    #[error("could not sign in: {0}")]
    Other(String),
}

/// Everything an identity provider may look at when signing a user in.
#[derive(Debug, Clone, Default)]
pub struct SignInRequest {
    /// The headers of the sign-in request.
    pub headers: HeaderMap,
    /// An error code the provider reported back to the app, if any.
    pub error: Option<String>,
}

/// An external service that authenticates users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate the user behind `request`.
    async fn sign_in(&self, request: &SignInRequest) -> Result<Identity, AuthError>;

    /// End the provider side session of `identity`.
    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthError>;
}

/// The header names a [ForwardedIdentityProvider] reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedHeaders {
    /// The header holding the user's ID. Sign-in fails without it.
    pub user: String,
    /// The header holding the user's email address.
    pub email: String,
    /// The header holding the user's display name.
    pub display_name: String,
    /// The header holding a URL to the user's profile picture.
    pub avatar_url: String,
}

impl Default for ForwardedHeaders {
    fn default() -> Self {
        Self {
            user: "x-forwarded-user".to_owned(),
            email: "x-forwarded-email".to_owned(),
            display_name: "x-forwarded-preferred-username".to_owned(),
            avatar_url: "x-forwarded-avatar-url".to_owned(),
        }
    }
}

/// Trusts the identity headers set by an authenticating reverse proxy, such
/// as oauth2-proxy, in front of the app.
///
/// Only deploy this behind a proxy that strips these headers from client
/// requests.
#[derive(Debug, Clone, Default)]
pub struct ForwardedIdentityProvider {
    headers: ForwardedHeaders,
}

impl ForwardedIdentityProvider {
    /// Create a provider that reads `headers`.
    pub fn new(headers: ForwardedHeaders) -> Self {
        Self { headers }
    }
}

#[async_trait]
impl IdentityProvider for ForwardedIdentityProvider {
    async fn sign_in(&self, request: &SignInRequest) -> Result<Identity, AuthError> {
        if let Some(code) = &request.error {
            return Err(map_error_code(code));
        }

        let id = header_value(&request.headers, &self.headers.user).ok_or_else(|| {
            AuthError::Other(format!(
                "the sign-in proxy did not send the {} header",
                self.headers.user
            ))
        })?;
        let email = header_value(&request.headers, &self.headers.email);
        let display_name = header_value(&request.headers, &self.headers.display_name)
            .or_else(|| email.clone())
            .unwrap_or_else(|| id.clone());

        Ok(Identity {
            id: UserId::new(id),
            display_name,
            email,
            avatar_url: header_value(&request.headers, &self.headers.avatar_url),
        })
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthError> {
        // The proxy owns the upstream session, the app only drops its own cookie.
        tracing::debug!("signing out {}", identity.id);
        Ok(())
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Map an error code reported by a provider to an [AuthError].
pub fn map_error_code(code: &str) -> AuthError {
    match code {
        "popup_blocked" | "popup-blocked" => AuthError::PopupBlocked,
        "cancelled_popup_request" | "popup_closed_by_user" | "access_denied" => {
            AuthError::Cancelled
        }
        other => AuthError::Other(other.to_owned()),
    }
}
