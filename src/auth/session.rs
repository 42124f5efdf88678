//! The session provider: who is signed in, and notifications when that changes.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::watch;

use crate::{
    Error,
    auth::{AuthError, Identity, IdentityProvider, SignInRequest, user::ensure_user_profile},
};

/// Tracks the signed-in identity and signs users in and out through an
/// [IdentityProvider].
///
/// Clones share the same session.
#[derive(Clone)]
pub struct SessionProvider {
    identity_provider: Arc<dyn IdentityProvider>,
    db_connection: Arc<Mutex<Connection>>,
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl SessionProvider {
    /// Create a session starting with `identity`, e.g. one restored from a cookie.
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        db_connection: Arc<Mutex<Connection>>,
        identity: Option<Identity>,
    ) -> Self {
        let (current, _) = watch::channel(identity);

        Self {
            identity_provider,
            db_connection,
            current: Arc::new(current),
        }
    }

    /// The signed-in identity, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Subscribe to sign-in and sign-out events.
    ///
    /// The receiver starts with the current identity marked as seen. The web
    /// handlers build a new provider for every request and never listen, so
    /// this is only useful to callers that keep one session alive across
    /// sign-ins, such as a long-running client.
    pub fn changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    /// Sign in through the identity provider.
    ///
    /// A profile is created for first-time users. Failing to create the
    /// profile is logged but does not fail the sign-in.
    ///
    /// # Errors
    ///
    /// Returns the provider's [AuthError] unchanged.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<Identity, AuthError> {
        let identity = self
            .identity_provider
            .sign_in(request)
            .await
            .inspect_err(|error| tracing::warn!("sign-in failed: {error}"))?;

        if let Err(error) = self.ensure_profile(&identity) {
            tracing::error!("could not create profile for {}: {error}", identity.id);
        }

        tracing::info!("{} signed in", identity.id);
        self.current.send_replace(Some(identity.clone()));

        Ok(identity)
    }

    /// Sign out the current identity.
    ///
    /// Signing out when nobody is signed in does nothing.
    ///
    /// # Errors
    ///
    /// Returns the provider's [AuthError]. The session is kept in that case.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(identity) = self.current_identity() else {
            return Ok(());
        };

        self.identity_provider
            .sign_out(&identity)
            .await
            .inspect_err(|error| tracing::warn!("sign-out failed for {}: {error}", identity.id))?;

        tracing::info!("{} signed out", identity.id);
        self.current.send_replace(None);

        Ok(())
    }

    fn ensure_profile(&self, identity: &Identity) -> Result<bool, Error> {
        let connection = self
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        ensure_user_profile(identity, &connection)
    }
}
