//! Signing users in and out, and keeping track of who is signed in.
//!
//! An [IdentityProvider] verifies who the user is, the [SessionProvider]
//! tracks the signed-in [Identity], and a private session cookie carries the
//! identity between requests.

pub(crate) mod cookie;
mod identity;
mod middleware;
mod redirect;
mod session;
mod sign_in;
mod sign_out;
mod user;

pub use cookie::{
    DEFAULT_COOKIE_DURATION, get_identity_from_cookies, invalidate_session_cookie,
    set_session_cookie,
};
pub use identity::{
    AuthError, ForwardedHeaders, ForwardedIdentityProvider, Identity, IdentityProvider,
    SignInRequest, UserId, map_error_code,
};
pub use middleware::{auth_guard, auth_guard_hx};
pub use redirect::normalize_redirect_url;
pub use session::SessionProvider;
pub use sign_in::{get_sign_in_page, post_sign_in};
pub use sign_out::get_sign_out;
pub use user::{UserProfile, create_user_table, ensure_user_profile};
