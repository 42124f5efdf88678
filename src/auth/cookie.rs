//! Defines functions for keeping the signed-in identity in a private cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::Identity};

pub(crate) const COOKIE_SESSION: &str = "session";

/// The default duration for which session cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] with two digit hours so that
    //! times around midnight can be read back.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format for the cookie expiry, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The contents of the session cookie.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(crate) struct SessionToken {
    pub identity: Identity,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

/// Add a session cookie for `identity` that expires `duration` from now.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the token cannot be serialized.
pub fn set_session_cookie(
    jar: PrivateCookieJar,
    identity: &Identity,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = SessionToken {
        identity: identity.clone(),
        expires_at: OffsetDateTime::now_utc() + duration,
    };

    add_token(jar, &token)
}

fn add_token(jar: PrivateCookieJar, token: &SessionToken) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_SESSION, value))
            .path("/")
            .expires(token.expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

fn get_token(jar: &PrivateCookieJar) -> Result<SessionToken, Error> {
    let cookie = jar.get(COOKIE_SESSION).ok_or(Error::NotSignedIn)?;

    serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::NotSignedIn)
}

/// Get the signed-in identity from the session cookie.
///
/// # Errors
///
/// Returns an [Error::NotSignedIn] if the cookie is missing, invalid or expired.
pub fn get_identity_from_cookies(jar: &PrivateCookieJar) -> Result<Identity, Error> {
    let token = get_token(jar)?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::NotSignedIn);
    }

    Ok(token.identity)
}

/// Set the expiry of the session cookie in `jar` to the later of now plus
/// `duration` and the cookie's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns an [Error::NotSignedIn] if there is no valid session cookie.
pub fn extend_session_cookie_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let mut token = get_token(&jar)?;
    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidDateFormat("expiry overflowed".to_owned()))?;

    token.expires_at = max(token.expires_at, new_expiry);

    add_token(jar, &token)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset, macros::datetime};

    use crate::{
        Error,
        auth::{Identity, UserId},
    };

    use super::{
        COOKIE_SESSION, DEFAULT_COOKIE_DURATION, SessionToken, extend_session_cookie_if_needed,
        get_identity_from_cookies, invalidate_session_cookie, set_session_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    fn ana() -> Identity {
        Identity {
            id: UserId::new("u-ana"),
            display_name: "Ana".to_owned(),
            email: Some("ana@example.com".to_owned()),
            avatar_url: None,
        }
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[test]
    fn token_round_trips_at_midnight() {
        let token = SessionToken {
            identity: ana(),
            expires_at: datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC),
        };

        let json = serde_json::to_string(&token).unwrap();

        assert!(json.contains(r#""expires_at":"2025-12-21 00:00:00.0 +00:00:00""#));
        assert_eq!(serde_json::from_str::<SessionToken>(&json).unwrap(), token);
    }

    #[test]
    fn can_set_and_read_cookie() {
        let jar = set_session_cookie(get_jar(), &ana(), DEFAULT_COOKIE_DURATION).unwrap();

        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(get_identity_from_cookies(&jar), Ok(ana()));
        assert_date_time_close(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );
    }

    #[test]
    fn missing_cookie_is_not_signed_in() {
        assert_eq!(get_identity_from_cookies(&get_jar()), Err(Error::NotSignedIn));
    }

    #[test]
    fn expired_token_is_not_signed_in() {
        let jar = set_session_cookie(get_jar(), &ana(), Duration::seconds(-1)).unwrap();

        assert_eq!(get_identity_from_cookies(&jar), Err(Error::NotSignedIn));
    }

    #[test]
    fn can_extend_cookie_duration() {
        let jar = set_session_cookie(get_jar(), &ana(), Duration::seconds(5)).unwrap();

        let jar = extend_session_cookie_if_needed(jar, Duration::minutes(10)).unwrap();

        let cookie = jar.get(COOKIE_SESSION).unwrap();
        assert_date_time_close(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::minutes(10),
        );
        assert_eq!(get_identity_from_cookies(&jar), Ok(ana()));
    }

    #[test]
    fn cookie_duration_does_not_shrink() {
        let jar = set_session_cookie(get_jar(), &ana(), Duration::days(1)).unwrap();
        let want = jar.get(COOKIE_SESSION).unwrap().expires_datetime();

        let jar = extend_session_cookie_if_needed(jar, Duration::seconds(5)).unwrap();

        assert_eq!(jar.get(COOKIE_SESSION).unwrap().expires_datetime(), want);
    }

    #[test]
    fn invalidate_session_cookie_succeeds() {
        let jar = set_session_cookie(get_jar(), &ana(), DEFAULT_COOKIE_DURATION).unwrap();

        let jar = invalidate_session_cookie(jar);
        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(get_identity_from_cookies(&jar), Err(Error::NotSignedIn));
    }
}
