//! Code for creating the user table and keeping user profiles in the database.

use rusqlite::{Connection, OptionalExtension, params};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{Identity, UserId},
};

/// The profile stored for a user the first time they sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// The identity provider's ID for the user.
    pub id: UserId,
    /// The user's display name at the time the profile was created.
    pub name: String,
    /// The user's email address, if known.
    pub email: Option<String>,
    /// A URL for the user's profile picture, if any.
    pub avatar_url: Option<String>,
    /// When the profile was created.
    pub created_at: OffsetDateTime,
    /// When the profile was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                avatar_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a profile for `identity` unless one already exists.
///
/// Existing profiles are left untouched. Returns `true` if a profile was
/// created.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn ensure_user_profile(identity: &Identity, connection: &Connection) -> Result<bool, Error> {
    if get_user_profile(&identity.id, connection)?.is_some() {
        return Ok(false);
    }

    let now = OffsetDateTime::now_utc();
    connection.execute(
        "INSERT INTO users (id, name, email, avatar_url, created_at, updated_at) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            identity.id.as_str(),
            identity.display_name,
            identity.email,
            identity.avatar_url,
            now,
        ],
    )?;

    tracing::info!("created profile for user {}", identity.id);

    Ok(true)
}

/// Get the profile of the user `user_id`, or `None` if they have never signed in.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_user_profile(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Option<UserProfile>, Error> {
    connection
        .prepare(
            "SELECT id, name, email, avatar_url, created_at, updated_at FROM users WHERE id = ?1",
        )?
        .query_row(params![user_id.as_str()], |row| {
            Ok(UserProfile {
                id: UserId::new(row.get::<_, String>(0)?),
                name: row.get(1)?,
                email: row.get(2)?,
                avatar_url: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })
        .optional()
        .map_err(Error::from)
}
