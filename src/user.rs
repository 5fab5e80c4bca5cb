//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An account that can sign in.
///
/// The caller should ensure that `id` and `email` are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The normalized email address the user signs in with.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The name of a user, as shown in tagging suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserID,
    pub first_name: String,
    pub last_name: String,
}

impl UserSummary {
    /// The user's first and last name separated by a space.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Lowercase and trim an email address so that lookups ignore case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// `email` is normalized before it is stored.
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if the email is already registered, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let email = normalize_email(email);

    connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        (&email, password_hash.as_ref()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email address.
pub fn get_user_by_email(email: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &normalize_email(email))], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Get the names of every user with a profile, sorted by name.
pub fn get_user_summaries(connection: &Connection) -> Result<Vec<UserSummary>, Error> {
    connection
        .prepare(
            "SELECT user_id, first_name, last_name FROM profile
            ORDER BY first_name ASC, last_name ASC",
        )?
        .query_map([], |row| {
            Ok(UserSummary {
                id: UserID::new(row.get(0)?),
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?
        .map(|maybe_user| maybe_user.map_err(|error| error.into()))
        .collect()
}

fn map_user_row(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let email = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(raw_id),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Insert an account with a fixed `user_id` so rows that reference it can be
/// created in tests.
#[cfg(test)]
pub(crate) fn insert_test_user(user_id: UserID, connection: &Connection) {
    connection
        .execute(
            "INSERT INTO user (id, email, password) VALUES (?1, ?2, ?3)",
            (
                user_id.as_i64(),
                format!("user{user_id}@example.com"),
                "$2b$04$notarealhash",
            ),
        )
        .expect("Could not create test user");
}
