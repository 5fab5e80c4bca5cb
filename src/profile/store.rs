//! Profiles and the SQLite store that keeps them.

use std::{
    future::Future,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{Error, UserID, store::StoreErrorKind};

/// The personal details of a registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: UserID,
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: String,
    pub email: String,
    /// The URI of the profile image.
    pub image: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Profile {
    /// The user's full name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Persistent storage for profiles, keyed by account.
pub trait ProfileStore: Clone + Send + Sync + 'static {
    /// Create the profile, or replace it if the account already has one.
    fn put_profile(&self, profile: Profile)
    -> impl Future<Output = Result<(), StoreErrorKind>> + Send;

    /// Get the profile of `user_id`.
    fn get_profile(
        &self,
        user_id: UserID,
    ) -> impl Future<Output = Result<Profile, StoreErrorKind>> + Send;
}

/// Create the profile table.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
            user_id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            mobile_no TEXT NOT NULL,
            email TEXT NOT NULL,
            image TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Insert `profile`, or overwrite the stored profile for the same user.
///
/// The creation time of an existing profile is kept.
pub fn upsert_profile(profile: &Profile, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO profile
            (user_id, first_name, last_name, mobile_no, email, image, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(user_id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            mobile_no = excluded.mobile_no,
            email = excluded.email,
            image = excluded.image,
            updated_at = excluded.updated_at",
        (
            profile.user_id.as_i64(),
            &profile.first_name,
            &profile.last_name,
            &profile.mobile_no,
            &profile.email,
            &profile.image,
            profile.created_at.unix_timestamp(),
            profile.updated_at.unix_timestamp(),
        ),
    )?;

    Ok(())
}

/// Get the profile of `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user has no profile.
pub fn get_profile(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    connection
        .prepare(
            "SELECT user_id, first_name, last_name, mobile_no, email, image, created_at, updated_at
            FROM profile WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    let timestamp = |column: usize| -> Result<OffsetDateTime, rusqlite::Error> {
        OffsetDateTime::from_unix_timestamp(row.get(column)?).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(column, Type::Integer, Box::new(error))
        })
    };

    Ok(Profile {
        user_id: UserID::new(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        mobile_no: row.get(3)?,
        email: row.get(4)?,
        image: row.get(5)?,
        created_at: timestamp(6)?,
        updated_at: timestamp(7)?,
    })
}

/// The SQLite implementation of [ProfileStore].
#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteProfileStore {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, StoreErrorKind> {
        let connection = self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            StoreErrorKind::from(Error::DatabaseLockError)
        })?;

        operation(&connection).map_err(StoreErrorKind::from)
    }
}

impl ProfileStore for SqliteProfileStore {
    async fn put_profile(&self, profile: Profile) -> Result<(), StoreErrorKind> {
        self.with_connection(|connection| upsert_profile(&profile, connection))
    }

    async fn get_profile(&self, user_id: UserID) -> Result<Profile, StoreErrorKind> {
        self.with_connection(|connection| get_profile(user_id, connection))
    }
}

#[cfg(test)]
pub(crate) fn test_profile(user_id: UserID) -> Profile {
    let created_at = time::macros::datetime!(2025-01-01 09:00 UTC);

    Profile {
        user_id,
        first_name: "Alice".to_owned(),
        last_name: "Smith".to_owned(),
        mobile_no: "0211234567".to_owned(),
        email: "alice@example.com".to_owned(),
        image: "https://example.com/alice.png".to_owned(),
        created_at,
        updated_at: created_at,
    }
}
