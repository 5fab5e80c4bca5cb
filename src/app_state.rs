//! Implements a struct that holds the state of the REST server.

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_COOKIE_DURATION, PasswordHash},
    db::initialize,
    feed::{FeedSessions, POSTS_PER_PAGE},
    post::SqlitePostStore,
    timezone::check_timezone,
};

/// Settings for the server that are chosen at start up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The number of posts fetched for each page of the feed.
    pub feed_page_size: NonZeroUsize,
    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local_timezone: "Etc/UTC".to_owned(),
            feed_page_size: NonZeroUsize::new(POSTS_PER_PAGE).unwrap_or(NonZeroUsize::MIN),
            password_hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The open feeds of signed-in users.
    pub feed_sessions: FeedSessions<SqlitePostStore>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezoneError] if the configured timezone is
    /// unknown, or an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        config: AppConfig,
    ) -> Result<Self, Error> {
        check_timezone(&config.local_timezone)?;
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let feed_sessions = FeedSessions::new(
            SqlitePostStore::new(connection.clone()),
            config.feed_page_size.get(),
        );

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: config.local_timezone,
            password_hash_cost: config.password_hash_cost,
            db_connection: connection,
            feed_sessions,
        })
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
