//! The authentication service that creates accounts and checks credentials.

use std::{
    future::Future,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{
    Error, PasswordHash, UserID, ValidatedPassword,
    user::{create_user, get_user_by_email},
    validation::{PASSWORD_RULE_MESSAGE, is_email},
};

/// Why the authentication service refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    WeakPassword,
    EmailAlreadyInUse,
    InvalidEmail,
    InvalidCredential,
    UserNotFound,
    NetworkFailure,
    Unknown,
}

impl AuthErrorKind {
    /// The message to show above the form when a request is refused.
    pub fn user_message(self) -> &'static str {
        match self {
            AuthErrorKind::WeakPassword => PASSWORD_RULE_MESSAGE,
            AuthErrorKind::EmailAlreadyInUse => "The email address is already in use.",
            AuthErrorKind::InvalidEmail => "The email address is invalid.",
            AuthErrorKind::InvalidCredential => {
                "Invalid credentials, please check your email or password"
            }
            AuthErrorKind::UserNotFound => "User not found.",
            AuthErrorKind::NetworkFailure => "Network error. Please check your connection.",
            AuthErrorKind::Unknown => "An unexpected error occurred.",
        }
    }
}

impl From<Error> for AuthErrorKind {
    fn from(error: Error) -> Self {
        match error {
            Error::TooWeak(_) => AuthErrorKind::WeakPassword,
            Error::DuplicateEmail => AuthErrorKind::EmailAlreadyInUse,
            Error::InvalidCredentials | Error::NotFound => AuthErrorKind::InvalidCredential,
            Error::DatabaseLockError => AuthErrorKind::NetworkFailure,
            error => {
                tracing::error!("Unhandled authentication error: {error}");
                AuthErrorKind::Unknown
            }
        }
    }
}

/// Creates accounts and signs users in and out.
pub trait Authenticator: Clone + Send + Sync + 'static {
    /// Register a new account and return its ID.
    fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserID, AuthErrorKind>> + Send;

    /// Check the credentials of an existing account and return its ID.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserID, AuthErrorKind>> + Send;

    /// End the account's session with the service.
    fn sign_out(&self, user_id: UserID) -> impl Future<Output = ()> + Send;
}

/// An [Authenticator] that stores accounts in the SQLite user table.
#[derive(Debug, Clone)]
pub struct SqliteAuthenticator {
    connection: Arc<Mutex<Connection>>,
    hash_cost: u32,
}

impl SqliteAuthenticator {
    /// Create an authenticator that hashes passwords with bcrypt `hash_cost`.
    pub fn new(connection: Arc<Mutex<Connection>>, hash_cost: u32) -> Self {
        Self {
            connection,
            hash_cost,
        }
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        operation(&connection)
    }
}

impl Authenticator for SqliteAuthenticator {
    async fn create_account(&self, email: &str, password: &str) -> Result<UserID, AuthErrorKind> {
        if !is_email(email.trim()) {
            return Err(AuthErrorKind::InvalidEmail);
        }

        let password = ValidatedPassword::new(password)?;
        let password_hash = PasswordHash::new(password, self.hash_cost)?;
        let user = self.with_connection(|connection| {
            create_user(email, password_hash, connection)
        })?;

        tracing::info!("Created account {}", user.id);

        Ok(user.id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserID, AuthErrorKind> {
        let user = self.with_connection(|connection| get_user_by_email(email, connection))?;

        match user.password_hash.verify(password) {
            Ok(true) => Ok(user.id),
            Ok(false) => Err(AuthErrorKind::InvalidCredential),
            Err(error) => {
                tracing::error!("Could not verify password for user {}: {error}", user.id);
                Err(AuthErrorKind::Unknown)
            }
        }
    }

    async fn sign_out(&self, user_id: UserID) {
        tracing::debug!("Signed out user {user_id}");
    }
}


#[cfg(test)]
mod sqlite_authenticator_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::user::create_user_table;

    use super::{AuthErrorKind, Authenticator, SqliteAuthenticator};

    fn get_authenticator() -> SqliteAuthenticator {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();

        SqliteAuthenticator::new(Arc::new(Mutex::new(connection)), 4)
    }

    #[tokio::test]
    async fn can_create_account_and_sign_in() {
        let authenticator = get_authenticator();

        let created = authenticator
            .create_account("alice@example.com", "Abcdef1!")
            .await
            .unwrap();
        let signed_in = authenticator
            .sign_in("Alice@Example.com", "Abcdef1!")
            .await
            .unwrap();

        assert_eq!(created, signed_in);
    }

    #[tokio::test]
    async fn create_account_rejects_bad_input() {
        let authenticator = get_authenticator();

        assert_eq!(
            authenticator.create_account("alice", "Abcdef1!").await,
            Err(AuthErrorKind::InvalidEmail)
        );
        assert_eq!(
            authenticator
                .create_account("alice@example.com", "abcdefg1")
                .await,
            Err(AuthErrorKind::WeakPassword)
        );
    }

    #[tokio::test]
    async fn create_account_rejects_duplicate_email() {
        let authenticator = get_authenticator();
        authenticator
            .create_account("alice@example.com", "Abcdef1!")
            .await
            .unwrap();

        let result = authenticator
            .create_account("alice@example.com", "Ghijkl2@")
            .await;

        assert_eq!(result, Err(AuthErrorKind::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn sign_in_rejects_wrong_password_and_unknown_email() {
        let authenticator = get_authenticator();
        authenticator
            .create_account("alice@example.com", "Abcdef1!")
            .await
            .unwrap();

        assert_eq!(
            authenticator.sign_in("alice@example.com", "Abcdef1?").await,
            Err(AuthErrorKind::InvalidCredential)
        );
        assert_eq!(
            authenticator.sign_in("bob@example.com", "Abcdef1!").await,
            Err(AuthErrorKind::InvalidCredential)
        );
    }

    #[test]
    fn every_kind_has_a_message() {
        assert_eq!(
            AuthErrorKind::EmailAlreadyInUse.user_message(),
            "The email address is already in use."
        );
        assert_eq!(
            AuthErrorKind::Unknown.user_message(),
            "An unexpected error occurred."
        );
    }
}
