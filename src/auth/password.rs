//! Strong passwords and their bcrypt hashes.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    validation::{PASSWORD_RULE_MESSAGE, is_strong_password},
};

/// A password that passed the strength rules, but is not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// This function will return [Error::TooWeak] if the password is shorter
    /// than eight characters or is missing a lowercase letter, an uppercase
    /// letter, a digit or a symbol.
    pub fn new(raw_password_string: &str) -> Result<Self, Error> {
        if is_strong_password(raw_password_string) {
            Ok(Self(raw_password_string.to_string()))
        } else {
            Err(Error::TooWeak(PASSWORD_RULE_MESSAGE.to_owned()))
        }
    }

    /// Wrap `raw_password_string` without checking its strength.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with bcrypt using `cost` rounds.
    ///
    /// Tests use a cost of 4 to stay fast, the server uses
    /// [PasswordHash::DEFAULT_COST] unless configured otherwise.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check that `raw_password` matches the stored password.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
