//! Creates the application's database tables.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, post::create_post_table, profile::create_profile_table, user::create_user_table,
};

/// Create the tables for users, profiles, posts and tagged users if they do
/// not exist yet.
///
/// The tables are created in one exclusive transaction, so either all of
/// them exist afterwards or none of the missing ones were added.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_post_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
