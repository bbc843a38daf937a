//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, expense::create_expense_tables, group::create_group_tables,
    user::create_user_table,
};

/// Create all the tables for the domain models if they do not exist yet.
///
/// The tables are created inside a single exclusive transaction, so either
/// all of them are created or none are. Foreign key enforcement is turned on
/// for `connection`.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_group_tables(&transaction)?;
    create_expense_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
