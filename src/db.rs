//! Creates the application's database tables.

use rusqlite::{Connection, TransactionBehavior};

use crate::{Error, catalog::create_catalog_tables, operation::create_operation_table};

/// Create the tables for the catalog and operations if they do not exist.
///
/// Foreign key enforcement is switched on for `connection` first, since
/// SQLite leaves it off by default and the catalog relies on `ON DELETE
/// CASCADE` to remove dependent rows.
///
/// # Errors
/// Returns an error if foreign keys cannot be enabled or if a table cannot be
/// created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // The pragma is a no-op inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_catalog_tables(&transaction)?;
    create_operation_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
