//! Operation types and their storage.

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use time::Date;

use crate::{DatabaseId, Error, catalog::CatalogEntry};

/// Database identifier for an operation.
pub type OperationId = DatabaseId;

/// One recorded money movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The ID of the operation.
    pub id: OperationId,
    /// The date the operation was recorded.
    pub creation_date: Date,
    /// The ID of the operation's status.
    pub status_id: DatabaseId,
    /// The ID of the operation's type.
    pub type_id: DatabaseId,
    /// The ID of a category of the operation's type.
    pub category_id: DatabaseId,
    /// The ID of a subcategory of the operation's category.
    pub subcategory_id: DatabaseId,
    /// A non-negative amount with two decimal places.
    pub amount: Decimal,
    /// An optional note, never blank.
    pub comment: Option<String>,
}

/// An operation together with the catalog entries it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperation {
    pub operation: Operation,
    pub status: CatalogEntry,
    pub operation_type: CatalogEntry,
    pub category: CatalogEntry,
    pub subcategory: CatalogEntry,
}

/// An operation that has passed validation and may be written to the
/// database.
///
/// This type can only be produced by
/// [validate_operation](crate::operation::validate_operation), so every
/// operation in the database satisfies the type/category/subcategory
/// hierarchy at the time it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOperation {
    pub(super) creation_date: Date,
    pub(super) status_id: DatabaseId,
    pub(super) type_id: DatabaseId,
    pub(super) category_id: DatabaseId,
    pub(super) subcategory_id: DatabaseId,
    pub(super) amount: Decimal,
    pub(super) comment: Option<String>,
}

impl ValidOperation {
    /// The date the operation was recorded.
    pub fn creation_date(&self) -> Date {
        self.creation_date
    }

    /// The amount, rescaled to two decimal places.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The trimmed comment, if one was given.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Create an operation and return it with its generated ID.
pub fn create_operation(
    operation: ValidOperation,
    connection: &Connection,
) -> Result<Operation, Error> {
    connection.execute(
        "INSERT INTO operation \
        (creation_date, status_id, type_id, category_id, subcategory_id, amount, comment) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        (
            operation.creation_date,
            operation.status_id,
            operation.type_id,
            operation.category_id,
            operation.subcategory_id,
            operation.amount.to_string(),
            operation.comment.as_deref(),
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(into_operation(id, operation))
}

/// Replace every field of an existing operation.
///
/// # Errors
/// Returns [Error::UpdateMissingOperation] if the operation does not exist.
pub fn update_operation(
    id: OperationId,
    operation: ValidOperation,
    connection: &Connection,
) -> Result<Operation, Error> {
    let rows_affected = connection.execute(
        "UPDATE operation SET \
        creation_date = ?1, status_id = ?2, type_id = ?3, category_id = ?4, \
        subcategory_id = ?5, amount = ?6, comment = ?7 \
        WHERE id = ?8;",
        (
            operation.creation_date,
            operation.status_id,
            operation.type_id,
            operation.category_id,
            operation.subcategory_id,
            operation.amount.to_string(),
            operation.comment.as_deref(),
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingOperation);
    }

    Ok(into_operation(id, operation))
}

/// Retrieve a single operation by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the operation does not exist.
pub fn get_operation(id: OperationId, connection: &Connection) -> Result<Operation, Error> {
    connection
        .prepare(
            "SELECT id, creation_date, status_id, type_id, category_id, subcategory_id, \
            amount, comment FROM operation WHERE id = :id;",
        )?
        .query_row(&[(":id", &id)], |row| map_operation_row(row, 0))
        .map_err(|error| error.into())
}

/// Delete an operation by ID.
///
/// # Errors
/// Returns [Error::DeleteMissingOperation] if the operation does not exist.
pub fn delete_operation(id: OperationId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM operation WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingOperation);
    }

    Ok(())
}

/// Initialize the operation table and indexes.
///
/// Must be called after the catalog tables have been created.
pub fn create_operation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS operation (
            id INTEGER PRIMARY KEY,
            creation_date TEXT NOT NULL,
            status_id INTEGER NOT NULL REFERENCES status(id) ON DELETE CASCADE,
            type_id INTEGER NOT NULL REFERENCES operation_type(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            subcategory_id INTEGER NOT NULL REFERENCES subcategory(id) ON DELETE CASCADE,
            amount TEXT NOT NULL,
            comment TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_operation_creation_date ON operation(creation_date);
        CREATE INDEX IF NOT EXISTS idx_operation_status_id ON operation(status_id);
        CREATE INDEX IF NOT EXISTS idx_operation_type_id ON operation(type_id);
        CREATE INDEX IF NOT EXISTS idx_operation_category_id ON operation(category_id);
        CREATE INDEX IF NOT EXISTS idx_operation_subcategory_id ON operation(subcategory_id);",
    )?;

    Ok(())
}

fn into_operation(id: OperationId, operation: ValidOperation) -> Operation {
    Operation {
        id,
        creation_date: operation.creation_date,
        status_id: operation.status_id,
        type_id: operation.type_id,
        category_id: operation.category_id,
        subcategory_id: operation.subcategory_id,
        amount: operation.amount,
        comment: operation.comment,
    }
}

/// Map the columns `id, creation_date, status_id, type_id, category_id,
/// subcategory_id, amount, comment` starting at `offset` to an operation.
pub(super) fn map_operation_row(row: &Row, offset: usize) -> Result<Operation, rusqlite::Error> {
    Ok(Operation {
        id: row.get(offset)?,
        creation_date: row.get(offset + 1)?,
        status_id: row.get(offset + 2)?,
        type_id: row.get(offset + 3)?,
        category_id: row.get(offset + 4)?,
        subcategory_id: row.get(offset + 5)?,
        amount: get_amount(row, offset + 6)?,
        comment: row.get(offset + 7)?,
    })
}

/// Amounts are stored as decimal text so that they are read back exactly.
fn get_amount(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw_amount: String = row.get(index)?;

    Decimal::from_str_exact(&raw_amount).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}
