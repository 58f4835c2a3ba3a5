//! Database operations for the catalog.
//!
//! The queries are generic over [CatalogKind]: table and column names come
//! from the catalog schema table, never from user input.

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};

use crate::{
    DatabaseId, Error,
    catalog::{CatalogDescriptor, CatalogEntry, CatalogKind, CatalogName},
};

/// Read access to the catalog, as needed to validate operations.
pub trait CatalogLookup {
    /// Get the entry of `kind` with `id`, or `None` if there is no such entry.
    ///
    /// # Errors
    /// Returns an error if the underlying storage fails.
    fn get(&self, kind: CatalogKind, id: DatabaseId) -> Result<Option<CatalogEntry>, Error>;

    /// Whether an entry of `kind` with `id` exists.
    ///
    /// # Errors
    /// Returns an error if the underlying storage fails.
    fn exists(&self, kind: CatalogKind, id: DatabaseId) -> Result<bool, Error> {
        Ok(self.get(kind, id)?.is_some())
    }
}

impl CatalogLookup for Connection {
    fn get(&self, kind: CatalogKind, id: DatabaseId) -> Result<Option<CatalogEntry>, Error> {
        find_catalog_entry(kind, id, self)
    }
}

/// The rows that are removed along with a catalog entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dependents {
    /// Categories of a type.
    pub categories: Vec<CatalogEntry>,
    /// Subcategories of a category, or of every category of a type ordered by
    /// category and then subcategory.
    pub subcategories: Vec<CatalogEntry>,
    /// The number of operations that reference the entry directly or through
    /// one of its descendants.
    pub operation_count: u64,
}

/// Create a catalog entry and return it with its generated ID.
///
/// `parent_id` is required for categories and subcategories and ignored for
/// statuses and types.
///
/// # Errors
/// Returns:
/// - [Error::MissingParent] if the kind has a parent and `parent_id` is `None`,
/// - [Error::InvalidParent] if `parent_id` does not refer to an existing entry
///   of the parent kind,
/// - [Error::SqlError] if the insert fails.
pub fn create_catalog_entry(
    kind: CatalogKind,
    name: CatalogName,
    parent_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<CatalogEntry, Error> {
    let descriptor = kind.descriptor();

    let parent_id = match &descriptor.parent {
        Some(parent) => {
            let parent_id = parent_id.ok_or(Error::MissingParent(kind))?;

            if !connection.exists(parent.kind, parent_id)? {
                return Err(Error::InvalidParent(kind));
            }

            connection.execute(
                &format!(
                    "INSERT INTO {} (name, {}) VALUES (?1, ?2);",
                    descriptor.table, parent.column
                ),
                (name.as_ref(), parent_id),
            )?;

            Some(parent_id)
        }
        None => {
            connection.execute(
                &format!("INSERT INTO {} (name) VALUES (?1);", descriptor.table),
                (name.as_ref(),),
            )?;

            None
        }
    };

    let id = connection.last_insert_rowid();

    Ok(CatalogEntry {
        kind,
        id,
        name,
        parent_id,
    })
}

/// Retrieve a single catalog entry by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no entry of `kind` with `id`.
pub fn get_catalog_entry(
    kind: CatalogKind,
    id: DatabaseId,
    connection: &Connection,
) -> Result<CatalogEntry, Error> {
    connection
        .prepare(&format!("{} WHERE id = :id;", select_clause(kind.descriptor())))?
        .query_row(&[(":id", &id)], |row| map_catalog_row(kind, row, 0))
        .map_err(|error| error.into())
}

/// Retrieve a single catalog entry by ID, returning `None` if it does not exist.
pub fn find_catalog_entry(
    kind: CatalogKind,
    id: DatabaseId,
    connection: &Connection,
) -> Result<Option<CatalogEntry>, Error> {
    connection
        .prepare(&format!("{} WHERE id = :id;", select_clause(kind.descriptor())))?
        .query_row(&[(":id", &id)], |row| map_catalog_row(kind, row, 0))
        .optional()
        .map_err(Error::from)
}

/// Retrieve the catalog entries of `kind` ordered by ID.
///
/// If `parent_id` is set and the kind has a parent, only the entries that
/// belong to that parent are returned. The filter is ignored for kinds
/// without a parent.
pub fn list_catalog_entries(
    kind: CatalogKind,
    parent_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<Vec<CatalogEntry>, Error> {
    let descriptor = kind.descriptor();
    let parent_filter = descriptor.parent.as_ref().zip(parent_id);

    let mut query = select_clause(descriptor);
    if let Some((parent, _)) = parent_filter {
        query.push_str(&format!(" WHERE {} = ?1", parent.column));
    }
    query.push_str(" ORDER BY id ASC;");

    let params = parent_filter.map(|(_, parent_id)| parent_id);

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| map_catalog_row(kind, row, 0))?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Update the name of a catalog entry.
///
/// The parent of a category or subcategory cannot be changed.
///
/// # Errors
/// Returns [Error::UpdateMissingCatalogEntry] if the entry does not exist.
pub fn update_catalog_entry_name(
    kind: CatalogKind,
    id: DatabaseId,
    new_name: CatalogName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        &format!("UPDATE {} SET name = ?1 WHERE id = ?2", kind.descriptor().table),
        (new_name.as_ref(), id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCatalogEntry(kind));
    }

    Ok(())
}

/// Delete a catalog entry by ID.
///
/// Every row that references the entry, directly or transitively, is removed
/// by the database's cascading foreign keys.
///
/// # Errors
/// Returns [Error::DeleteMissingCatalogEntry] if the entry does not exist.
pub fn delete_catalog_entry(
    kind: CatalogKind,
    id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        &format!("DELETE FROM {} WHERE id = ?1", kind.descriptor().table),
        [id],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCatalogEntry(kind));
    }

    Ok(())
}

/// Retrieve the subcategories of every category of a type, ordered by
/// category ID and then subcategory ID.
pub fn get_subcategories_for_type(
    type_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<CatalogEntry>, Error> {
    connection
        .prepare(
            "SELECT subcategory.id, subcategory.name, subcategory.category_id FROM subcategory \
            INNER JOIN category ON subcategory.category_id = category.id \
            WHERE category.type_id = ?1 \
            ORDER BY category.id ASC, subcategory.id ASC;",
        )?
        .query_map([type_id], |row| {
            map_catalog_row(CatalogKind::Subcategory, row, 0)
        })?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Get the rows that would be deleted along with the catalog entry.
pub fn get_dependents(
    kind: CatalogKind,
    id: DatabaseId,
    connection: &Connection,
) -> Result<Dependents, Error> {
    let (categories, subcategories) = match kind {
        CatalogKind::Status | CatalogKind::Subcategory => (Vec::new(), Vec::new()),
        CatalogKind::Type => (
            list_catalog_entries(CatalogKind::Category, Some(id), connection)?,
            get_subcategories_for_type(id, connection)?,
        ),
        CatalogKind::Category => (
            Vec::new(),
            list_catalog_entries(CatalogKind::Subcategory, Some(id), connection)?,
        ),
    };

    let operation_count = count_dependent_operations(kind, id, connection)?;

    Ok(Dependents {
        categories,
        subcategories,
        operation_count,
    })
}

fn count_dependent_operations(
    kind: CatalogKind,
    id: DatabaseId,
    connection: &Connection,
) -> Result<u64, Error> {
    let condition = match kind {
        CatalogKind::Status => "status_id = ?1",
        CatalogKind::Type => {
            "type_id = ?1 \
            OR category_id IN (SELECT id FROM category WHERE type_id = ?1) \
            OR subcategory_id IN ( \
                SELECT subcategory.id FROM subcategory \
                INNER JOIN category ON subcategory.category_id = category.id \
                WHERE category.type_id = ?1 \
            )"
        }
        CatalogKind::Category => {
            "category_id = ?1 \
            OR subcategory_id IN (SELECT id FROM subcategory WHERE category_id = ?1)"
        }
        CatalogKind::Subcategory => "subcategory_id = ?1",
    };

    let count: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM operation WHERE {condition};"),
        [id],
        |row| row.get(0),
    )?;

    Ok(count.max(0) as u64)
}

/// Initialize the catalog tables and indexes.
pub fn create_catalog_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS status (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS operation_type (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            type_id INTEGER NOT NULL REFERENCES operation_type(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_type_id ON category(type_id);

        CREATE TABLE IF NOT EXISTS subcategory (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_subcategory_category_id ON subcategory(category_id);",
    )?;

    Ok(())
}

fn select_clause(descriptor: &CatalogDescriptor) -> String {
    let parent_column = descriptor
        .parent
        .as_ref()
        .map_or("NULL", |parent| parent.column);

    format!(
        "SELECT id, name, {parent_column} FROM {}",
        descriptor.table
    )
}

/// Map the columns `id, name, parent_id` starting at `offset` to a catalog entry.
pub(crate) fn map_catalog_row(
    kind: CatalogKind,
    row: &Row,
    offset: usize,
) -> Result<CatalogEntry, rusqlite::Error> {
    let id = row.get(offset)?;
    let raw_name: String = row.get(offset + 1)?;
    let parent_id = row.get(offset + 2)?;

    Ok(CatalogEntry {
        kind,
        id,
        name: CatalogName::new_unchecked(&raw_name),
        parent_id,
    })
}
