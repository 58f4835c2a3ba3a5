//! Database ID type definition.

/// Alias for the integer type used for the primary keys of every table.
///
/// Catalog entries and operations share this type, so a value taken from a
/// query string or form can be compared against any of them.
pub type DatabaseId = i64;
