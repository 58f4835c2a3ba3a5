//! Core catalog domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{DatabaseId, Error, catalog::CatalogKind};

/// The maximum number of characters in a catalog entry name.
pub const MAX_NAME_LENGTH: usize = 50;

/// A validated catalog entry name: trimmed, non-empty and at most
/// [MAX_NAME_LENGTH] characters long.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CatalogName(String);

impl CatalogName {
    /// Create a catalog name.
    ///
    /// # Errors
    ///
    /// This function will return:
    /// - [Error::EmptyCatalogName] if `name` is empty or only whitespace,
    /// - [Error::CatalogNameTooLong] if the trimmed name has more than
    ///   [MAX_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCatalogName)
        } else if name.chars().count() > MAX_NAME_LENGTH {
            Err(Error::CatalogNameTooLong)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a catalog name without validation.
    ///
    /// Only used for names read back from the database, which were validated
    /// on the way in.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CatalogName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CatalogName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatalogName::new(s)
    }
}

impl Display for CatalogName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row of one of the catalog tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CatalogEntry {
    /// The catalog table the entry belongs to.
    pub kind: CatalogKind,
    /// The ID of the entry within its table.
    pub id: DatabaseId,
    /// The display name.
    pub name: CatalogName,
    /// The type of a category or the category of a subcategory.
    /// Always `None` for statuses and types.
    pub parent_id: Option<DatabaseId>,
}

/// Form data for catalog entry creation and editing.
///
/// `parent` is only read when creating a category or subcategory.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFormData {
    pub name: String,
    #[serde(default)]
    pub parent: Option<DatabaseId>,
}
