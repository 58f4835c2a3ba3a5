//! The static schema table for the reference catalog.
//!
//! Every catalog kind is described by one [CatalogDescriptor]. The generic
//! catalog handlers and queries read table names, parent columns, labels and
//! the fields accepted on create/update from this table instead of having a
//! handler per kind. The table is checked once at start-up by
//! [check_catalog_schema].

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The four kinds of reference data that operations are classified by.
///
/// The serde names double as the URL path segment for the catalog pages,
/// e.g. `/catalog/statuses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogKind {
    /// The status of an operation, e.g. "Business" or "Tax".
    #[serde(rename = "statuses")]
    Status,
    /// The type of an operation, e.g. "Income" or "Expense".
    #[serde(rename = "types")]
    Type,
    /// A category, which belongs to a type.
    #[serde(rename = "categories")]
    Category,
    /// A subcategory, which belongs to a category.
    #[serde(rename = "subcategories")]
    Subcategory,
}

impl CatalogKind {
    /// All catalog kinds, parents before children.
    pub const ALL: [CatalogKind; 4] = [
        CatalogKind::Status,
        CatalogKind::Type,
        CatalogKind::Category,
        CatalogKind::Subcategory,
    ];

    /// The schema entry for this kind.
    pub fn descriptor(self) -> &'static CatalogDescriptor {
        match self {
            CatalogKind::Status => &STATUS_DESCRIPTOR,
            CatalogKind::Type => &TYPE_DESCRIPTOR,
            CatalogKind::Category => &CATEGORY_DESCRIPTOR,
            CatalogKind::Subcategory => &SUBCATEGORY_DESCRIPTOR,
        }
    }

    /// The URL path segment for this kind, e.g. "categories".
    pub fn path_segment(self) -> &'static str {
        match self {
            CatalogKind::Status => "statuses",
            CatalogKind::Type => "types",
            CatalogKind::Category => "categories",
            CatalogKind::Subcategory => "subcategories",
        }
    }

    /// The kind that rows of this kind belong to, if any.
    pub fn parent(self) -> Option<CatalogKind> {
        self.descriptor().parent.as_ref().map(|parent| parent.kind)
    }
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor().singular.to_lowercase())
    }
}

/// A field that can be submitted through a catalog form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogField {
    /// The display name of the row.
    Name,
    /// The reference to the parent row.
    Parent,
}

/// The foreign key from a catalog table to its parent table.
#[derive(Debug)]
pub struct ParentField {
    /// The kind of the parent rows.
    pub kind: CatalogKind,
    /// The column holding the parent ID.
    pub column: &'static str,
    /// The label shown next to the parent in forms and tables.
    pub label: &'static str,
}

/// Schema and presentation metadata for one catalog kind.
#[derive(Debug)]
pub struct CatalogDescriptor {
    pub kind: CatalogKind,
    /// The SQL table holding rows of this kind.
    pub table: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    pub parent: Option<ParentField>,
    /// Fields accepted when creating a row.
    pub create_fields: &'static [CatalogField],
    /// Fields accepted when updating a row.
    pub update_fields: &'static [CatalogField],
}

impl CatalogDescriptor {
    /// Whether `field` is accepted when creating a row.
    pub fn accepts_on_create(&self, field: CatalogField) -> bool {
        self.create_fields.contains(&field)
    }

    /// Whether `field` is accepted when updating a row.
    pub fn accepts_on_update(&self, field: CatalogField) -> bool {
        self.update_fields.contains(&field)
    }
}

const STATUS_DESCRIPTOR: CatalogDescriptor = CatalogDescriptor {
    kind: CatalogKind::Status,
    table: "status",
    singular: "Status",
    plural: "Statuses",
    parent: None,
    create_fields: &[CatalogField::Name],
    update_fields: &[CatalogField::Name],
};

const TYPE_DESCRIPTOR: CatalogDescriptor = CatalogDescriptor {
    kind: CatalogKind::Type,
    table: "operation_type",
    singular: "Type",
    plural: "Types",
    parent: None,
    create_fields: &[CatalogField::Name],
    update_fields: &[CatalogField::Name],
};

const CATEGORY_DESCRIPTOR: CatalogDescriptor = CatalogDescriptor {
    kind: CatalogKind::Category,
    table: "category",
    singular: "Category",
    plural: "Categories",
    parent: Some(ParentField {
        kind: CatalogKind::Type,
        column: "type_id",
        label: "Type",
    }),
    create_fields: &[CatalogField::Parent, CatalogField::Name],
    // The parent is fixed after creation so that edits cannot break the
    // type/category/subcategory chain of existing operations.
    update_fields: &[CatalogField::Name],
};

const SUBCATEGORY_DESCRIPTOR: CatalogDescriptor = CatalogDescriptor {
    kind: CatalogKind::Subcategory,
    table: "subcategory",
    singular: "Subcategory",
    plural: "Subcategories",
    parent: Some(ParentField {
        kind: CatalogKind::Category,
        column: "category_id",
        label: "Category",
    }),
    create_fields: &[CatalogField::Parent, CatalogField::Name],
    update_fields: &[CatalogField::Name],
};

/// The catalog schema, parents before children.
pub static CATALOG_SCHEMA: [&CatalogDescriptor; 4] = [
    &STATUS_DESCRIPTOR,
    &TYPE_DESCRIPTOR,
    &CATEGORY_DESCRIPTOR,
    &SUBCATEGORY_DESCRIPTOR,
];

/// Check that a catalog schema is internally consistent.
///
/// # Errors
/// Returns [Error::InvalidCatalogSchema] if:
/// - a kind is described more than once,
/// - a parent kind is not declared before its children,
/// - the parent field is accepted on create for a kind without a parent (or
///   missing for a kind with one),
/// - the name field is not accepted on create,
/// - or a field accepted on update is not accepted on create.
pub fn check_catalog_schema(schema: &[&CatalogDescriptor]) -> Result<(), Error> {
    for (position, descriptor) in schema.iter().enumerate() {
        let kind = descriptor.kind;
        let declared_before = &schema[..position];

        if declared_before.iter().any(|other| other.kind == kind) {
            return Err(Error::InvalidCatalogSchema(format!(
                "{kind} is described more than once"
            )));
        }

        if let Some(parent) = &descriptor.parent
            && !declared_before.iter().any(|other| other.kind == parent.kind)
        {
            return Err(Error::InvalidCatalogSchema(format!(
                "the parent of {kind} ({}) must be declared before it",
                parent.kind
            )));
        }

        if descriptor.parent.is_some() != descriptor.accepts_on_create(CatalogField::Parent) {
            return Err(Error::InvalidCatalogSchema(format!(
                "the parent field of {kind} must be accepted on create if and only if it has a parent"
            )));
        }

        if !descriptor.accepts_on_create(CatalogField::Name) {
            return Err(Error::InvalidCatalogSchema(format!(
                "the name of {kind} must be accepted on create"
            )));
        }

        if let Some(field) = descriptor
            .update_fields
            .iter()
            .find(|field| !descriptor.accepts_on_create(**field))
        {
            return Err(Error::InvalidCatalogSchema(format!(
                "{kind} accepts {field:?} on update but not on create"
            )));
        }
    }

    Ok(())
}
