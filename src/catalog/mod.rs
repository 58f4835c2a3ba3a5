//! The reference catalog that classifies operations: statuses, types,
//! categories and subcategories.

mod api;
mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod schema;

pub use api::{
    get_api_root, get_categories_json, get_category_json, get_subcategories_json,
    get_subcategory_json,
};
pub use create::{create_catalog_entry_endpoint, get_new_catalog_entry_page};
pub use db::{
    CatalogLookup, Dependents, create_catalog_entry, create_catalog_tables, delete_catalog_entry,
    find_catalog_entry, get_catalog_entry, get_dependents, list_catalog_entries,
    update_catalog_entry_name,
};
pub(crate) use db::map_catalog_row;
pub use delete::{delete_catalog_entry_endpoint, get_delete_catalog_entry_page};
pub use domain::{CatalogEntry, CatalogFormData, CatalogName, MAX_NAME_LENGTH};
pub use edit::{get_edit_catalog_entry_page, update_catalog_entry_endpoint};
pub use list::get_catalog_page;
pub use schema::{
    CATALOG_SCHEMA, CatalogDescriptor, CatalogField, CatalogKind, check_catalog_schema,
};
