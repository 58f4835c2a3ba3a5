//! Recording, validating and listing cash-flow operations.

mod core;
mod create;
mod delete;
mod edit;
mod filter;
mod form;
mod list;
mod validation;

pub use core::{
    Operation, ValidOperation, create_operation, create_operation_table, get_operation,
};
pub use create::{create_operation_endpoint, get_new_operation_page};
pub use delete::delete_operation_endpoint;
pub use edit::{get_edit_operation_page, update_operation_endpoint};
pub use filter::count_operations;
pub use list::get_operations_page;
pub use validation::{OperationDraft, ValidationErrors, validate_operation};
