//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/operations/{operation_id}', use
//! [format_endpoint]. Catalog endpoints also take the catalog kind, use
//! [format_catalog_endpoint] for those.

use crate::{CatalogKind, DatabaseId};

/// The root route which redirects to the operations page.
pub const ROOT: &str = "/";
/// The page for listing and filtering operations.
pub const OPERATIONS_VIEW: &str = "/operations";
/// The page for creating a new operation.
pub const NEW_OPERATION_VIEW: &str = "/operations/new";
/// The page for editing an existing operation.
pub const EDIT_OPERATION_VIEW: &str = "/operations/{operation_id}/edit";
/// The page for listing the entries of one catalog kind.
pub const CATALOG_VIEW: &str = "/catalog/{kind}";
/// The page for creating a catalog entry.
pub const NEW_CATALOG_ENTRY_VIEW: &str = "/catalog/{kind}/new";
/// The page for editing a catalog entry.
pub const EDIT_CATALOG_ENTRY_VIEW: &str = "/catalog/{kind}/{entry_id}/edit";
/// The page for confirming the deletion of a catalog entry.
pub const DELETE_CATALOG_ENTRY_VIEW: &str = "/catalog/{kind}/{entry_id}/delete";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
/// The script that narrows the category and subcategory choices of the
/// operation form.
pub const OPERATION_FORM_SCRIPT: &str = "/static/operation_form.js";

/// The route to create operations.
pub const OPERATIONS_API: &str = "/api/operations";
/// The route to update or delete a single operation.
pub const OPERATION: &str = "/api/operations/{operation_id}";
/// The route to create catalog entries.
pub const CATALOG_API: &str = "/api/catalog/{kind}";
/// The route to update or delete a single catalog entry.
pub const CATALOG_ENTRY: &str = "/api/catalog/{kind}/{entry_id}";

/// The index of the JSON API.
pub const API_ROOT: &str = "/api";
/// The JSON list of categories.
pub const CATEGORIES_JSON: &str = "/api/category";
/// A single category as JSON.
pub const CATEGORY_JSON: &str = "/api/category/{category_id}";
/// The JSON list of subcategories.
pub const SUBCATEGORIES_JSON: &str = "/api/subcategory";
/// A single subcategory as JSON.
pub const SUBCATEGORY_JSON: &str = "/api/subcategory/{subcategory_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/operations/{operation_id}/edit',
/// '{operation_id}' is the parameter.
///
/// Only the first parameter is replaced. If no parameter is found in
/// `endpoint_path`, the function returns the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: DatabaseId) -> String {
    replace_first_param(endpoint_path, &id.to_string())
}

/// Replace the `{kind}` parameter of a catalog endpoint with the path segment
/// of `kind`, and the entry parameter (if any) with `id`.
pub fn format_catalog_endpoint(
    endpoint_path: &str,
    kind: CatalogKind,
    id: Option<DatabaseId>,
) -> String {
    let path = endpoint_path.replacen("{kind}", kind.path_segment(), 1);

    match id {
        Some(id) => format_endpoint(&path, id),
        None => path,
    }
}

fn replace_first_param(endpoint_path: &str, value: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::{CatalogKind, endpoints};

    use super::{format_catalog_endpoint, format_endpoint};

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::OPERATIONS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_OPERATION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_OPERATION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::CATALOG_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_CATALOG_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_CATALOG_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::DELETE_CATALOG_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);
        assert_endpoint_is_valid_uri(endpoints::OPERATION_FORM_SCRIPT);

        assert_endpoint_is_valid_uri(endpoints::OPERATIONS_API);
        assert_endpoint_is_valid_uri(endpoints::OPERATION);
        assert_endpoint_is_valid_uri(endpoints::CATALOG_API);
        assert_endpoint_is_valid_uri(endpoints::CATALOG_ENTRY);

        assert_endpoint_is_valid_uri(endpoints::API_ROOT);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES_JSON);
        assert_endpoint_is_valid_uri(endpoints::CATEGORY_JSON);
        assert_endpoint_is_valid_uri(endpoints::SUBCATEGORIES_JSON);
        assert_endpoint_is_valid_uri(endpoints::SUBCATEGORY_JSON);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::EDIT_OPERATION_VIEW, 12);

        assert_eq!(formatted_path, "/operations/12/edit");
    }

    #[test]
    fn formats_catalog_endpoints() {
        assert_eq!(
            format_catalog_endpoint(endpoints::CATALOG_VIEW, CatalogKind::Subcategory, None),
            "/catalog/subcategories"
        );
        assert_eq!(
            format_catalog_endpoint(
                endpoints::EDIT_CATALOG_ENTRY_VIEW,
                CatalogKind::Status,
                Some(3)
            ),
            "/catalog/statuses/3/edit"
        );
        assert_eq!(
            format_catalog_endpoint(endpoints::CATALOG_ENTRY, CatalogKind::Type, Some(7)),
            "/api/catalog/types/7"
        );
    }
}
