//! The read-only JSON API for categories and subcategories.
//!
//! The operation form uses it to narrow the category choices to the selected
//! type, and the subcategory choices to the selected category.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, DatabaseId, Error,
    catalog::{CatalogEntry, CatalogKind, CatalogLookup, find_catalog_entry, list_catalog_entries},
    endpoints,
};

const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// The state needed for the JSON API.
#[derive(Debug, Clone)]
pub struct CatalogApiState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CatalogApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryJson {
    pub id: DatabaseId,
    pub category_name: String,
    #[serde(rename = "type")]
    pub type_id: DatabaseId,
}

impl From<CatalogEntry> for CategoryJson {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id,
            category_name: entry.name.to_string(),
            type_id: entry.parent_id.unwrap_or_default(),
        }
    }
}

/// A subcategory as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryJson {
    pub id: DatabaseId,
    pub subcategory_name: String,
    pub category: DatabaseId,
}

impl From<CatalogEntry> for SubcategoryJson {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id,
            subcategory_name: entry.name.to_string(),
            category: entry.parent_id.unwrap_or_default(),
        }
    }
}

/// The optional `?type=` filter of the category list.
#[derive(Debug, Default, Deserialize)]
pub struct CategoriesQuery {
    #[serde(rename = "type", default)]
    pub type_id: Option<String>,
}

/// The optional `?category=` filter of the subcategory list.
#[derive(Debug, Default, Deserialize)]
pub struct SubcategoriesQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// The ways an API request can fail.
#[derive(Debug, PartialEq)]
enum ApiError {
    /// The filter `field` does not name an existing row.
    InvalidChoice(&'static str),
    NotFound,
    Internal(Error),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound => ApiError::NotFound,
            error => ApiError::Internal(error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidChoice(field) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ field: [INVALID_CHOICE_MESSAGE] })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            ApiError::Internal(error) => {
                tracing::error!("An unexpected error occurred in the JSON API: {error}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "A server error occurred." })),
                )
                    .into_response()
            }
        }
    }
}

fn lock_connection(
    state: &CatalogApiState,
) -> Result<std::sync::MutexGuard<'_, Connection>, ApiError> {
    state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        ApiError::Internal(Error::DatabaseLockError)
    })
}

/// Resolve a list filter to the ID of an existing entry of `kind`.
///
/// An empty value means no filter. Anything that is not the ID of an
/// existing entry is an invalid choice for `field`.
fn resolve_filter(
    field: &'static str,
    raw: Option<&str>,
    kind: CatalogKind,
    connection: &Connection,
) -> Result<Option<DatabaseId>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let id = raw
        .parse::<DatabaseId>()
        .map_err(|_| ApiError::InvalidChoice(field))?;

    if connection.exists(kind, id)? {
        Ok(Some(id))
    } else {
        Err(ApiError::InvalidChoice(field))
    }
}

/// Look up a single entry from a raw path segment. IDs that do not parse are
/// treated as missing.
fn find_by_raw_id(
    kind: CatalogKind,
    raw_id: &str,
    connection: &Connection,
) -> Result<CatalogEntry, ApiError> {
    let id = raw_id
        .parse::<DatabaseId>()
        .map_err(|_| ApiError::NotFound)?;

    find_catalog_entry(kind, id, connection)?.ok_or(ApiError::NotFound)
}

/// The index of the API resources.
pub async fn get_api_root() -> Json<serde_json::Value> {
    Json(json!({
        "category": endpoints::CATEGORIES_JSON,
        "subcategory": endpoints::SUBCATEGORIES_JSON,
    }))
}

/// List the categories, optionally only those of one type.
pub async fn get_categories_json(
    State(state): State<CatalogApiState>,
    Query(query): Query<CategoriesQuery>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        let type_id = resolve_filter(
            "type",
            query.type_id.as_deref(),
            CatalogKind::Type,
            &connection,
        )?;

        let categories = list_catalog_entries(CatalogKind::Category, type_id, &connection)?;

        Ok(categories
            .into_iter()
            .map(CategoryJson::from)
            .collect::<Vec<_>>())
    });

    match result {
        Ok(categories) => Json(categories).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Get a single category.
pub async fn get_category_json(
    Path(category_id): Path<String>,
    State(state): State<CatalogApiState>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        find_by_raw_id(CatalogKind::Category, &category_id, &connection).map(CategoryJson::from)
    });

    match result {
        Ok(category) => Json(category).into_response(),
        Err(error) => error.into_response(),
    }
}

/// List the subcategories, optionally only those of one category.
pub async fn get_subcategories_json(
    State(state): State<CatalogApiState>,
    Query(query): Query<SubcategoriesQuery>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        let category_id = resolve_filter(
            "category",
            query.category.as_deref(),
            CatalogKind::Category,
            &connection,
        )?;

        let subcategories =
            list_catalog_entries(CatalogKind::Subcategory, category_id, &connection)?;

        Ok(subcategories
            .into_iter()
            .map(SubcategoryJson::from)
            .collect::<Vec<_>>())
    });

    match result {
        Ok(subcategories) => Json(subcategories).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Get a single subcategory.
pub async fn get_subcategory_json(
    Path(subcategory_id): Path<String>,
    State(state): State<CatalogApiState>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        find_by_raw_id(CatalogKind::Subcategory, &subcategory_id, &connection)
            .map(SubcategoryJson::from)
    });

    match result {
        Ok(subcategory) => Json(subcategory).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod catalog_api_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        endpoints,
        test_utils::{CatalogFixture, get_test_connection, seed_catalog},
    };

    use super::{
        CatalogApiState, CategoryJson, SubcategoryJson, get_api_root, get_categories_json,
        get_category_json, get_subcategories_json, get_subcategory_json,
    };

    fn get_test_server() -> (TestServer, CatalogFixture) {
        let connection = get_test_connection();
        let catalog = seed_catalog(&connection);
        let state = CatalogApiState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(endpoints::API_ROOT, get(get_api_root))
            .route(endpoints::CATEGORIES_JSON, get(get_categories_json))
            .route(endpoints::CATEGORY_JSON, get(get_category_json))
            .route(endpoints::SUBCATEGORIES_JSON, get(get_subcategories_json))
            .route(endpoints::SUBCATEGORY_JSON, get(get_subcategory_json))
            .with_state(state);

        (
            TestServer::new(app).expect("Could not create test server."),
            catalog,
        )
    }

    #[tokio::test]
    async fn root_lists_resources() {
        let (server, _) = get_test_server();

        let response = server.get(endpoints::API_ROOT).await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "category": "/api/category",
            "subcategory": "/api/subcategory",
        }));
    }

    #[tokio::test]
    async fn lists_all_categories() {
        let (server, catalog) = get_test_server();

        let response = server.get(endpoints::CATEGORIES_JSON).await;

        response.assert_status_ok();
        response.assert_json(&json!([
            { "id": catalog.sales.id, "category_name": "Sales", "type": catalog.income.id },
            { "id": catalog.marketing.id, "category_name": "Marketing", "type": catalog.expense.id },
        ]));
    }

    #[tokio::test]
    async fn filters_categories_by_type() {
        let (server, catalog) = get_test_server();

        let response = server
            .get(endpoints::CATEGORIES_JSON)
            .add_query_param("type", catalog.expense.id)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Vec<CategoryJson>>(),
            vec![CategoryJson {
                id: catalog.marketing.id,
                category_name: "Marketing".to_owned(),
                type_id: catalog.expense.id,
            }]
        );
    }

    #[tokio::test]
    async fn empty_filter_is_ignored() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::CATEGORIES_JSON)
            .add_query_param("type", "")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<CategoryJson>>().len(), 2);
    }

    #[tokio::test]
    async fn invalid_filter_is_bad_request() {
        let (server, _) = get_test_server();

        for value in ["abc", "999"] {
            let response = server
                .get(endpoints::CATEGORIES_JSON)
                .add_query_param("type", value)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({
                "type": ["Select a valid choice. That choice is not one of the available choices."]
            }));
        }
    }

    #[tokio::test]
    async fn gets_single_category() {
        let (server, catalog) = get_test_server();

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::CATEGORY_JSON,
                catalog.sales.id,
            ))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "id": catalog.sales.id,
            "category_name": "Sales",
            "type": catalog.income.id,
        }));
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let (server, _) = get_test_server();

        for path in ["/api/category/999", "/api/category/abc"] {
            let response = server.get(path).await;

            response.assert_status_not_found();
            response.assert_json(&json!({ "detail": "Not found." }));
        }
    }

    #[tokio::test]
    async fn filters_subcategories_by_category() {
        let (server, catalog) = get_test_server();

        let response = server
            .get(endpoints::SUBCATEGORIES_JSON)
            .add_query_param("category", catalog.sales.id)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Vec<SubcategoryJson>>(),
            vec![SubcategoryJson {
                id: catalog.online.id,
                subcategory_name: "Online".to_owned(),
                category: catalog.sales.id,
            }]
        );
    }

    #[tokio::test]
    async fn invalid_subcategory_filter_names_the_field() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::SUBCATEGORIES_JSON)
            .add_query_param("category", "x")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "category": ["Select a valid choice. That choice is not one of the available choices."]
        }));
    }

    #[tokio::test]
    async fn gets_single_subcategory() {
        let (server, catalog) = get_test_server();

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::SUBCATEGORY_JSON,
                catalog.avito.id,
            ))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "id": catalog.avito.id,
            "subcategory_name": "Avito",
            "category": catalog.marketing.id,
        }));
    }

    #[tokio::test]
    async fn only_get_is_allowed() {
        let (server, _) = get_test_server();

        let response = server.post(endpoints::CATEGORIES_JSON).await;

        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }
}
