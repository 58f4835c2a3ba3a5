//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    catalog::{
        create_catalog_entry_endpoint, delete_catalog_entry_endpoint, get_api_root,
        get_catalog_page, get_categories_json, get_category_json, get_delete_catalog_entry_page,
        get_edit_catalog_entry_page, get_new_catalog_entry_page, get_subcategories_json,
        get_subcategory_json, update_catalog_entry_endpoint,
    },
    endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    operation::{
        create_operation_endpoint, delete_operation_endpoint, get_edit_operation_page,
        get_new_operation_page, get_operations_page, update_operation_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::OPERATIONS_VIEW, get(get_operations_page))
        .route(endpoints::NEW_OPERATION_VIEW, get(get_new_operation_page))
        .route(endpoints::EDIT_OPERATION_VIEW, get(get_edit_operation_page))
        .route(endpoints::CATALOG_VIEW, get(get_catalog_page))
        .route(
            endpoints::NEW_CATALOG_ENTRY_VIEW,
            get(get_new_catalog_entry_page),
        )
        .route(
            endpoints::EDIT_CATALOG_ENTRY_VIEW,
            get(get_edit_catalog_entry_page),
        )
        .route(
            endpoints::DELETE_CATALOG_ENTRY_VIEW,
            get(get_delete_catalog_entry_page),
        )
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    // These routes are called by HTMX and respond with fragments, alerts or
    // the HX-REDIRECT header.
    let htmx_routes = Router::new()
        .route(endpoints::OPERATIONS_API, post(create_operation_endpoint))
        .route(
            endpoints::OPERATION,
            put(update_operation_endpoint).delete(delete_operation_endpoint),
        )
        .route(endpoints::CATALOG_API, post(create_catalog_entry_endpoint))
        .route(
            endpoints::CATALOG_ENTRY,
            put(update_catalog_entry_endpoint).delete(delete_catalog_entry_endpoint),
        );

    let json_routes = Router::new()
        .route(endpoints::API_ROOT, get(get_api_root))
        .route(endpoints::CATEGORIES_JSON, get(get_categories_json))
        .route(endpoints::CATEGORY_JSON, get(get_category_json))
        .route(endpoints::SUBCATEGORIES_JSON, get(get_subcategories_json))
        .route(endpoints::SUBCATEGORY_JSON, get(get_subcategory_json));

    pages
        .merge(htmx_routes)
        .merge(json_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the operations page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::OPERATIONS_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, endpoints, pagination::PaginationConfig};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "Etc/UTC",
            PaginationConfig::default(),
        )
        .expect("Could not create app state");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn serves_operations_page() {
        let server = get_test_server();

        let response = server.get(endpoints::OPERATIONS_VIEW).await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn serves_every_catalog_list() {
        let server = get_test_server();

        for path in [
            "/catalog/statuses",
            "/catalog/types",
            "/catalog/categories",
            "/catalog/subcategories",
        ] {
            server.get(path).await.assert_status_ok();
        }
    }

    #[tokio::test]
    async fn unknown_catalog_kind_is_rejected() {
        let server = get_test_server();

        let response = server.get("/catalog/widgets").await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        let response = server.get("/does/not/exist").await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn serves_json_api() {
        let server = get_test_server();

        let response = server.get(endpoints::CATEGORIES_JSON).await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!([]));
    }
}
