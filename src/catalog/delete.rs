//! Catalog entry deletion: a confirmation page listing everything the
//! deletion removes, and the endpoint that deletes the entry.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, DatabaseId, Error, endpoints,
    catalog::{
        CatalogEntry, CatalogKind, Dependents, delete_catalog_entry, get_catalog_entry,
        get_dependents,
    },
    endpoints::format_catalog_endpoint,
    html::{BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base},
    navigation::NavBar,
};

/// The state needed for deleting a catalog entry.
#[derive(Debug, Clone)]
pub struct DeleteCatalogEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCatalogEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page asking the user to confirm the deletion of an entry.
pub async fn get_delete_catalog_entry_page(
    Path((kind, entry_id)): Path<(CatalogKind, DatabaseId)>,
    State(state): State<DeleteCatalogEntryState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entry = get_catalog_entry(kind, entry_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve {kind} {entry_id}: {error}");
        }
    })?;

    let dependents = get_dependents(kind, entry_id, &connection).inspect_err(|error| {
        tracing::error!("Could not get the dependents of {kind} {entry_id}: {error}")
    })?;

    Ok(delete_confirmation_view(&entry, &dependents).into_response())
}

/// Delete a catalog entry along with everything that depends on it, then
/// redirect to the list of entries of its kind.
pub async fn delete_catalog_entry_endpoint(
    Path((kind, entry_id)): Path<(CatalogKind, DatabaseId)>,
    State(state): State<DeleteCatalogEntryState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_catalog_entry(kind, entry_id, &connection) {
        Ok(()) => {
            tracing::info!("Deleted {kind} {entry_id}");

            (
                HxRedirect(format_catalog_endpoint(endpoints::CATALOG_VIEW, kind, None)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DeleteMissingCatalogEntry(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting {kind} {entry_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn entry_list(title: &str, entries: &[CatalogEntry]) -> Markup {
    html! {
        @if !entries.is_empty() {
            section
            {
                h2 class="font-semibold" { (title) }

                ul class="list-disc list-inside"
                {
                    @for entry in entries {
                        li { (entry.name) }
                    }
                }
            }
        }
    }
}

fn delete_confirmation_view(entry: &CatalogEntry, dependents: &Dependents) -> Markup {
    let kind = entry.kind;
    let singular = kind.descriptor().singular;
    let delete_page = format_catalog_endpoint(endpoints::DELETE_CATALOG_ENTRY_VIEW, kind, Some(entry.id));
    let delete_endpoint = format_catalog_endpoint(endpoints::CATALOG_ENTRY, kind, Some(entry.id));
    let list_page = format_catalog_endpoint(endpoints::CATALOG_VIEW, kind, None);
    let nav_bar = NavBar::new(&delete_page).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { "Delete " (singular) }

                p id="delete-warning"
                {
                    "Are you sure you want to delete the " (kind) " \"" (entry.name) "\"? "
                    "The following will also be deleted:"
                }

                (entry_list(CatalogKind::Category.descriptor().plural, &dependents.categories))
                (entry_list(CatalogKind::Subcategory.descriptor().plural, &dependents.subcategories))

                p id="operation-count"
                {
                    "Operations: " (dependents.operation_count)
                }

                div class="flex gap-4 items-center"
                {
                    button
                        type="button"
                        hx-delete=(delete_endpoint)
                        hx-target-error="#alert-container"
                        class="w-full px-4 py-2 bg-red-600 hover:bg-red-500 text-white rounded"
                    {
                        "Yes, delete"
                    }

                    a href=(list_page) class=(BUTTON_SECONDARY_STYLE) { "Cancel" }
                }

                a href=(list_page) class=(LINK_STYLE) { "Back to " (kind.descriptor().plural) }
            }
        }
    };

    base(&format!("Delete {singular}"), &[], &content)
}


#[cfg(test)]
mod delete_catalog_entry_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use time::macros::date;

    use crate::{
        CatalogKind, endpoints,
        catalog::list_catalog_entries,
        endpoints::format_catalog_endpoint,
        operation::count_operations,
        test_utils::{assert_hx_redirect, get_test_connection, insert_operation, seed_catalog},
    };

    use super::{DeleteCatalogEntryState, delete_catalog_entry_endpoint};

    #[tokio::test]
    async fn deleting_category_cascades() {
        let connection = get_test_connection();
        let catalog = seed_catalog(&connection);
        insert_operation(catalog.income_draft(date!(2024 - 01 - 01), "1"), &connection);
        insert_operation(catalog.expense_draft(date!(2024 - 01 - 02), "2"), &connection);
        let state = DeleteCatalogEntryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_catalog_entry_endpoint(
            Path((CatalogKind::Category, catalog.sales.id)),
            State(state.clone()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format_catalog_endpoint(endpoints::CATALOG_VIEW, CatalogKind::Category, None),
        );

        let connection = state.db_connection.lock().unwrap();
        let subcategories =
            list_catalog_entries(CatalogKind::Subcategory, None, &connection).unwrap();
        assert_eq!(subcategories, vec![catalog.avito.clone()]);
        assert_eq!(
            count_operations(&Default::default(), &connection).unwrap(),
            1,
            "only the operation on the other branch should remain"
        );
    }

    #[tokio::test]
    async fn delete_missing_entry_is_not_found() {
        let state = DeleteCatalogEntryState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = delete_catalog_entry_endpoint(Path((CatalogKind::Status, 9)), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
