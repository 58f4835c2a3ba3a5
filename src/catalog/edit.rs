//! Catalog entry editing page and endpoint.
//!
//! Only the name of an entry can be changed.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, DatabaseId, Error, endpoints,
    catalog::{
        CatalogEntry, CatalogFormData, CatalogKind,
        form::{
            CatalogFormMode, catalog_form_view, invalid_catalog_form_response, is_form_error,
            submit_catalog_form,
        },
        get_catalog_entry,
    },
    endpoints::format_catalog_endpoint,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for editing a catalog entry.
#[derive(Debug, Clone)]
pub struct EditCatalogEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCatalogEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the editing page for a catalog entry.
pub async fn get_edit_catalog_entry_page(
    Path((kind, entry_id)): Path<(CatalogKind, DatabaseId)>,
    State(state): State<EditCatalogEntryState>,
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

    let parent = match (kind.parent(), entry.parent_id) {
        (Some(parent_kind), Some(parent_id)) => {
            Some(get_catalog_entry(parent_kind, parent_id, &connection)?)
        }
        _ => None,
    };

    Ok(edit_catalog_entry_view(&entry, parent.as_ref()).into_response())
}

/// Handle catalog entry update form submission.
pub async fn update_catalog_entry_endpoint(
    Path((kind, entry_id)): Path<(CatalogKind, DatabaseId)>,
    State(state): State<EditCatalogEntryState>,
    Form(form): Form<CatalogFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let mode = CatalogFormMode::Update(entry_id);

    match submit_catalog_form(kind, mode, &form, &connection) {
        Ok(()) => (
            HxRedirect(format_catalog_endpoint(endpoints::CATALOG_VIEW, kind, None)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) if is_form_error(&error) => {
            invalid_catalog_form_response(kind, mode, &form, &error, &connection)
        }
        Err(error @ Error::UpdateMissingCatalogEntry(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating {kind} {entry_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_catalog_entry_view(entry: &CatalogEntry, parent: Option<&CatalogEntry>) -> Markup {
    let kind = entry.kind;
    let descriptor = kind.descriptor();
    let edit_endpoint =
        format_catalog_endpoint(endpoints::EDIT_CATALOG_ENTRY_VIEW, kind, Some(entry.id));
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let values = CatalogFormData {
        name: entry.name.to_string(),
        parent: entry.parent_id,
    };
    let form = catalog_form_view(kind, CatalogFormMode::Update(entry.id), &values, &[], "");

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit " (descriptor.singular) }

            @if let (Some(parent_field), Some(parent)) = (&descriptor.parent, parent) {
                p class="mb-4 text-sm text-gray-500 dark:text-gray-400"
                {
                    (parent_field.label) ": " (parent.name)
                }
            }

            (form)
        }
    };

    base(&format!("Edit {}", descriptor.singular), &[], &content)
}
