//! The catalog listing page for each catalog kind.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, DatabaseId, Error, endpoints,
    catalog::{CatalogEntry, CatalogKind, list_catalog_entries},
    endpoints::format_catalog_endpoint,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for the catalog listing page.
#[derive(Debug, Clone)]
pub struct CatalogPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CatalogPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A catalog entry with the names of its ancestors, nearest first.
///
/// A subcategory lists its category and then that category's type.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CatalogRow {
    entry: CatalogEntry,
    ancestors: Vec<String>,
}

/// Render the list of every entry of `kind`, ordered by ID.
pub async fn get_catalog_page(
    Path(kind): Path<CatalogKind>,
    State(state): State<CatalogPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rows = get_catalog_rows(kind, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve {kind} entries: {error}"))?;

    Ok(catalog_view(kind, &rows).into_response())
}

fn get_catalog_rows(kind: CatalogKind, connection: &Connection) -> Result<Vec<CatalogRow>, Error> {
    let mut ancestors_by_kind: HashMap<CatalogKind, HashMap<DatabaseId, CatalogEntry>> =
        HashMap::new();

    let mut ancestor_kind = kind.parent();
    while let Some(current_kind) = ancestor_kind {
        let entries = list_catalog_entries(current_kind, None, connection)?
            .into_iter()
            .map(|entry| (entry.id, entry))
            .collect();
        ancestors_by_kind.insert(current_kind, entries);
        ancestor_kind = current_kind.parent();
    }

    let rows = list_catalog_entries(kind, None, connection)?
        .into_iter()
        .map(|entry| {
            let mut ancestors = Vec::new();
            let mut current = (entry.kind.parent(), entry.parent_id);

            while let (Some(parent_kind), Some(parent_id)) = current {
                let Some(parent) = ancestors_by_kind
                    .get(&parent_kind)
                    .and_then(|entries| entries.get(&parent_id))
                else {
                    break;
                };

                ancestors.push(parent.name.to_string());
                current = (parent_kind.parent(), parent.parent_id);
            }

            CatalogRow { entry, ancestors }
        })
        .collect();

    Ok(rows)
}

/// The column headings for the ancestors of `kind`, nearest first.
fn ancestor_labels(kind: CatalogKind) -> Vec<&'static str> {
    let mut labels = Vec::new();
    let mut current = kind.descriptor().parent.as_ref();

    while let Some(parent) = current {
        labels.push(parent.label);
        current = parent.kind.descriptor().parent.as_ref();
    }

    labels
}

fn catalog_view(kind: CatalogKind, rows: &[CatalogRow]) -> Markup {
    let descriptor = kind.descriptor();
    let list_page = format_catalog_endpoint(endpoints::CATALOG_VIEW, kind, None);
    let new_entry_page = format_catalog_endpoint(endpoints::NEW_CATALOG_ENTRY_VIEW, kind, None);
    let nav_bar = NavBar::new(&list_page).into_html();
    let ancestor_labels = ancestor_labels(kind);
    let column_count = ancestor_labels.len() + 2;

    let table_row = |row: &CatalogRow| {
        let edit_url =
            format_catalog_endpoint(endpoints::EDIT_CATALOG_ENTRY_VIEW, kind, Some(row.entry.id));
        let delete_url =
            format_catalog_endpoint(endpoints::DELETE_CATALOG_ENTRY_VIEW, kind, Some(row.entry.id));

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (row.entry.name) }

                @for ancestor in &row.ancestors {
                    td class=(TABLE_CELL_STYLE) { (ancestor) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        a href=(edit_url) class=(LINK_STYLE) { "Edit" }
                        a href=(delete_url) class=(BUTTON_DELETE_STYLE) { "Delete" }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full max-w-screen-md"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { (descriptor.plural) }

                    a href=(new_entry_page) class=(LINK_STYLE)
                    {
                        "Create " (descriptor.singular)
                    }
                }

                div class="overflow-x-auto rounded shadow-md"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }

                                @for label in &ancestor_labels {
                                    th scope="col" class=(TABLE_CELL_STYLE) { (label) }
                                }

                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td colspan=(column_count) class="px-6 py-4 text-center"
                                    {
                                        "No " (descriptor.plural.to_lowercase()) " yet. "
                                        a href=(new_entry_page) class=(LINK_STYLE)
                                        {
                                            "Create one"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base(descriptor.plural, &[], &content)
}
