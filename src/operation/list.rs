//! The operations page: a filter form, a table of operations and page links.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, CatalogEntry, Error, endpoints,
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_amount,
    },
    navigation::NavBar,
    operation::{
        core::ResolvedOperation,
        filter::{OperationFilter, OperationsQuery, count_operations, query_operations},
        form::CatalogOptions,
    },
    pagination::{PaginationConfig, create_pagination_indicators, pagination_view, resolve_page},
};

/// The state needed for the operations page.
#[derive(Debug, Clone)]
pub struct OperationsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for OperationsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render one page of the operations that match the query's filters.
///
/// Filter values that cannot be parsed are ignored. A page number that is
/// not a number or is past the last page gives a 404.
pub async fn get_operations_page(
    State(state): State<OperationsPageState>,
    Query(query): Query<OperationsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let config = &state.pagination_config;
    let filter = OperationFilter::from_query(&query);

    let operation_count = count_operations(&filter, &connection)
        .inspect_err(|error| tracing::error!("Could not count operations: {error}"))?;
    let page_count = config.page_count(operation_count);
    let page = resolve_page(query.page.as_deref(), page_count)?;

    let operations = query_operations(
        &filter,
        config.page_size,
        config.offset(page),
        &connection,
    )
    .inspect_err(|error| tracing::error!("Could not query operations: {error}"))?;

    let options = CatalogOptions::load(&connection)
        .inspect_err(|error| tracing::error!("Could not load the catalog: {error}"))?;

    let pagination = pagination_view(
        &create_pagination_indicators(page, page_count, config.max_pages),
        |page| format!("{}?{}", endpoints::OPERATIONS_VIEW, query.to_page_query_string(page)),
    );

    Ok(operations_view(&query, &options, &operations, operation_count, &pagination).into_response())
}

fn operations_view(
    query: &OperationsQuery,
    options: &CatalogOptions,
    operations: &[ResolvedOperation],
    operation_count: u64,
    pagination: &Markup,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::OPERATIONS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full max-w-screen-xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Operations" }

                    a href=(endpoints::NEW_OPERATION_VIEW) class=(LINK_STYLE)
                    {
                        "Create Operation"
                    }
                }

                (filter_form_view(query, options))

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Found " (operation_count) " operation(s)"
                }

                (operations_table_view(operations))

                (pagination)
            }
        }
    );

    base("Operations", &[], &content)
}

fn filter_form_view(query: &OperationsQuery, options: &CatalogOptions) -> Markup {
    let date_input = |name: &str, label: &str, value: Option<&str>| {
        html! {
            div
            {
                label for=(name) class=(FORM_LABEL_STYLE) { (label) }

                input
                    id=(name)
                    name=(name)
                    type="date"
                    value=[value]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };

    let entry_select = |name: &str, label: &str, entries: &[CatalogEntry], value: Option<&str>| {
        let selected = value.map(str::trim);

        html! {
            div
            {
                label for=(name) class=(FORM_LABEL_STYLE) { (label) }

                select id=(name) name=(name) class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for entry in entries {
                        @let id = entry.id.to_string();

                        option
                            value=(id)
                            data-parent=[entry.parent_id]
                            selected[selected == Some(id.as_str())]
                        {
                            (entry.name)
                        }
                    }
                }
            }
        }
    };

    html! {
        form
            id="operation-filter"
            method="get"
            action=(endpoints::OPERATIONS_VIEW)
            class="grid grid-cols-1 gap-4 md:grid-cols-3 lg:grid-cols-6 items-end"
        {
            (date_input("date_from", "From", query.date_from.as_deref()))
            (date_input("date_to", "To", query.date_to.as_deref()))
            (entry_select("status", "Status", &options.statuses, query.status.as_deref()))
            (entry_select("type_obj", "Type", &options.types, query.type_obj.as_deref()))
            (entry_select("category", "Category", &options.categories, query.category.as_deref()))
            (entry_select(
                "subcategory",
                "Subcategory",
                &options.subcategories,
                query.subcategory.as_deref(),
            ))

            div class="flex gap-4 items-center lg:col-span-6"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }

                a href=(endpoints::OPERATIONS_VIEW) class=(LINK_STYLE) { "Reset" }
            }
        }
    }
}

fn operations_table_view(operations: &[ResolvedOperation]) -> Markup {
    let table_row = |resolved: &ResolvedOperation| {
        let operation = &resolved.operation;
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_OPERATION_VIEW, operation.id);
        let delete_url = endpoints::format_endpoint(endpoints::OPERATION, operation.id);
        let confirm_message = format!(
            "Are you sure you want to delete the operation of {} from {}?",
            format_amount(operation.amount),
            operation.creation_date
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (operation.creation_date) }
                td class=(TABLE_CELL_STYLE) { (resolved.status.name) }
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(BADGE_STYLE) { (resolved.operation_type.name) }
                }
                td class=(TABLE_CELL_STYLE) { (resolved.category.name) }
                td class=(TABLE_CELL_STYLE) { (resolved.subcategory.name) }
                td class="px-6 py-4 text-right" { (format_amount(operation.amount)) }
                td class=(TABLE_CELL_STYLE) { (operation.comment.as_deref().unwrap_or_default()) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    html! {
        div class="overflow-x-auto rounded shadow-md"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Subcategory" }
                        th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Comment" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for operation in operations {
                        (table_row(operation))
                    }

                    @if operations.is_empty() {
                        tr
                        {
                            td colspan="8" class="px-6 py-4 text-center"
                            {
                                "No operations found. "
                                a href=(endpoints::NEW_OPERATION_VIEW) class=(LINK_STYLE)
                                {
                                    "Record an operation"
                                }
                                " or change the filters."
                            }
                        }
                    }
                }
            }
        }
    }
}
