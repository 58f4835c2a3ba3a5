//! Catalog entry creation page and endpoint.

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
    AppState, Error, endpoints,
    catalog::{
        CatalogEntry, CatalogFormData, CatalogKind,
        form::{
            CatalogFormMode, catalog_form_view, invalid_catalog_form_response, is_form_error,
            parent_options, submit_catalog_form,
        },
    },
    endpoints::format_catalog_endpoint,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for creating a catalog entry.
#[derive(Debug, Clone)]
pub struct CreateCatalogEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCatalogEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the creation page for an entry of `kind`.
pub async fn get_new_catalog_entry_page(
    Path(kind): Path<CatalogKind>,
    State(state): State<CreateCatalogEntryState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let parents = parent_options(kind, &connection)
        .inspect_err(|error| tracing::error!("Could not load the parents of {kind}: {error}"))?;

    Ok(new_catalog_entry_view(kind, &parents).into_response())
}

/// Handle catalog entry creation form submission.
pub async fn create_catalog_entry_endpoint(
    Path(kind): Path<CatalogKind>,
    State(state): State<CreateCatalogEntryState>,
    Form(form): Form<CatalogFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match submit_catalog_form(kind, CatalogFormMode::Create, &form, &connection) {
        Ok(()) => (
            HxRedirect(format_catalog_endpoint(endpoints::CATALOG_VIEW, kind, None)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) if is_form_error(&error) => {
            invalid_catalog_form_response(kind, CatalogFormMode::Create, &form, &error, &connection)
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a {kind}: {error}");
            error.into_alert_response()
        }
    }
}

fn new_catalog_entry_view(kind: CatalogKind, parents: &[CatalogEntry]) -> Markup {
    let singular = kind.descriptor().singular;
    let nav_bar =
        NavBar::new(&format_catalog_endpoint(endpoints::NEW_CATALOG_ENTRY_VIEW, kind, None))
            .into_html();
    let form = catalog_form_view(
        kind,
        CatalogFormMode::Create,
        &CatalogFormData::default(),
        parents,
        "",
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New " (singular) }

            (form)
        }
    };

    base(&format!("Create {singular}"), &[], &content)
}

#[cfg(test)]
mod new_catalog_entry_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use scraper::Selector;

    use crate::{
        CatalogKind, endpoints,
        endpoints::format_catalog_endpoint,
        test_utils::{
            assert_form_input, assert_form_select, assert_form_submit_button_with_text,
            assert_hx_endpoint, assert_status_ok, assert_valid_html, get_test_connection,
            must_get_form, parse_html_document, seed_catalog,
        },
    };

    use super::{CreateCatalogEntryState, get_new_catalog_entry_page};

    fn get_state() -> CreateCatalogEntryState {
        let connection = get_test_connection();
        seed_catalog(&connection);

        CreateCatalogEntryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn status_form_has_only_a_name() {
        let response = get_new_catalog_entry_page(Path(CatalogKind::Status), State(get_state()))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_catalog_endpoint(endpoints::CATALOG_API, CatalogKind::Status, None),
            "hx-post",
        );
        assert_form_input(&form, "name", "text");
        assert_eq!(form.select(&Selector::parse("select").unwrap()).count(), 0);
        assert_form_submit_button_with_text(&form, "Create Status");
    }

    #[tokio::test]
    async fn subcategory_form_offers_categories() {
        let response =
            get_new_catalog_entry_page(Path(CatalogKind::Subcategory), State(get_state()))
                .await
                .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_select(&form, "parent", None);
        let options = form
            .select(&Selector::parse("select[name=parent] option").unwrap())
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(options, vec!["---------", "Sales", "Marketing"]);
    }
}
