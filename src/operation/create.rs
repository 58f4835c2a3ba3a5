//! Operation creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{FORM_CONTAINER_STYLE, HeadElement, base},
    navigation::NavBar,
    operation::{
        ValidationErrors,
        form::{
            CatalogOptions, FormMode, OperationForm, invalid_operation_form_response,
            operation_form_view, submit_operation_form,
        },
    },
    timezone::local_today,
};

/// The state needed for the new operation page.
#[derive(Debug, Clone)]
pub struct NewOperationPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewOperationPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for creating an operation.
#[derive(Debug, Clone)]
pub struct CreateOperationEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateOperationEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the operation creation page.
pub async fn get_new_operation_page(
    State(state): State<NewOperationPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let options = CatalogOptions::load(&connection)
        .inspect_err(|error| tracing::error!("Could not load the catalog: {error}"))?;

    Ok(new_operation_view(&options).into_response())
}

/// Handle operation creation form submission.
///
/// The new operation is dated today in the server's timezone.
pub async fn create_operation_endpoint(
    State(state): State<CreateOperationEndpointState>,
    Form(form): Form<OperationForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match submit_operation_form(&form, FormMode::Create, today, &connection) {
        Ok(operation) => {
            tracing::info!("Created operation {}", operation.id);

            (
                HxRedirect(endpoints::OPERATIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::InvalidOperation(errors)) => {
            tracing::debug!("Rejected new operation: {errors}");
            invalid_operation_form_response(FormMode::Create, &form, &errors, &connection)
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an operation: {error}");
            error.into_alert_response()
        }
    }
}

fn new_operation_view(options: &CatalogOptions) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_OPERATION_VIEW).into_html();
    let form = operation_form_view(
        FormMode::Create,
        &OperationForm::default(),
        options,
        &ValidationErrors::default(),
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Operation" }

            (form)
        }
    };

    base(
        "Create Operation",
        &[HeadElement::ScriptLink(endpoints::OPERATION_FORM_SCRIPT.to_owned())],
        &content,
    )
}

#[cfg(test)]
mod new_operation_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};

    use crate::{
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_select, assert_form_submit_button,
            assert_hx_endpoint, assert_valid_html, get_test_connection, must_get_form,
            parse_html_document, seed_catalog,
        },
    };

    use super::{NewOperationPageState, get_new_operation_page};

    #[tokio::test]
    async fn render_page() {
        let connection = get_test_connection();
        let catalog = seed_catalog(&connection);
        let state = NewOperationPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_new_operation_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::OPERATIONS_API, "hx-post");
        assert_form_select(&form, "status", None);
        assert_form_select(&form, "type", None);
        assert_form_select(&form, "category", None);
        assert_form_select(&form, "subcategory", None);
        assert_form_input(&form, "amount", "number");
        assert_form_submit_button(&form);

        let options = form
            .select(&scraper::Selector::parse("select[name=category] option").unwrap())
            .filter_map(|option| option.value().attr("value"))
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>();
        assert_eq!(
            options,
            vec![catalog.sales.id.to_string(), catalog.marketing.id.to_string()]
        );
    }
}
