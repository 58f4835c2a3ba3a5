//! Operation editing page and endpoint.

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
    html::{FORM_CONTAINER_STYLE, HeadElement, base},
    navigation::NavBar,
    operation::{
        ValidationErrors,
        core::{OperationId, get_operation},
        form::{
            CatalogOptions, FormMode, OperationForm, invalid_operation_form_response,
            operation_form_view, submit_operation_form,
        },
    },
    timezone::local_today,
};

/// The state needed for the edit operation page.
#[derive(Debug, Clone)]
pub struct EditOperationPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditOperationPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating an operation.
#[derive(Debug, Clone)]
pub struct UpdateOperationEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for UpdateOperationEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the operation editing page, pre-filled with the stored operation.
pub async fn get_edit_operation_page(
    Path(operation_id): Path<OperationId>,
    State(state): State<EditOperationPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let operation = get_operation(operation_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve operation {operation_id}: {error}");
        }
    })?;

    let options = CatalogOptions::load(&connection)
        .inspect_err(|error| tracing::error!("Could not load the catalog: {error}"))?;

    Ok(edit_operation_view(
        operation_id,
        &OperationForm::from_operation(&operation),
        &options,
    )
    .into_response())
}

/// Handle operation update form submission.
///
/// Every field is replaced, including the date.
pub async fn update_operation_endpoint(
    Path(operation_id): Path<OperationId>,
    State(state): State<UpdateOperationEndpointState>,
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

    let mode = FormMode::Update(operation_id);

    match submit_operation_form(&form, mode, today, &connection) {
        Ok(_) => {
            tracing::info!("Updated operation {operation_id}");

            (
                HxRedirect(endpoints::OPERATIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::InvalidOperation(errors)) => {
            tracing::debug!("Rejected update to operation {operation_id}: {errors}");
            invalid_operation_form_response(mode, &form, &errors, &connection)
        }
        Err(Error::UpdateMissingOperation) => Error::UpdateMissingOperation.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating operation {operation_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_operation_view(
    operation_id: OperationId,
    values: &OperationForm,
    options: &CatalogOptions,
) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_OPERATION_VIEW, operation_id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let form = operation_form_view(
        FormMode::Update(operation_id),
        values,
        options,
        &ValidationErrors::default(),
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Operation" }

            (form)
        }
    };

    base(
        "Edit Operation",
        &[HeadElement::ScriptLink(endpoints::OPERATION_FORM_SCRIPT.to_owned())],
        &content,
    )
}


#[cfg(test)]
mod update_operation_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        endpoints,
        operation::{core::get_operation, form::OperationForm},
        test_utils::{
            assert_hx_redirect, get_test_connection, insert_operation, parse_html_fragment,
            seed_catalog,
        },
    };

    use super::{UpdateOperationEndpointState, update_operation_endpoint};

    #[tokio::test]
    async fn replaces_every_field() {
        let connection = get_test_connection();
        let catalog = seed_catalog(&connection);
        let operation = insert_operation(
            catalog.income_draft(date!(2024 - 01 - 01), "10"),
            &connection,
        );
        let state = UpdateOperationEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };
        let form = OperationForm {
            creation_date: Some("2023-12-31".to_owned()),
            status: Some(catalog.business.id.to_string()),
            operation_type: Some(catalog.expense.id.to_string()),
            category: Some(catalog.marketing.id.to_string()),
            subcategory: Some(catalog.avito.id.to_string()),
            amount: Some("250.25".to_owned()),
            comment: Some(String::new()),
        };

        let response = update_operation_endpoint(Path(operation.id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::OPERATIONS_VIEW);
        let updated = get_operation(operation.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(updated.creation_date, date!(2023 - 12 - 31));
        assert_eq!(updated.type_id, catalog.expense.id);
        assert_eq!(updated.category_id, catalog.marketing.id);
        assert_eq!(updated.subcategory_id, catalog.avito.id);
        assert_eq!(updated.amount, Decimal::new(25025, 2));
        assert_eq!(updated.comment, None);
    }

    #[tokio::test]
    async fn rejects_subcategory_of_another_category() {
        let connection = get_test_connection();
        let catalog = seed_catalog(&connection);
        let operation = insert_operation(
            catalog.income_draft(date!(2024 - 01 - 01), "10"),
            &connection,
        );
        let state = UpdateOperationEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };
        let mut form = OperationForm::from_operation(&operation);
        form.subcategory = Some(catalog.avito.id.to_string());

        let response = update_operation_endpoint(Path(operation.id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = parse_html_fragment(response).await;
        let errors = html
            .select(&scraper::Selector::parse("form p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(
            errors,
            vec!["Subcategory \"Avito\" does not belong to category \"Sales\""]
        );
        assert_eq!(
            get_operation(operation.id, &state.db_connection.lock().unwrap()).unwrap(),
            operation,
            "a rejected update must leave the operation unchanged"
        );
    }

    #[tokio::test]
    async fn update_missing_operation_is_not_found() {
        let connection = get_test_connection();
        let catalog = seed_catalog(&connection);
        let state = UpdateOperationEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };
        let form = OperationForm {
            creation_date: Some("2024-01-01".to_owned()),
            status: Some(catalog.business.id.to_string()),
            operation_type: Some(catalog.income.id.to_string()),
            category: Some(catalog.sales.id.to_string()),
            subcategory: Some(catalog.online.id.to_string()),
            amount: Some("1".to_owned()),
            comment: None,
        };

        let response = update_operation_endpoint(Path(99), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
