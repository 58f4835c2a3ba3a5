//! Operation deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    operation::core::{OperationId, delete_operation},
};

/// The state needed for deleting an operation.
#[derive(Debug, Clone)]
pub struct DeleteOperationEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteOperationEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle operation deletion. Returns success alert or error.
pub async fn delete_operation_endpoint(
    Path(operation_id): Path<OperationId>,
    State(state): State<DeleteOperationEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_operation(operation_id, &connection) {
        Ok(_) => {
            tracing::info!("Deleted operation {operation_id}");

            Alert::SuccessSimple {
                message: "Operation deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(Error::DeleteMissingOperation) => Error::DeleteMissingOperation.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting operation {operation_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_operation_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use time::macros::date;

    use crate::{
        Error,
        operation::core::get_operation,
        test_utils::{
            assert_valid_html, get_test_connection, insert_operation, parse_html_fragment,
            seed_catalog,
        },
    };

    use super::{DeleteOperationEndpointState, delete_operation_endpoint};

    #[tokio::test]
    async fn can_delete_operation() {
        let connection = get_test_connection();
        let catalog = seed_catalog(&connection);
        let operation = insert_operation(
            catalog.income_draft(date!(2024 - 02 - 29), "12.34"),
            &connection,
        );
        let state = DeleteOperationEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_operation_endpoint(Path(operation.id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            get_operation(operation.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_missing_operation_is_not_found() {
        let state = DeleteOperationEndpointState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = delete_operation_endpoint(Path(7), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
