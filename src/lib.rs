//! Cashflow is a web app for recording and reviewing money movements
//! (cash-flow operations).
//!
//! Every operation is classified by a status, a type, a category and a
//! subcategory taken from a reference catalog. The category must belong to the
//! type and the subcategory must belong to the category; this is checked
//! before any operation is written.
//!
//! This library provides a REST API that directly serves HTML pages, plus a
//! small read-only JSON API for the category/subcategory catalog.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod catalog;
mod database_id;
mod db;
mod endpoints;
mod error_page;
mod html;
mod logging;
mod navigation;
mod operation;
mod pagination;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use catalog::{
    CatalogEntry, CatalogKind, CatalogName, create_catalog_entry, list_catalog_entries,
};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use operation::{
    Operation, OperationDraft, ValidOperation, ValidationErrors, create_operation,
    validate_operation,
};
pub use pagination::PaginationConfig;
pub use routing::build_router;

use crate::{
    alert::Alert,
    error_page::{InternalServerError, get_404_not_found_response},
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string (or only whitespace) was used to name a catalog entry.
    #[error("Name cannot be empty")]
    EmptyCatalogName,

    /// A catalog entry name was longer than [catalog::MAX_NAME_LENGTH] characters.
    #[error("Name cannot be longer than {} characters", catalog::MAX_NAME_LENGTH)]
    CatalogNameTooLong,

    /// A category or subcategory was created without choosing its parent.
    #[error("a {0} must belong to a {parent}", parent = parent_label(.0))]
    MissingParent(CatalogKind),

    /// A category or subcategory was created with a parent that does not exist.
    #[error("the selected {parent} does not exist", parent = parent_label(.0))]
    InvalidParent(CatalogKind),

    /// An operation failed validation. Holds every error found, in the
    /// order the fields were checked.
    #[error("the operation is invalid: {0}")]
    InvalidOperation(ValidationErrors),

    /// The catalog schema table is inconsistent. This is a programming error
    /// and is reported at start-up.
    #[error("invalid catalog schema: {0}")]
    InvalidCatalogSchema(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update an operation that does not exist
    #[error("tried to update an operation that is not in the database")]
    UpdateMissingOperation,

    /// Tried to delete an operation that does not exist
    #[error("tried to delete an operation that is not in the database")]
    DeleteMissingOperation,

    /// Tried to update a catalog entry that does not exist
    #[error("tried to update a {0} that is not in the database")]
    UpdateMissingCatalogEntry(CatalogKind),

    /// Tried to delete a catalog entry that does not exist
    #[error("tried to delete a {0} that is not in the database")]
    DeleteMissingCatalogEntry(CatalogKind),
}

fn parent_label(kind: &CatalogKind) -> String {
    kind.parent()
        .map(|parent| parent.to_string())
        .unwrap_or_else(|| "parent".to_owned())
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidOperation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "Invalid operation".to_owned(),
                    details: errors.to_string(),
                },
            ),
            Error::UpdateMissingOperation => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update operation".to_owned(),
                    details: "The operation could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingOperation => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete operation".to_owned(),
                    details: "The operation could not be found. \
                        Try refreshing the page to see if the operation has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCatalogEntry(kind) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not update {kind}"),
                    details: format!("The {kind} could not be found."),
                },
            ),
            Error::DeleteMissingCatalogEntry(kind) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not delete {kind}"),
                    details: format!(
                        "The {kind} could not be found. \
                        Try refreshing the page to see if the {kind} has already been deleted."
                    ),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::ErrorSimple {
                    message: "The requested resource could not be found".to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                },
            ),
        };

        (status_code, alert).into_response()
    }
}
