//! The catalog entry form, shared by every catalog kind.
//!
//! Which inputs are rendered and which submitted values are used is decided
//! by the kind's [CatalogDescriptor](crate::catalog::CatalogDescriptor).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    DatabaseId, Error, endpoints,
    catalog::{
        CatalogEntry, CatalogField, CatalogFormData, CatalogKind, CatalogName,
        create_catalog_entry, list_catalog_entries, update_catalog_entry_name,
    },
    endpoints::format_catalog_endpoint,
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// Whether the form creates a new entry or renames an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormMode {
    Create,
    Update(DatabaseId),
}

impl CatalogFormMode {
    fn accepts(self, kind: CatalogKind, field: CatalogField) -> bool {
        let descriptor = kind.descriptor();

        match self {
            CatalogFormMode::Create => descriptor.accepts_on_create(field),
            CatalogFormMode::Update(_) => descriptor.accepts_on_update(field),
        }
    }
}

/// Validate and write a submitted catalog form.
///
/// Only the fields the kind accepts in `mode` are read from `form`.
///
/// # Errors
/// Returns:
/// - [Error::EmptyCatalogName] or [Error::CatalogNameTooLong] for a bad name,
/// - [Error::MissingParent] or [Error::InvalidParent] for a bad parent,
/// - [Error::UpdateMissingCatalogEntry] if the entry to update does not exist,
/// - [Error::SqlError] if the write fails.
pub fn submit_catalog_form(
    kind: CatalogKind,
    mode: CatalogFormMode,
    form: &CatalogFormData,
    connection: &Connection,
) -> Result<(), Error> {
    let name = CatalogName::new(&form.name)?;

    match mode {
        CatalogFormMode::Create => {
            let parent_id = form
                .parent
                .filter(|_| mode.accepts(kind, CatalogField::Parent));

            let entry = create_catalog_entry(kind, name, parent_id, connection)?;
            tracing::info!("Created {kind} {} ({})", entry.id, entry.name);
        }
        CatalogFormMode::Update(id) => {
            update_catalog_entry_name(kind, id, name, connection)?;
            tracing::info!("Renamed {kind} {id}");
        }
    }

    Ok(())
}

/// Whether `error` is a problem with the submitted values that should be
/// shown in the form.
pub fn is_form_error(error: &Error) -> bool {
    matches!(
        error,
        Error::EmptyCatalogName
            | Error::CatalogNameTooLong
            | Error::MissingParent(_)
            | Error::InvalidParent(_)
    )
}

/// The entries a new entry of `kind` may belong to, empty for kinds without
/// a parent.
pub fn parent_options(kind: CatalogKind, connection: &Connection) -> Result<Vec<CatalogEntry>, Error> {
    match kind.parent() {
        Some(parent_kind) => list_catalog_entries(parent_kind, None, connection),
        None => Ok(Vec::new()),
    }
}

/// Render the catalog form for `kind` in `mode`.
pub fn catalog_form_view(
    kind: CatalogKind,
    mode: CatalogFormMode,
    values: &CatalogFormData,
    parents: &[CatalogEntry],
    error_message: &str,
) -> Markup {
    let descriptor = kind.descriptor();
    let parent_field = descriptor
        .parent
        .as_ref()
        .filter(|_| mode.accepts(kind, CatalogField::Parent));
    let (create_endpoint, update_endpoint, submit_text) = match mode {
        CatalogFormMode::Create => (
            Some(format_catalog_endpoint(endpoints::CATALOG_API, kind, None)),
            None,
            format!("Create {}", descriptor.singular),
        ),
        CatalogFormMode::Update(id) => (
            None,
            Some(format_catalog_endpoint(endpoints::CATALOG_ENTRY, kind, Some(id))),
            format!("Update {}", descriptor.singular),
        ),
    };

    html! {
        form
            hx-post=[create_endpoint]
            hx-put=[update_endpoint]
            hx-target-error="#alert-container"
            "hx-target-422"="this"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(parent) = parent_field {
                div
                {
                    label for="parent" class=(FORM_LABEL_STYLE) { (parent.label) }

                    select id="parent" name="parent" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "---------" }

                        @for entry in parents {
                            option
                                value=(entry.id)
                                selected[values.parent == Some(entry.id)]
                            {
                                (entry.name)
                            }
                        }
                    }
                }
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder=(format!("{} Name", descriptor.singular))
                    value=(values.name)
                    maxlength="50"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

/// The response to a submission with invalid values: the form with the
/// submitted values and the error message.
pub fn invalid_catalog_form_response(
    kind: CatalogKind,
    mode: CatalogFormMode,
    values: &CatalogFormData,
    error: &Error,
    connection: &Connection,
) -> Response {
    match parent_options(kind, connection) {
        Ok(parents) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            catalog_form_view(kind, mode, values, &parents, &format!("Error: {error}")),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not load the parents of {kind}: {error}");
            error.into_alert_response()
        }
    }
}
