//! The operation form shared by the create and edit pages.
//!
//! [OPERATION_FORM] lists the fields each mode accepts. Both modes parse the
//! submitted form the same way, run the same validation and differ only in
//! how the result is written.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    DatabaseId, Error,
    catalog::{CatalogEntry, CatalogKind, list_catalog_entries},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        loading_spinner,
    },
    operation::{
        core::{Operation, OperationId, create_operation, update_operation},
        validation::{
            FieldError, OperationDraft, OperationField, ValidationErrors,
            validate_cleaned_operation,
        },
    },
};

/// Whether the form creates a new operation or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// A new operation, dated on submission.
    Create,
    /// An edit of the operation with this ID.
    Update(OperationId),
}

/// The fields that the operation form accepts in each mode.
#[derive(Debug)]
pub struct OperationFormDescriptor {
    pub create_fields: &'static [OperationField],
    pub update_fields: &'static [OperationField],
}

impl OperationFormDescriptor {
    pub fn fields(&self, mode: FormMode) -> &'static [OperationField] {
        match mode {
            FormMode::Create => self.create_fields,
            FormMode::Update(_) => self.update_fields,
        }
    }
}

/// New operations are dated today, so the date is only editable on update.
pub static OPERATION_FORM: OperationFormDescriptor = OperationFormDescriptor {
    create_fields: &[
        OperationField::Status,
        OperationField::Type,
        OperationField::Category,
        OperationField::Subcategory,
        OperationField::Amount,
        OperationField::Comment,
    ],
    update_fields: &[
        OperationField::CreationDate,
        OperationField::Status,
        OperationField::Type,
        OperationField::Category,
        OperationField::Subcategory,
        OperationField::Amount,
        OperationField::Comment,
    ],
};

/// The operation form as submitted, before any parsing.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationForm {
    pub creation_date: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub operation_type: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub amount: Option<String>,
    pub comment: Option<String>,
}

impl OperationForm {
    /// The form pre-filled with an existing operation.
    pub fn from_operation(operation: &Operation) -> Self {
        Self {
            creation_date: Some(operation.creation_date.to_string()),
            status: Some(operation.status_id.to_string()),
            operation_type: Some(operation.type_id.to_string()),
            category: Some(operation.category_id.to_string()),
            subcategory: Some(operation.subcategory_id.to_string()),
            amount: Some(operation.amount.to_string()),
            comment: operation.comment.clone(),
        }
    }

    fn raw_value(&self, field: OperationField) -> Option<&str> {
        let value = match field {
            OperationField::CreationDate => &self.creation_date,
            OperationField::Status => &self.status,
            OperationField::Type => &self.operation_type,
            OperationField::Category => &self.category,
            OperationField::Subcategory => &self.subcategory,
            OperationField::Amount => &self.amount,
            OperationField::Comment => &self.comment,
        };

        value.as_deref()
    }

    /// Parse the fields accepted in `mode` into a draft.
    ///
    /// Values that cannot be parsed are left out of the draft and reported
    /// as [FieldError::Invalid]. Fields that `mode` does not accept are
    /// ignored. New operations are dated `today`.
    pub fn clean(&self, mode: FormMode, today: Date) -> (OperationDraft, ValidationErrors) {
        let mut draft = OperationDraft::default();
        let mut errors = ValidationErrors::default();

        if mode == FormMode::Create {
            draft.creation_date = Some(today);
        }

        for &field in OPERATION_FORM.fields(mode) {
            let Some(raw) = self
                .raw_value(field)
                .map(str::trim)
                .filter(|raw| !raw.is_empty())
            else {
                continue;
            };

            let parsed = match field {
                OperationField::CreationDate => parse_date(raw)
                    .map(|date| draft.creation_date = Some(date)),
                OperationField::Status => parse_id(raw).map(|id| draft.status = Some(id)),
                OperationField::Type => parse_id(raw).map(|id| draft.operation_type = Some(id)),
                OperationField::Category => parse_id(raw).map(|id| draft.category = Some(id)),
                OperationField::Subcategory => {
                    parse_id(raw).map(|id| draft.subcategory = Some(id))
                }
                OperationField::Amount => Decimal::from_str_exact(raw)
                    .ok()
                    .map(|amount| draft.amount = Some(amount)),
                OperationField::Comment => {
                    draft.comment = Some(raw.to_owned());
                    Some(())
                }
            };

            if parsed.is_none() {
                errors.push(FieldError::Invalid(field));
            }
        }

        (draft, errors)
    }
}

fn parse_id(raw: &str) -> Option<DatabaseId> {
    raw.parse().ok()
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

/// Parse, validate and write a submitted operation form.
///
/// # Errors
/// Returns [Error::InvalidOperation] with every problem found if the form is
/// invalid, in which case nothing is written. Updating an operation that does
/// not exist returns [Error::UpdateMissingOperation].
pub fn submit_operation_form(
    form: &OperationForm,
    mode: FormMode,
    today: Date,
    connection: &Connection,
) -> Result<Operation, Error> {
    let (draft, cleaning_errors) = form.clean(mode, today);
    let operation = validate_cleaned_operation(draft, cleaning_errors, connection)?;

    match mode {
        FormMode::Create => create_operation(operation, connection),
        FormMode::Update(id) => update_operation(id, operation, connection),
    }
}

/// The catalog entries offered by the operation form's dropdowns.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogOptions {
    pub statuses: Vec<CatalogEntry>,
    pub types: Vec<CatalogEntry>,
    pub categories: Vec<CatalogEntry>,
    pub subcategories: Vec<CatalogEntry>,
}

impl CatalogOptions {
    pub fn load(connection: &Connection) -> Result<Self, Error> {
        Ok(Self {
            statuses: list_catalog_entries(CatalogKind::Status, None, connection)?,
            types: list_catalog_entries(CatalogKind::Type, None, connection)?,
            categories: list_catalog_entries(CatalogKind::Category, None, connection)?,
            subcategories: list_catalog_entries(CatalogKind::Subcategory, None, connection)?,
        })
    }

    fn for_field(&self, field: OperationField) -> &[CatalogEntry] {
        match field {
            OperationField::Status => &self.statuses,
            OperationField::Type => &self.types,
            OperationField::Category => &self.categories,
            OperationField::Subcategory => &self.subcategories,
            _ => &[],
        }
    }
}

/// Render the operation form for `mode`.
///
/// A rejected submission (422) replaces the form with the re-rendered one,
/// any other error status goes to the alert container.
pub fn operation_form_view(
    mode: FormMode,
    values: &OperationForm,
    options: &CatalogOptions,
    errors: &ValidationErrors,
) -> Markup {
    let (create_endpoint, update_endpoint, submit_text) = match mode {
        FormMode::Create => (Some(endpoints::OPERATIONS_API.to_owned()), None, "Create Operation"),
        FormMode::Update(id) => (
            None,
            Some(endpoints::format_endpoint(endpoints::OPERATION, id)),
            "Update Operation",
        ),
    };

    html! {
        form
            id="operation-form"
            hx-post=[create_endpoint]
            hx-put=[update_endpoint]
            hx-target-error="#alert-container"
            "hx-target-422"="this"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            (operation_form_fields(mode, values, options, errors))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " " (submit_text)
            }
        }
    }
}

/// The response to a submission that failed validation: the form with the
/// submitted values and an error under each invalid field.
pub fn invalid_operation_form_response(
    mode: FormMode,
    values: &OperationForm,
    errors: &ValidationErrors,
    connection: &Connection,
) -> Response {
    match CatalogOptions::load(connection) {
        Ok(options) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            operation_form_view(mode, values, &options, errors),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not load the catalog for the operation form: {error}");
            error.into_alert_response()
        }
    }
}

/// Render the inputs for the fields accepted in `mode`, each followed by its
/// error message if it has one.
pub fn operation_form_fields(
    mode: FormMode,
    values: &OperationForm,
    options: &CatalogOptions,
    errors: &ValidationErrors,
) -> Markup {
    html! {
        @for &field in OPERATION_FORM.fields(mode) {
            div
            {
                label for=(field.name()) class=(FORM_LABEL_STYLE) { (field.label()) }

                (field_input(field, values.raw_value(field), options))

                @if let Some(error) = errors.for_field(field) {
                    p class=(FORM_ERROR_STYLE) { (error) }
                }
            }
        }
    }
}

fn field_input(field: OperationField, value: Option<&str>, options: &CatalogOptions) -> Markup {
    match field {
        OperationField::CreationDate => html! {
            input
                id=(field.name())
                name=(field.name())
                type="date"
                value=[value]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        },
        OperationField::Amount => html! {
            input
                id=(field.name())
                name=(field.name())
                type="number"
                step="0.01"
                min="0"
                placeholder="0.00"
                value=[value]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        },
        OperationField::Comment => html! {
            input
                id=(field.name())
                name=(field.name())
                type="text"
                maxlength="150"
                placeholder="Comment"
                value=[value]
                class=(FORM_TEXT_INPUT_STYLE);
        },
        OperationField::Status
        | OperationField::Type
        | OperationField::Category
        | OperationField::Subcategory => {
            let selected = value.and_then(|value| value.trim().parse::<DatabaseId>().ok());

            html! {
                select
                    id=(field.name())
                    name=(field.name())
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "---------" }

                    @for entry in options.for_field(field) {
                        option
                            value=(entry.id)
                            data-parent=[entry.parent_id]
                            selected[selected == Some(entry.id)]
                        {
                            (entry.name)
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        catalog::{CatalogEntry, CatalogKind, CatalogName},
        operation::validation::{FieldError, OperationField, ValidationErrors},
    };

    use super::{CatalogOptions, FormMode, OperationForm, operation_form_fields};

    fn filled_form() -> OperationForm {
        OperationForm {
            creation_date: Some("2024-12-31".to_owned()),
            status: Some("1".to_owned()),
            operation_type: Some("2".to_owned()),
            category: Some("3".to_owned()),
            subcategory: Some("4".to_owned()),
            amount: Some("100.50".to_owned()),
            comment: Some("Invoice".to_owned()),
        }
    }

    #[test]
    fn create_ignores_submitted_date_and_uses_today() {
        let (draft, errors) = filled_form().clean(FormMode::Create, date!(2025 - 01 - 15));

        assert!(errors.is_empty());
        assert_eq!(draft.creation_date, Some(date!(2025 - 01 - 15)));
        assert_eq!(draft.status, Some(1));
        assert_eq!(draft.operation_type, Some(2));
        assert_eq!(draft.category, Some(3));
        assert_eq!(draft.subcategory, Some(4));
        assert_eq!(draft.amount, Some(Decimal::from_str("100.50").unwrap()));
        assert_eq!(draft.comment.as_deref(), Some("Invoice"));
    }

    #[test]
    fn update_uses_submitted_date() {
        let (draft, errors) = filled_form().clean(FormMode::Update(1), date!(2025 - 01 - 15));

        assert!(errors.is_empty());
        assert_eq!(draft.creation_date, Some(date!(2024 - 12 - 31)));
    }

    #[test]
    fn blank_values_are_missing() {
        let form = OperationForm {
            status: Some("  ".to_owned()),
            amount: Some(String::new()),
            ..filled_form()
        };

        let (draft, errors) = form.clean(FormMode::Create, date!(2025 - 01 - 15));

        assert!(errors.is_empty());
        assert_eq!(draft.status, None);
        assert_eq!(draft.amount, None);
    }

    #[test]
    fn unparseable_values_are_reported() {
        let form = OperationForm {
            creation_date: Some("31/12/2024".to_owned()),
            status: Some("abc".to_owned()),
            amount: Some("ten".to_owned()),
            ..filled_form()
        };

        let (draft, errors) = form.clean(FormMode::Update(1), date!(2025 - 01 - 15));

        assert_eq!(draft.creation_date, None);
        assert_eq!(draft.status, None);
        assert_eq!(draft.amount, None);
        assert_eq!(
            errors.iter().cloned().collect::<Vec<_>>(),
            vec![
                FieldError::Invalid(OperationField::CreationDate),
                FieldError::Invalid(OperationField::Status),
                FieldError::Invalid(OperationField::Amount),
            ]
        );
    }

    #[test]
    fn amount_that_would_be_rounded_is_reported() {
        let form = OperationForm {
            amount: Some("9999999999999999999999999999.99".to_owned()),
            ..filled_form()
        };

        let (draft, errors) = form.clean(FormMode::Create, date!(2025 - 01 - 15));

        assert_eq!(draft.amount, None);
        assert_eq!(
            errors.iter().cloned().collect::<Vec<_>>(),
            vec![FieldError::Invalid(OperationField::Amount)]
        );
    }

    #[test]
    fn fields_render_values_options_and_errors() {
        let options = CatalogOptions {
            statuses: vec![
                CatalogEntry {
                    kind: CatalogKind::Status,
                    id: 1,
                    name: CatalogName::new_unchecked("Business"),
                    parent_id: None,
                },
                CatalogEntry {
                    kind: CatalogKind::Status,
                    id: 2,
                    name: CatalogName::new_unchecked("Personal"),
                    parent_id: None,
                },
            ],
            ..Default::default()
        };
        let form = OperationForm {
            status: Some("2".to_owned()),
            ..Default::default()
        };
        let mut errors = ValidationErrors::default();
        errors.push(FieldError::TooManyDecimalPlaces);

        let markup = maud::html! {
            form { (operation_form_fields(FormMode::Create, &form, &options, &errors)) }
        };
        let html = Html::parse_document(&markup.into_string());

        let selected = html
            .select(&Selector::parse("select[name=status] option[selected]").unwrap())
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(selected, vec!["2"]);
        assert_eq!(
            html.select(&Selector::parse("input[name=creation_date]").unwrap())
                .count(),
            0,
            "the date is not editable when creating an operation"
        );
        let error_messages = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(
            error_messages,
            vec!["Ensure that there are no more than 2 decimal places"]
        );
    }
}
