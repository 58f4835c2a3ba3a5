//! Checks a proposed operation against the catalog before it is written.
//!
//! Every field is checked, and every failure is reported, so that a form can
//! show all of its problems at once. The write is rejected if any check fails.

use std::fmt::Display;

use rust_decimal::Decimal;
use time::Date;

use crate::{
    DatabaseId, Error,
    catalog::{CatalogEntry, CatalogKind, CatalogLookup},
    operation::core::ValidOperation,
};

/// The maximum number of characters in an operation comment.
pub const MAX_COMMENT_LENGTH: usize = 150;

/// The maximum number of digits after the decimal point of an amount.
pub const MAX_AMOUNT_DECIMAL_PLACES: u32 = 2;

/// The maximum number of digits before the decimal point of an amount.
///
/// With two decimal places this is the most a [Decimal] mantissa holds for
/// every value, so an accepted amount is always stored exactly.
pub const MAX_AMOUNT_WHOLE_DIGITS: usize = 26;

/// A field of an operation, in the order the fields are checked and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationField {
    /// The date the operation was recorded.
    CreationDate,
    /// The status catalog reference.
    Status,
    /// The operation type catalog reference.
    Type,
    /// The category catalog reference.
    Category,
    /// The subcategory catalog reference.
    Subcategory,
    /// The amount of money moved.
    Amount,
    /// The free-text comment.
    Comment,
}

impl OperationField {
    /// The name of the field in forms and query strings.
    pub fn name(self) -> &'static str {
        match self {
            OperationField::CreationDate => "creation_date",
            OperationField::Status => "status",
            OperationField::Type => "type",
            OperationField::Category => "category",
            OperationField::Subcategory => "subcategory",
            OperationField::Amount => "amount",
            OperationField::Comment => "comment",
        }
    }

    /// The human readable name of the field.
    pub fn label(self) -> &'static str {
        match self {
            OperationField::CreationDate => "Date",
            OperationField::Status => "Status",
            OperationField::Type => "Type",
            OperationField::Category => "Category",
            OperationField::Subcategory => "Subcategory",
            OperationField::Amount => "Amount",
            OperationField::Comment => "Comment",
        }
    }

    /// The catalog kind that a reference field points to.
    pub fn catalog_kind(self) -> Option<CatalogKind> {
        match self {
            OperationField::Status => Some(CatalogKind::Status),
            OperationField::Type => Some(CatalogKind::Type),
            OperationField::Category => Some(CatalogKind::Category),
            OperationField::Subcategory => Some(CatalogKind::Subcategory),
            OperationField::CreationDate | OperationField::Amount | OperationField::Comment => None,
        }
    }
}

/// A problem with one field of a proposed operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The field was not supplied.
    #[error("This field is required")]
    Required(OperationField),

    /// The submitted value could not be parsed, e.g. "abc" for an amount.
    #[error("Enter a valid value")]
    Invalid(OperationField),

    /// The field refers to a catalog entry that does not exist.
    #[error("{}", invalid_reference_message(.0))]
    InvalidReference(OperationField),

    /// The category does not belong to the type.
    #[error("Category \"{category}\" does not belong to type \"{operation_type}\"")]
    CategoryNotInType {
        /// The name of the selected category.
        category: String,
        /// The name of the selected type.
        operation_type: String,
    },

    /// The subcategory does not belong to the category.
    #[error("Subcategory \"{subcategory}\" does not belong to category \"{category}\"")]
    SubcategoryNotInCategory {
        /// The name of the selected subcategory.
        subcategory: String,
        /// The name of the selected category.
        category: String,
    },

    /// The amount is below zero.
    #[error("Amount must be positive: {0}")]
    NegativeAmount(Decimal),

    /// The amount has more than [MAX_AMOUNT_DECIMAL_PLACES] digits after the
    /// decimal point.
    #[error("Ensure that there are no more than {MAX_AMOUNT_DECIMAL_PLACES} decimal places")]
    TooManyDecimalPlaces,

    /// The amount has more than [MAX_AMOUNT_WHOLE_DIGITS] digits before the
    /// decimal point.
    #[error("Ensure that there are no more than {MAX_AMOUNT_WHOLE_DIGITS} digits before the decimal point")]
    AmountTooLarge,

    /// The comment is longer than [MAX_COMMENT_LENGTH] characters. Holds the
    /// length of the submitted comment.
    #[error("Ensure this value has at most {MAX_COMMENT_LENGTH} characters (it has {0})")]
    CommentTooLong(usize),
}

fn invalid_reference_message(field: &OperationField) -> &'static str {
    match field {
        OperationField::Status => "Select an existing status",
        OperationField::Type => "Selected type does not exist",
        OperationField::Category => "Selected category does not exist",
        OperationField::Subcategory => "Selected subcategory does not exist",
        _ => "Select a valid choice",
    }
}

impl FieldError {
    /// The field the error should be shown next to.
    pub fn field(&self) -> OperationField {
        match self {
            FieldError::Required(field)
            | FieldError::Invalid(field)
            | FieldError::InvalidReference(field) => *field,
            FieldError::CategoryNotInType { .. } => OperationField::Category,
            FieldError::SubcategoryNotInCategory { .. } => OperationField::Subcategory,
            FieldError::NegativeAmount(_)
            | FieldError::TooManyDecimalPlaces
            | FieldError::AmountTooLarge => OperationField::Amount,
            FieldError::CommentTooLong(_) => OperationField::Comment,
        }
    }
}

/// All the problems found with a proposed operation, in field order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Record another problem.
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Whether no problems were found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The problems in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The error reported for `field`, if any.
    pub fn for_field(&self, field: OperationField) -> Option<&FieldError> {
        self.0.iter().find(|error| error.field() == field)
    }

    fn has_error_for(&self, field: OperationField) -> bool {
        self.for_field(field).is_some()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {error}", error.field().label())?;
        }

        Ok(())
    }
}

/// A proposed operation. Any field may be missing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationDraft {
    /// The date the operation was recorded.
    pub creation_date: Option<Date>,
    /// The ID of a status.
    pub status: Option<DatabaseId>,
    /// The ID of an operation type.
    pub operation_type: Option<DatabaseId>,
    /// The ID of a category of `operation_type`.
    pub category: Option<DatabaseId>,
    /// The ID of a subcategory of `category`.
    pub subcategory: Option<DatabaseId>,
    /// The amount as submitted, before rescaling.
    pub amount: Option<Decimal>,
    /// The comment as submitted, before trimming.
    pub comment: Option<String>,
}

/// Check a proposed operation against the catalog.
///
/// The same checks run for new operations and for updates. The checks are:
/// 1. every field except the comment is present,
/// 2. the status, type, category and subcategory exist,
/// 3. the category belongs to the type and the subcategory belongs to the
///    category (only checked when both sides exist),
/// 4. the amount has at most two decimal places, at most
///    [MAX_AMOUNT_WHOLE_DIGITS] digits before the point and is not negative
///    (zero is allowed),
/// 5. the comment is at most [MAX_COMMENT_LENGTH] characters long.
///
/// A comment that is empty or only whitespace is treated as no comment.
///
/// # Errors
/// Returns [Error::InvalidOperation] with every failed check if any check
/// fails, or an [Error::SqlError] if the catalog could not be read.
pub fn validate_operation(
    draft: OperationDraft,
    catalog: &impl CatalogLookup,
) -> Result<ValidOperation, Error> {
    validate_cleaned_operation(draft, ValidationErrors::default(), catalog)
}

/// Like [validate_operation], but starts from the errors found while parsing
/// the submitted form.
///
/// A field listed in `cleaning_errors` is not also reported as missing.
pub(crate) fn validate_cleaned_operation(
    draft: OperationDraft,
    cleaning_errors: ValidationErrors,
    catalog: &impl CatalogLookup,
) -> Result<ValidOperation, Error> {
    let mut errors = cleaning_errors;

    let creation_date = require(draft.creation_date, OperationField::CreationDate, &mut errors);
    let status = resolve(draft.status, OperationField::Status, catalog, &mut errors)?;
    let operation_type = resolve(draft.operation_type, OperationField::Type, catalog, &mut errors)?;
    let category = resolve(draft.category, OperationField::Category, catalog, &mut errors)?;
    let subcategory = resolve(draft.subcategory, OperationField::Subcategory, catalog, &mut errors)?;

    if let (Some(operation_type), Some(category)) = (&operation_type, &category)
        && category.parent_id != Some(operation_type.id)
    {
        errors.push(FieldError::CategoryNotInType {
            category: category.name.to_string(),
            operation_type: operation_type.name.to_string(),
        });
    }

    if let (Some(category), Some(subcategory)) = (&category, &subcategory)
        && subcategory.parent_id != Some(category.id)
    {
        errors.push(FieldError::SubcategoryNotInCategory {
            subcategory: subcategory.name.to_string(),
            category: category.name.to_string(),
        });
    }

    let amount = match require(draft.amount, OperationField::Amount, &mut errors) {
        Some(amount) if amount.scale() > MAX_AMOUNT_DECIMAL_PLACES => {
            errors.push(FieldError::TooManyDecimalPlaces);
            None
        }
        Some(amount) if amount < Decimal::ZERO => {
            errors.push(FieldError::NegativeAmount(amount));
            None
        }
        Some(amount) if whole_digits(amount) > MAX_AMOUNT_WHOLE_DIGITS => {
            errors.push(FieldError::AmountTooLarge);
            None
        }
        Some(mut amount) => {
            amount.rescale(MAX_AMOUNT_DECIMAL_PLACES);

            if amount.scale() == MAX_AMOUNT_DECIMAL_PLACES {
                Some(amount)
            } else {
                errors.push(FieldError::AmountTooLarge);
                None
            }
        }
        None => None,
    };

    let comment = draft
        .comment
        .map(|comment| comment.trim().to_owned())
        .filter(|comment| !comment.is_empty());

    if let Some(comment) = &comment {
        let length = comment.chars().count();

        if length > MAX_COMMENT_LENGTH {
            errors.push(FieldError::CommentTooLong(length));
        }
    }

    match (
        creation_date,
        status,
        operation_type,
        category,
        subcategory,
        amount,
    ) {
        (
            Some(creation_date),
            Some(status),
            Some(operation_type),
            Some(category),
            Some(subcategory),
            Some(amount),
        ) if errors.is_empty() => Ok(ValidOperation {
            creation_date,
            status_id: status.id,
            type_id: operation_type.id,
            category_id: category.id,
            subcategory_id: subcategory.id,
            amount,
            comment,
        }),
        _ => {
            errors.0.sort_by_key(FieldError::field);
            Err(Error::InvalidOperation(errors))
        }
    }
}

fn require<T>(value: Option<T>, field: OperationField, errors: &mut ValidationErrors) -> Option<T> {
    if value.is_none() && !errors.has_error_for(field) {
        errors.push(FieldError::Required(field));
    }

    value
}

fn whole_digits(amount: Decimal) -> usize {
    amount.trunc().abs().to_string().len()
}

fn resolve(
    id: Option<DatabaseId>,
    field: OperationField,
    catalog: &impl CatalogLookup,
    errors: &mut ValidationErrors,
) -> Result<Option<CatalogEntry>, Error> {
    let (Some(id), Some(kind)) = (require(id, field, errors), field.catalog_kind()) else {
        return Ok(None);
    };

    let entry = catalog.get(kind, id)?;

    if entry.is_none() {
        errors.push(FieldError::InvalidReference(field));
    }

    Ok(entry)
}
