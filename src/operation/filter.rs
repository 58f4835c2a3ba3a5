//! Filtered, ordered and paged views of the stored operations.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    DatabaseId, Error,
    catalog::{CatalogKind, map_catalog_row},
    operation::core::{ResolvedOperation, map_operation_row},
};

/// The raw query string of the operations page.
///
/// Every value is kept as submitted so that it can be echoed back into the
/// filter form and pagination links.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OperationsQuery {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub type_obj: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub page: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|value| value.trim().is_empty())
}

impl OperationsQuery {
    /// The query string for `page` with the current filters.
    pub fn to_page_query_string(&self, page: u64) -> String {
        let query = Self {
            page: Some(page.to_string()),
            ..self.clone()
        };

        serde_urlencoded::to_string(&query).unwrap_or_else(|error| {
            tracing::error!("could not encode operations query {query:?}: {error}");
            format!("page={page}")
        })
    }
}

/// The filters that apply to a list of operations.
///
/// All filters must match (AND). An empty filter matches every operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OperationFilter {
    /// Inclusive lower bound on the creation date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on the creation date.
    pub date_to: Option<Date>,
    pub status: Option<DatabaseId>,
    pub operation_type: Option<DatabaseId>,
    pub category: Option<DatabaseId>,
    pub subcategory: Option<DatabaseId>,
}

impl OperationFilter {
    /// Build a filter from the raw query.
    ///
    /// An ID is only used if it consists of ASCII digits, and a date only if it
    /// is a valid `YYYY-MM-DD` date. Anything else is ignored rather than
    /// rejected.
    pub fn from_query(query: &OperationsQuery) -> Self {
        Self {
            date_from: parse_date(query.date_from.as_deref()),
            date_to: parse_date(query.date_to.as_deref()),
            status: parse_id(query.status.as_deref()),
            operation_type: parse_id(query.type_obj.as_deref()),
            category: parse_id(query.category.as_deref()),
            subcategory: parse_id(query.subcategory.as_deref()),
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        let dates = [
            ("operation.creation_date >=", self.date_from),
            ("operation.creation_date <=", self.date_to),
        ];
        for (condition, date) in dates {
            if let Some(date) = date {
                params.push(Value::Text(date.to_string()));
                conditions.push(format!("{condition} ?{}", params.len()));
            }
        }

        let ids = [
            ("operation.status_id =", self.status),
            ("operation.type_id =", self.operation_type),
            ("operation.category_id =", self.category),
            ("operation.subcategory_id =", self.subcategory),
        ];
        for (condition, id) in ids {
            if let Some(id) = id {
                params.push(Value::Integer(id));
                conditions.push(format!("{condition} ?{}", params.len()));
            }
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

fn parse_id(raw: Option<&str>) -> Option<DatabaseId> {
    let raw = raw?.trim();

    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    raw.parse().ok()
}

fn parse_date(raw: Option<&str>) -> Option<Date> {
    let raw = raw?.trim();

    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

/// Get a page of the operations that match `filter`, most recent first.
///
/// Operations on the same date are ordered by ID, newest first. Each
/// operation is returned with its catalog entries, loaded in the same query.
pub fn query_operations(
    filter: &OperationFilter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<ResolvedOperation>, Error> {
    let (where_clause, mut params) = filter.where_clause();
    params.push(Value::Integer(limit as i64));
    let limit_param = params.len();
    params.push(Value::Integer(offset as i64));
    let offset_param = params.len();

    let query = format!(
        "SELECT operation.id, operation.creation_date, operation.status_id, operation.type_id, \
            operation.category_id, operation.subcategory_id, operation.amount, operation.comment, \
            status.id, status.name, NULL, \
            operation_type.id, operation_type.name, NULL, \
            category.id, category.name, category.type_id, \
            subcategory.id, subcategory.name, subcategory.category_id \
        FROM operation \
        INNER JOIN status ON operation.status_id = status.id \
        INNER JOIN operation_type ON operation.type_id = operation_type.id \
        INNER JOIN category ON operation.category_id = category.id \
        INNER JOIN subcategory ON operation.subcategory_id = subcategory.id\
        {where_clause} \
        ORDER BY operation.creation_date DESC, operation.id DESC \
        LIMIT ?{limit_param} OFFSET ?{offset_param};"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(ResolvedOperation {
                operation: map_operation_row(row, 0)?,
                status: map_catalog_row(CatalogKind::Status, row, 8)?,
                operation_type: map_catalog_row(CatalogKind::Type, row, 11)?,
                category: map_catalog_row(CatalogKind::Category, row, 14)?,
                subcategory: map_catalog_row(CatalogKind::Subcategory, row, 17)?,
            })
        })?
        .map(|maybe_operation| maybe_operation.map_err(|error| error.into()))
        .collect()
}

/// Count the operations that match `filter`.
pub fn count_operations(filter: &OperationFilter, connection: &Connection) -> Result<u64, Error> {
    let (where_clause, params) = filter.where_clause();

    let count: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM operation{where_clause};"),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    Ok(count.max(0) as u64)
}
