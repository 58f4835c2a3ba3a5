use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    CatalogEntry, CatalogKind, CatalogName, create_catalog_entry, db::initialize,
    operation::{Operation, OperationDraft, create_operation, validate_operation},
};

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// A small catalog with two branches:
/// Income > Sales > Online and Expense > Marketing > Avito.
pub(crate) struct CatalogFixture {
    pub business: CatalogEntry,
    pub income: CatalogEntry,
    pub expense: CatalogEntry,
    pub sales: CatalogEntry,
    pub marketing: CatalogEntry,
    pub online: CatalogEntry,
    pub avito: CatalogEntry,
}

fn insert(
    kind: CatalogKind,
    name: &str,
    parent: Option<&CatalogEntry>,
    connection: &Connection,
) -> CatalogEntry {
    create_catalog_entry(
        kind,
        CatalogName::new_unchecked(name),
        parent.map(|parent| parent.id),
        connection,
    )
    .unwrap_or_else(|error| panic!("Could not create {kind} {name}: {error}"))
}

pub(crate) fn seed_catalog(connection: &Connection) -> CatalogFixture {
    let business = insert(CatalogKind::Status, "Business", None, connection);
    let income = insert(CatalogKind::Type, "Income", None, connection);
    let expense = insert(CatalogKind::Type, "Expense", None, connection);
    let sales = insert(CatalogKind::Category, "Sales", Some(&income), connection);
    let marketing = insert(CatalogKind::Category, "Marketing", Some(&expense), connection);
    let online = insert(CatalogKind::Subcategory, "Online", Some(&sales), connection);
    let avito = insert(CatalogKind::Subcategory, "Avito", Some(&marketing), connection);

    CatalogFixture {
        business,
        income,
        expense,
        sales,
        marketing,
        online,
        avito,
    }
}

impl CatalogFixture {
    /// A complete draft on the Income > Sales > Online branch.
    pub fn income_draft(&self, creation_date: Date, amount: &str) -> OperationDraft {
        OperationDraft {
            creation_date: Some(creation_date),
            status: Some(self.business.id),
            operation_type: Some(self.income.id),
            category: Some(self.sales.id),
            subcategory: Some(self.online.id),
            amount: Some(Decimal::from_str(amount).expect("Invalid test amount")),
            comment: None,
        }
    }

    /// A complete draft on the Expense > Marketing > Avito branch.
    pub fn expense_draft(&self, creation_date: Date, amount: &str) -> OperationDraft {
        OperationDraft {
            operation_type: Some(self.expense.id),
            category: Some(self.marketing.id),
            subcategory: Some(self.avito.id),
            ..self.income_draft(creation_date, amount)
        }
    }
}

pub(crate) fn insert_operation(draft: OperationDraft, connection: &Connection) -> Operation {
    let operation = validate_operation(draft, connection).expect("Invalid test operation");

    create_operation(operation, connection).expect("Could not create test operation")
}
