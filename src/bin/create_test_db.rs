use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use cashflow_rs::{
    CatalogEntry, CatalogKind, CatalogName, OperationDraft, create_catalog_entry,
    create_operation, initialize_db, validate_operation,
};

/// A utility for creating a demo database for the cashflow_rs server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating catalog...");
    let catalog = create_catalog(&conn)?;

    println!("Creating operations...");
    let count = create_operations(&catalog, &conn)?;

    println!("Created {count} operations.");
    println!("Success!");

    Ok(())
}

struct DemoCatalog {
    statuses: Vec<CatalogEntry>,
    /// (type, category, subcategory) triples that satisfy the hierarchy.
    branches: Vec<(CatalogEntry, CatalogEntry, CatalogEntry)>,
}

fn insert(
    kind: CatalogKind,
    name: &str,
    parent: Option<&CatalogEntry>,
    conn: &Connection,
) -> Result<CatalogEntry, Box<dyn Error>> {
    let entry = create_catalog_entry(
        kind,
        CatalogName::new(name)?,
        parent.map(|parent| parent.id),
        conn,
    )?;

    Ok(entry)
}

fn create_catalog(conn: &Connection) -> Result<DemoCatalog, Box<dyn Error>> {
    let statuses = ["Business", "Personal", "Tax"]
        .into_iter()
        .map(|name| insert(CatalogKind::Status, name, None, conn))
        .collect::<Result<Vec<_>, _>>()?;

    let tree: [(&str, &[(&str, &[&str])]); 2] = [
        (
            "Income",
            &[
                ("Sales", &["Online", "Retail"]),
                ("Investments", &["Dividends"]),
            ],
        ),
        (
            "Expense",
            &[
                ("Infrastructure", &["VPS", "Proxy"]),
                ("Marketing", &["Farpost", "Avito"]),
            ],
        ),
    ];

    let mut branches = Vec::new();

    for (type_name, categories) in tree {
        let operation_type = insert(CatalogKind::Type, type_name, None, conn)?;

        for (category_name, subcategories) in categories {
            let category = insert(
                CatalogKind::Category,
                category_name,
                Some(&operation_type),
                conn,
            )?;

            for subcategory_name in *subcategories {
                let subcategory = insert(
                    CatalogKind::Subcategory,
                    subcategory_name,
                    Some(&category),
                    conn,
                )?;

                branches.push((operation_type.clone(), category.clone(), subcategory));
            }
        }
    }

    Ok(DemoCatalog { statuses, branches })
}

fn create_operations(catalog: &DemoCatalog, conn: &Connection) -> Result<usize, Box<dyn Error>> {
    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for day in 0..30_i64 {
        let creation_date: Date = today - Duration::days(day);
        let (operation_type, category, subcategory) =
            &catalog.branches[day as usize % catalog.branches.len()];
        let status = &catalog.statuses[day as usize % catalog.statuses.len()];
        let amount = Decimal::from_str(&format!("{}.{:02}", 100 + day * 37, (day * 13) % 100))?;

        let draft = OperationDraft {
            creation_date: Some(creation_date),
            status: Some(status.id),
            operation_type: Some(operation_type.id),
            category: Some(category.id),
            subcategory: Some(subcategory.id),
            amount: Some(amount),
            comment: (day % 3 == 0).then(|| format!("Demo operation {}", day + 1)),
        };

        let operation = validate_operation(draft, conn)?;
        create_operation(operation, conn)?;
        count += 1;
    }

    Ok(count)
}
