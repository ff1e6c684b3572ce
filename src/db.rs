//! Database initialisation and optional demo data seeding.

use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    category::{self, CategoryName, create_category, get_all_categories},
    entry_type::EntryType,
    transaction::{self, NewTransaction, count_transactions, create_transaction},
};

/// Prepare a connection for use by the app.
///
/// Enables foreign key enforcement for the connection and creates the tables
/// if they do not exist yet. Safe to call on every startup.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    category::create_categories_table(connection)?;
    transaction::create_transactions_table(connection)?;

    Ok(())
}

/// Populate the database with a starter set of categories and, if no
/// transactions have been recorded yet, a handful of sample transactions
/// dated relative to today.
///
/// Categories that already exist are left alone, so seeding an existing
/// database is safe.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn seed_demo_data(connection: &Connection) -> Result<(), Error> {
    let demo_categories = [
        ("Food", EntryType::Expense),
        ("Rent", EntryType::Expense),
        ("Salary", EntryType::Income),
        ("Transportation", EntryType::Expense),
        ("Entertainment", EntryType::Expense),
        ("Utilities", EntryType::Expense),
        ("Freelance Income", EntryType::Income),
    ];

    for (name, entry_type) in demo_categories {
        match create_category(CategoryName::new_unchecked(name), entry_type, connection) {
            Ok(_) | Err(Error::DuplicateCategoryName(_)) => {}
            Err(error) => return Err(error),
        }
    }

    if count_transactions(connection)? > 0 {
        return Ok(());
    }

    let category_ids: std::collections::HashMap<String, i64> = get_all_categories(connection)?
        .into_iter()
        .map(|category| (category.name.to_string(), category.id))
        .collect();

    let id_of = |name: &str| category_ids.get(name).copied().ok_or(Error::NotFound);

    let today = OffsetDateTime::now_utc().date();

    let demo_transactions = [
        (5, "50.75", EntryType::Expense, "Groceries", "Food"),
        (3, "15.00", EntryType::Expense, "Bus fare", "Transportation"),
        (2, "1200.00", EntryType::Income, "Monthly Salary", "Salary"),
        (1, "25.50", EntryType::Expense, "Movie ticket", "Entertainment"),
        (0, "8.20", EntryType::Expense, "Coffee", "Food"),
        (0, "500.00", EntryType::Income, "Project payment", "Freelance Income"),
        (35, "800.00", EntryType::Expense, "Monthly Rent", "Rent"),
        (30, "150.00", EntryType::Expense, "Electricity Bill", "Utilities"),
    ];

    for (days_ago, amount, entry_type, description, category_name) in demo_transactions {
        create_transaction(
            NewTransaction {
                date: today - Duration::days(days_ago),
                amount: amount
                    .parse()
                    .map_err(|_| Error::InvalidAmount(amount.to_string()))?,
                entry_type,
                description: Some(description.to_string()),
                category_id: id_of(category_name)?,
            },
            connection,
        )?;
    }

    tracing::info!("seeded the database with demo categories and transactions");

    Ok(())
}
