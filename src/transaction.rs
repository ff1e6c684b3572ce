//! This file defines the `Transaction` type, the database functions for
//! storing, listing, and aggregating transactions, and the route handlers
//! for creating and deleting them.

use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    alert::{NoticeKind, redirect_with_notice},
    category::{CategoryId, CategoryName},
    endpoints,
    entry_type::EntryType,
};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// A single dated monetary movement, linked to one category.
///
/// The amount is a magnitude: its direction is carried by `entry_type`, not
/// by the sign. Transactions are created and deleted, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned, always non-negative.
    pub amount: Decimal,
    /// Whether the money was spent or earned.
    pub entry_type: EntryType,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The ID of the category this transaction belongs to.
    pub category_id: CategoryId,
}

/// The data needed to create a [Transaction].
///
/// The database assigns the ID on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned. Rounded to two decimal places
    /// on insertion.
    pub amount: Decimal,
    /// Whether the money was spent or earned.
    pub entry_type: EntryType,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The ID of the category this transaction belongs to.
    pub category_id: CategoryId,
}

/// A transaction joined with the name and type of its category, as shown on
/// the summary page.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionWithCategory {
    /// The transaction itself.
    pub transaction: Transaction,
    /// The name of the transaction's category.
    pub category_name: CategoryName,
    /// The type of the transaction's category.
    ///
    /// Not required to match the transaction's own entry type.
    pub category_type: EntryType,
}

/// The calendar month containing `date`, as an inclusive date range.
pub fn month_of(date: Date) -> RangeInclusive<Date> {
    // Day 1 and the month's length are always valid days for `date`'s month,
    // so the fallbacks are unreachable.
    let start = date.replace_day(1).unwrap_or(date);
    let end = date
        .replace_day(date.month().length(date.year()))
        .unwrap_or(date);

    start..=end
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The state needed for creating and deleting transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection shared with the rest of the app.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The date when the transaction occurred.
    pub transaction_date: Date,
    /// The value of the transaction in dollars, as entered by the user.
    pub amount: String,
    /// "Expense" or "Income".
    pub transaction_type: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// Text detailing the transaction. May be empty.
    #[serde(default)]
    pub description: String,
}

/// A route handler for creating a new transaction, redirects to the summary
/// page on success.
///
/// Invalid amounts and unknown types are rejected before anything is written.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Form(form_data): Form<TransactionForm>,
) -> Response {
    let amount = match parse_amount(&form_data.amount) {
        Ok(amount) => amount,
        Err(error) => {
            return redirect_with_notice(endpoints::ROOT, NoticeKind::Error, &error.to_string())
                .into_response();
        }
    };

    let entry_type = match form_data.transaction_type.parse::<EntryType>() {
        Ok(entry_type) => entry_type,
        Err(error) => {
            return redirect_with_notice(endpoints::ROOT, NoticeKind::Error, &error.to_string())
                .into_response();
        }
    };

    let description = match form_data.description.trim() {
        "" => None,
        trimmed => Some(trimmed.to_string()),
    };

    let new_transaction = NewTransaction {
        date: form_data.transaction_date,
        amount,
        entry_type,
        description,
        category_id: form_data.category_id,
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_transaction(new_transaction, &connection) {
        Ok(_) => redirect_with_notice(
            endpoints::ROOT,
            NoticeKind::Success,
            "Transaction added successfully!",
        )
        .into_response(),
        Err(error @ Error::InvalidCategory(_)) => {
            redirect_with_notice(endpoints::ROOT, NoticeKind::Error, &error.to_string())
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a transaction: {error}");
            error.into_response()
        }
    }
}

/// A route handler for deleting a transaction by its ID.
///
/// Deleting an ID that is not in the database is reported as a success: the
/// end state is the same either way.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_transaction(transaction_id, &connection) {
        Ok(_) => redirect_with_notice(
            endpoints::ROOT,
            NoticeKind::Success,
            "Transaction deleted successfully!",
        )
        .into_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting transaction {transaction_id}: {error}"
            );
            error.into_response()
        }
    }
}

/// Parse a user-supplied amount string into a non-negative [Decimal].
///
/// # Errors
/// Returns an [Error::InvalidAmount] if the string is not a decimal number or
/// is negative.
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    let amount: Decimal = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidAmount(text.to_string()))?;

    if amount.is_sign_negative() {
        return Err(Error::InvalidAmount(text.to_string()));
    }

    Ok(amount)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return an [Error::InvalidCategory] if `category_id`
/// does not refer to an existing category, or an error if there is some other
/// SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = new_transaction.amount.round_dp(2);

    connection
        .execute(
            "INSERT INTO Transactions (transaction_date, amount, transaction_type, description, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            (
                new_transaction.date,
                amount.to_string(),
                new_transaction.entry_type.as_str(),
                &new_transaction.description,
                new_transaction.category_id,
            ),
        )
        .map_err(|error| match error {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidCategory(new_transaction.category_id)
            }
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        date: new_transaction.date,
        amount,
        entry_type: new_transaction.entry_type,
        description: new_transaction.description,
        category_id: new_transaction.category_id,
    })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return an [Error::NotFound] if `id` does not refer to a
/// valid transaction, or an error if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT transaction_id, transaction_date, amount, transaction_type, description, category_id
             FROM Transactions WHERE transaction_id = :id;",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Delete a transaction from the database.
///
/// Deleting an `id` that is not present is a no-op, not an error: the caller
/// cannot distinguish it from a successful delete.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM Transactions WHERE transaction_id = ?1;",
        [id],
    )?;

    Ok(())
}

/// Retrieve the transactions dated within `date_range` (inclusive), each
/// joined with its category's name and type.
///
/// Results are ordered by date descending, then by ID descending so that
/// same-day entries list the newest insertion first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_transactions_in_range(
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<TransactionWithCategory>, Error> {
    connection
        .prepare(
            "SELECT T.transaction_id, T.transaction_date, T.amount, T.transaction_type,
                    T.description, T.category_id, C.category_name, C.type
             FROM Transactions T
             INNER JOIN Categories C ON T.category_id = C.category_id
             WHERE T.transaction_date BETWEEN :start AND :end
             ORDER BY T.transaction_date DESC, T.transaction_id DESC;",
        )?
        .query_map(
            &[(":start", date_range.start()), (":end", date_range.end())],
            |row| {
                let transaction = map_transaction_row(row)?;
                let raw_name: String = row.get(6)?;
                let raw_type: String = row.get(7)?;
                let category_type = raw_type.parse().map_err(|error| {
                    rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(error))
                })?;

                Ok(TransactionWithCategory {
                    transaction,
                    category_name: CategoryName::new_unchecked(&raw_name),
                    category_type,
                })
            },
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Sum the amounts of the transactions with `entry_type` dated within
/// `date_range` (inclusive).
///
/// The sum is computed as a [Decimal], never as native floating point.
/// Returns [Decimal::ZERO] when no transactions match.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn total_for_range(
    entry_type: EntryType,
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let amounts: Vec<Decimal> = connection
        .prepare(
            "SELECT amount FROM Transactions
             WHERE transaction_type = ?1
               AND transaction_date BETWEEN ?2 AND ?3;",
        )?
        .query_map(
            (entry_type.as_str(), date_range.start(), date_range.end()),
            |row| {
                let raw_amount: String = row.get(0)?;
                parse_stored_amount(&raw_amount, 0)
            },
        )?
        .collect::<Result<_, _>>()?;

    Ok(amounts.iter().sum())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn count_transactions(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(transaction_id) FROM Transactions;", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the Transactions table in the database.
///
/// Creating the table when it already exists is a no-op.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transactions_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS Transactions (
            transaction_id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_date TEXT NOT NULL,
            amount TEXT NOT NULL,
            transaction_type TEXT NOT NULL CHECK (transaction_type IN ('Expense', 'Income')),
            description TEXT,
            category_id INTEGER NOT NULL,
            FOREIGN KEY (category_id) REFERENCES Categories(category_id) ON DELETE RESTRICT
        )",
        (),
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let date = row.get(1)?;
    let raw_amount: String = row.get(2)?;
    let amount = parse_stored_amount(&raw_amount, 2)?;
    let raw_type: String = row.get(3)?;
    let entry_type = raw_type
        .parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;
    let description = row.get(4)?;
    let category_id = row.get(5)?;

    Ok(Transaction {
        id,
        date,
        amount,
        entry_type,
        description,
        category_id,
    })
}

fn parse_stored_amount(raw: &str, column: usize) -> Result<Decimal, rusqlite::Error> {
    raw.parse().map_err(|error: rust_decimal::Error| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
    })
}




#[cfg(test)]
mod transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        category::{CategoryId, CategoryName, create_categories_table, create_category},
        entry_type::EntryType,
    };

    use super::{
        NewTransaction, TransactionForm, TransactionState, count_transactions, create_transaction,
        create_transaction_endpoint, create_transactions_table, delete_transaction_endpoint,
    };

    fn get_transaction_state() -> (TransactionState, CategoryId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .unwrap();
        create_categories_table(&connection).expect("Could not create Categories table");
        create_transactions_table(&connection).expect("Could not create Transactions table");

        let category = create_category(
            CategoryName::new_unchecked("Food"),
            EntryType::Expense,
            &connection,
        )
        .expect("Could not create test category");

        (
            TransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            category.id,
        )
    }

    #[track_caller]
    fn get_location(response: &Response) -> String {
        response
            .headers()
            .get("location")
            .expect("location header missing")
            .to_str()
            .expect("Could not convert to str")
            .to_string()
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, category_id) = get_transaction_state();
        let form = TransactionForm {
            transaction_date: OffsetDateTime::now_utc().date(),
            amount: "50.75".to_string(),
            transaction_type: "Expense".to_string(),
            category_id,
            description: "Groceries".to_string(),
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = get_location(&response);
        assert!(location.starts_with("/?"), "got {location}");
        assert!(location.contains("kind=success"), "got {location}");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(1));
    }

    #[tokio::test]
    async fn create_transaction_rejects_invalid_amount() {
        let (state, category_id) = get_transaction_state();
        let form = TransactionForm {
            transaction_date: date!(2025 - 06 - 15),
            amount: "not a number".to_string(),
            transaction_type: "Expense".to_string(),
            category_id,
            description: String::new(),
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = get_location(&response);
        assert!(location.contains("kind=error"), "got {location}");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn create_transaction_rejects_invalid_type() {
        let (state, category_id) = get_transaction_state();
        let form = TransactionForm {
            transaction_date: date!(2025 - 06 - 15),
            amount: "10.00".to_string(),
            transaction_type: "Transfer".to_string(),
            category_id,
            description: String::new(),
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        let location = get_location(&response);
        assert!(location.contains("kind=error"), "got {location}");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn delete_transaction_endpoint_succeeds() {
        let (state, category_id) = get_transaction_state();
        let transaction = create_transaction(
            NewTransaction {
                date: date!(2025 - 06 - 15),
                amount: "10.00".parse().unwrap(),
                entry_type: EntryType::Expense,
                description: None,
                category_id,
            },
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test transaction");

        let response = delete_transaction_endpoint(Path(transaction.id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(get_location(&response).contains("kind=success"));

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn delete_missing_transaction_still_reports_success() {
        let (state, _) = get_transaction_state();

        let response = delete_transaction_endpoint(Path(999999), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(get_location(&response).contains("kind=success"));
    }
}
