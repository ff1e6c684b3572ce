//! This file defines the `Category` type, the types needed to create a
//! category and the routes for listing and creating categories.
//!
//! A category is a named grouping of transactions with a fixed direction
//! (expense or income). Categories are immutable once created: the app
//! exposes no update or delete operation for them.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::{NoticeKind, NoticeParams, redirect_with_notice},
    endpoints,
    entry_type::EntryType,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_INPUT_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, PAGE_CONTAINER_STYLE, TABLE_STYLE, base,
    },
    navigation::NavBar,
};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// empty after trimming.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if the non-empty invariant is violated it will cause incorrect
    /// behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alias for the integer type used for category IDs.
pub type CategoryId = i64;

/// A named grouping of transactions, e.g., 'Food', 'Rent', 'Salary'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,

    /// The name of the category. Unique across all categories.
    pub name: CategoryName,

    /// Whether transactions in this category are expenses or income.
    pub entry_type: EntryType,
}

fn add_category_form_view() -> Markup {
    html! {
        form
            action=(endpoints::ADD_CATEGORY)
            method="post"
            class="form"
        {
            div
            {
                label for="category_name" class=(FORM_LABEL_STYLE) { "Category Name" }

                input
                    id="category_name"
                    type="text"
                    name="category_name"
                    placeholder="Category Name"
                    required
                    autofocus
                    class=(FORM_INPUT_STYLE);
            }

            div
            {
                label for="category_type" class=(FORM_LABEL_STYLE) { "Type" }

                select id="category_type" name="category_type" required class=(FORM_SELECT_STYLE)
                {
                    option value="Expense" { "Expense" }
                    option value="Income" { "Income" }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Category" }
        }
    }
}

fn category_list_view(categories: &[Category]) -> Markup {
    html! {
        @if categories.is_empty() {
            p { "No categories yet." }
        } @else {
            table class=(TABLE_STYLE)
            {
                thead
                {
                    tr
                    {
                        th { "Name" }
                        th { "Type" }
                    }
                }

                tbody
                {
                    @for category in categories {
                        tr
                        {
                            td { (category.name) }
                            td { (category.entry_type) }
                        }
                    }
                }
            }
        }
    }
}

fn add_category_view(categories: &[Category], alert: Option<Markup>) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADD_CATEGORY).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            @if let Some(alert) = alert { (alert) }

            h1 { "Categories" }

            div class=(FORM_CONTAINER_STYLE) { (add_category_form_view()) }

            (category_list_view(categories))
        }
    };

    base("Categories", &content)
}

/// The state needed for the category page and for creating a category.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection shared with the rest of the app.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    /// The name of the new category.
    pub category_name: String,
    /// "Expense" or "Income".
    pub category_type: String,
}

/// Route handler for the page listing all categories.
pub async fn get_add_category_page(
    State(state): State<CategoryState>,
    Query(notice): Query<NoticeParams>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_categories(&connection) {
        Ok(categories) => add_category_view(&categories, notice.into_alert()).into_response(),
        Err(error) => {
            tracing::error!("failed to retrieve categories: {error}");
            error.into_response()
        }
    }
}

/// A route handler for creating a new category.
///
/// Always redirects back to the category page. Validation failures and
/// duplicate names are reported through the redirect notice without writing
/// anything.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form_data.category_name) {
        Ok(name) => name,
        Err(_) => {
            return redirect_with_notice(
                endpoints::ADD_CATEGORY,
                NoticeKind::Error,
                "Category name cannot be empty!",
            )
            .into_response();
        }
    };

    let entry_type = match form_data.category_type.parse::<EntryType>() {
        Ok(entry_type) => entry_type,
        Err(error) => {
            return redirect_with_notice(endpoints::ADD_CATEGORY, NoticeKind::Error, &error.to_string())
                .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_category(name, entry_type, &connection) {
        Ok(category) => redirect_with_notice(
            endpoints::ADD_CATEGORY,
            NoticeKind::Success,
            &format!("Category \"{}\" added successfully!", category.name),
        )
        .into_response(),
        Err(Error::DuplicateCategoryName(name)) => redirect_with_notice(
            endpoints::ADD_CATEGORY,
            NoticeKind::Error,
            &format!("Category \"{name}\" already exists!"),
        )
        .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_response()
        }
    }
}

/// Create a category in the database.
///
/// # Errors
/// This function will return an [Error::DuplicateCategoryName] if a category
/// with the same name already exists, or an error if there is an SQL error.
pub fn create_category(
    name: CategoryName,
    entry_type: EntryType,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO Categories (category_name, type) VALUES (?1, ?2);",
            (name.as_ref(), entry_type.as_str()),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::DuplicateCategoryName(name.to_string())
            }
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        entry_type,
    })
}

/// Retrieve all categories, ordered by name.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT category_id, category_name, type FROM Categories ORDER BY category_name ASC;")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Create the Categories table in the database.
///
/// Creating the table when it already exists is a no-op.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_categories_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS Categories (
            category_id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_name VARCHAR(100) NOT NULL UNIQUE,
            type TEXT NOT NULL CHECK (type IN ('Expense', 'Income'))
        )",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_type: String = row.get(2)?;

    let entry_type = raw_type
        .parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        entry_type,
    })
}

#[cfg(test)]
mod category_name_tests {
    use crate::{Error, category::CategoryName};

    #[test]
    fn new_fails_on_empty_string() {
        let name = CategoryName::new("");

        assert_eq!(name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let name = CategoryName::new("\n\t \r");

        assert_eq!(name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_surrounding_whitespace() {
        let name = CategoryName::new("  Food  ").unwrap();

        assert_eq!(name.as_ref(), "Food");
    }

    #[test]
    fn new_succeeds_on_non_empty_string() {
        let name = CategoryName::new("Groceries");

        assert!(name.is_ok())
    }
}


#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use rusqlite::Connection;

    use crate::entry_type::EntryType;

    use super::{
        CategoryFormData, CategoryName, CategoryState, create_categories_table, create_category,
        create_category_endpoint, get_all_categories,
    };

    fn get_category_state() -> CategoryState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_categories_table(&connection).expect("Could not create Categories table");

        CategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
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
    async fn can_create_category() {
        let state = get_category_state();
        let form = CategoryFormData {
            category_name: "Food".to_string(),
            category_type: "Expense".to_string(),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = get_location(&response);
        assert!(location.starts_with("/add_category?"), "got {location}");
        assert!(location.contains("kind=success"), "got {location}");

        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(&connection).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Food");
        assert_eq!(categories[0].entry_type, EntryType::Expense);
    }

    #[tokio::test]
    async fn create_category_trims_name() {
        let state = get_category_state();
        let form = CategoryFormData {
            category_name: "  Rent  ".to_string(),
            category_type: "Expense".to_string(),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(&connection).unwrap();
        assert_eq!(categories[0].name.as_ref(), "Rent");
    }

    #[tokio::test]
    async fn create_category_fails_on_empty_name() {
        let state = get_category_state();
        let form = CategoryFormData {
            category_name: "   ".to_string(),
            category_type: "Expense".to_string(),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = get_location(&response);
        assert!(location.contains("kind=error"), "got {location}");
        assert!(location.contains("empty"), "got {location}");

        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(&connection).unwrap();
        assert!(categories.is_empty(), "no category should have been written");
    }

    #[tokio::test]
    async fn create_category_fails_on_duplicate_name() {
        let state = get_category_state();
        create_category(
            CategoryName::new_unchecked("Food"),
            EntryType::Expense,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test category");

        let form = CategoryFormData {
            category_name: "Food".to_string(),
            category_type: "Expense".to_string(),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = get_location(&response);
        assert!(location.contains("kind=error"), "got {location}");
        assert!(location.contains("already+exists"), "got {location}");

        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(&connection).unwrap();
        assert_eq!(categories.len(), 1, "duplicate should not have been written");
    }
}
