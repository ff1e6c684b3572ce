//! This file defines the summary page, the home page of the app.
//!
//! The page shows the current month's income and expense totals, the net
//! balance, the form for recording a new transaction, and the list of the
//! month's transactions with inline delete buttons.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, macros::format_description};

use crate::{
    AppState, Error,
    alert::NoticeParams,
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    entry_type::EntryType,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_INPUT_STYLE,
        FORM_LABEL_STYLE, FORM_SELECT_STYLE, PAGE_CONTAINER_STYLE, TABLE_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    transaction::{TransactionWithCategory, get_transactions_in_range, month_of, total_for_range},
};

/// The totals shown at the top of the summary page.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MonthlySummary {
    income: Decimal,
    expenses: Decimal,
}

impl MonthlySummary {
    /// Income minus expenses. Negative when the month is in deficit.
    fn net_balance(&self) -> Decimal {
        self.income - self.expenses
    }
}

fn summary_view(summary: MonthlySummary) -> Markup {
    let net = summary.net_balance();
    let net_style = if net.is_sign_negative() && !net.is_zero() {
        "summary-card summary-net-negative"
    } else {
        "summary-card summary-net-positive"
    };

    html! {
        section class="summary-cards"
        {
            div class="summary-card"
            {
                h2 { "Income" }
                p #income-total class="summary-amount" { (format_currency(summary.income)) }
            }

            div class="summary-card"
            {
                h2 { "Expenses" }
                p #expense-total class="summary-amount" { (format_currency(summary.expenses)) }
            }

            div class=(net_style)
            {
                h2 { "Net Balance" }
                p #net-balance class="summary-amount" { (format_currency(net)) }
            }
        }
    }
}

fn add_transaction_form_view(today: Date, categories: &[Category]) -> Markup {
    let date_format = format_description!("[year]-[month]-[day]");
    let today_value = today.format(&date_format).unwrap_or_default();

    html! {
        form
            action=(endpoints::ADD_TRANSACTION)
            method="post"
            class="form"
        {
            div
            {
                label for="transaction_date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="transaction_date"
                    type="date"
                    name="transaction_date"
                    value=(today_value)
                    required
                    class=(FORM_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    placeholder="0.00"
                    step="0.01"
                    min="0"
                    required
                    class=(FORM_INPUT_STYLE);
            }

            div
            {
                label for="transaction_type" class=(FORM_LABEL_STYLE) { "Type" }

                select
                    id="transaction_type"
                    name="transaction_type"
                    required
                    class=(FORM_SELECT_STYLE)
                {
                    option value="Expense" { "Expense" }
                    option value="Income" { "Income" }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select id="category_id" name="category_id" required class=(FORM_SELECT_STYLE)
                {
                    @for category in categories {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="Description (optional)"
                    class=(FORM_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Transaction" }
        }
    }
}

fn transactions_table_view(transactions: &[TransactionWithCategory]) -> Markup {
    html! {
        @if transactions.is_empty() {
            p { "No transactions this month." }
        } @else {
            table class=(TABLE_STYLE)
            {
                thead
                {
                    tr
                    {
                        th { "Date" }
                        th { "Description" }
                        th { "Category" }
                        th { "Type" }
                        th { "Amount" }
                        th { "" }
                    }
                }

                tbody
                {
                    @for row in transactions {
                        tr
                        {
                            td { (row.transaction.date) }
                            td { (row.transaction.description.as_deref().unwrap_or("")) }
                            td { (row.category_name) }
                            td { (row.transaction.entry_type) }
                            td { (format_currency(row.transaction.amount)) }
                            td
                            {
                                form
                                    action=(format_endpoint(
                                        endpoints::DELETE_TRANSACTION,
                                        row.transaction.id,
                                    ))
                                    method="post"
                                {
                                    button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn dashboard_view(
    today: Date,
    summary: MonthlySummary,
    transactions: &[TransactionWithCategory],
    categories: &[Category],
    alert: Option<Markup>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            @if let Some(alert) = alert { (alert) }

            h1 { (today.month()) " " (today.year()) }

            (summary_view(summary))

            div class=(FORM_CONTAINER_STYLE)
            {
                h2 { "Add Transaction" }

                @if categories.is_empty() {
                    p { "Add a category before recording transactions." }
                }

                (add_transaction_form_view(today, categories))
            }

            (transactions_table_view(transactions))
        }
    };

    base("Summary", &content)
}

/// The state needed for rendering the summary page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection shared with the rest of the app.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for the summary page.
///
/// The month shown is always the current calendar month in UTC.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Query(notice): Query<NoticeParams>,
) -> Response {
    let today = OffsetDateTime::now_utc().date();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match render_dashboard(today, notice, &connection) {
        Ok(markup) => markup.into_response(),
        Err(error) => {
            tracing::error!("failed to render the summary page: {error}");
            error.into_response()
        }
    }
}

fn render_dashboard(
    today: Date,
    notice: NoticeParams,
    connection: &Connection,
) -> Result<Markup, Error> {
    let month = month_of(today);

    let categories = get_all_categories(connection)?;
    let transactions = get_transactions_in_range(month.clone(), connection)?;
    let summary = MonthlySummary {
        income: total_for_range(EntryType::Income, month.clone(), connection)?,
        expenses: total_for_range(EntryType::Expense, month, connection)?,
    };

    Ok(dashboard_view(
        today,
        summary,
        &transactions,
        &categories,
        notice.into_alert(),
    ))
}

#[cfg(test)]
mod monthly_summary_tests {
    use rust_decimal::Decimal;

    use super::MonthlySummary;

    #[test]
    fn net_balance_is_income_minus_expenses() {
        let summary = MonthlySummary {
            income: Decimal::new(120000, 2),
            expenses: Decimal::new(5075, 2),
        };

        assert_eq!(summary.net_balance(), Decimal::new(114925, 2));
    }

    #[test]
    fn net_balance_can_be_negative() {
        let summary = MonthlySummary {
            income: Decimal::new(1000, 2),
            expenses: Decimal::new(2500, 2),
        };

        assert_eq!(summary.net_balance(), Decimal::new(-1500, 2));
    }
}
