//! The shared page layout and the helpers used across views.

use maud::{DOCTYPE, Markup, html};
use rust_decimal::Decimal;

// The class names below are defined in static/main.css.

/// Style for form labels.
pub const FORM_LABEL_STYLE: &str = "form-label";
/// Style for text, number, and date inputs.
pub const FORM_INPUT_STYLE: &str = "form-input";
/// Style for select drop-downs.
pub const FORM_SELECT_STYLE: &str = "form-input";
/// Style for the primary form submit button.
pub const BUTTON_PRIMARY_STYLE: &str = "button-primary";
/// Style for inline delete buttons in table rows.
pub const BUTTON_DELETE_STYLE: &str = "button-delete";
/// Style for the container wrapping a form.
pub const FORM_CONTAINER_STYLE: &str = "form-container";
/// Style for the container wrapping page content.
pub const PAGE_CONTAINER_STYLE: &str = "page-container";
/// Style for data tables.
pub const TABLE_STYLE: &str = "data-table";

/// The shared HTML document skeleton.
///
/// `content` is rendered inside the page body, below the alert banner area.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Pennybook" }
                link href="/static/main.css" rel="stylesheet";
            }

            body
            {
                (content)
            }
        }
    }
}

/// A full-page error view shared by the 404 and 500 pages.
pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    let content = html!(
        section class="error-page"
        {
            h1 { (header) }

            p class="error-description" { (description) }

            p class="error-fix" { (fix) }

            a href="/" { "Back to Homepage" }
        }
    );

    base(title, &content)
}

/// Format a monetary amount as a dollar string with two decimal places,
/// e.g. `$1200.00` or `-$50.75`.
pub fn format_currency(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}
