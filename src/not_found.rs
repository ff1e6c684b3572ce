//! Defines the route handler for the 404 page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Render the 404 page for unknown routes.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub(crate) fn get_404_not_found_response() -> Response {
    let body = error_view(
        "Not Found",
        "404",
        "Sorry, this page does not exist.",
        "Check the address for typos or head back home.",
    );

    (StatusCode::NOT_FOUND, body).into_response()
}
