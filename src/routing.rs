//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    category::{create_category_endpoint, get_add_category_page},
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{create_transaction_endpoint, delete_transaction_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_dashboard_page))
        .route(endpoints::ADD_TRANSACTION, post(create_transaction_endpoint))
        .route(
            endpoints::DELETE_TRANSACTION,
            post(delete_transaction_endpoint),
        )
        .route(
            endpoints::ADD_CATEGORY,
            get(get_add_category_page).post(create_category_endpoint),
        )
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .nest_service(endpoints::STATIC, ServeDir::new("static"))
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod route_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::AppState;

    use super::build_router;

    fn new_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection).expect("Could not create app state");

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn root_serves_the_summary_page() {
        let server = new_test_server();

        let response = server.get("/").await;

        response.assert_status_ok();
        assert!(response.text().contains("Net Balance"));
    }

    #[tokio::test]
    async fn category_page_is_routed() {
        let server = new_test_server();

        let response = server.get("/add_category").await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_renders_the_404_page() {
        let server = new_test_server();

        let response = server.get("/no_such_page").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.text().contains("404"));
    }

    #[tokio::test]
    async fn error_page_is_routed() {
        let server = new_test_server();

        let response = server.get("/error").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}
