use axum::{Router, routing::get};

pub mod books;
pub mod loans;
pub mod members;
pub mod system;

/// Router for all session-authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/books", books::router())
        .nest("/members", members::router())
        .nest("/loans", loans::router())
}
