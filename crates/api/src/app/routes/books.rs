use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use familib_core::BookId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(add_book).get(list_books))
        .route("/:id", delete(remove_book))
        .route("/:id/history", get(book_history))
}

pub async fn add_book(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddBookRequest>,
) -> axum::response::Response {
    match services
        .add_book(body.title, body.author, body.cover_url, body.owner_name)
        .await
    {
        Ok(book) => (StatusCode::CREATED, Json(dto::book_to_json(&book))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_books(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_books().await {
        Ok(books) => {
            let items = books.iter().map(dto::book_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_book(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BookId = match errors::parse_id(&id, "book id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.remove_book(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": id.to_string(), "is_active": false })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn book_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BookId = match errors::parse_id(&id, "book id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.book_history(id).await {
        Ok(loans) => {
            let items = loans.iter().map(dto::loan_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
