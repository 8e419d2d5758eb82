use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use familib_core::{BookId, MemberId};
use familib_lending::ReturnOutcome;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_loan).get(list_open_loans))
        .route("/return", post(return_loan))
        .route("/available-books", get(available_books))
}

pub async fn create_loan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoanActionRequest>,
) -> axum::response::Response {
    let book_id: BookId = match errors::parse_id(&body.book_id, "book id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let borrower_id: MemberId = match errors::parse_id(&body.borrower_id, "borrower id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let today = Utc::now().date_naive();
    match services.ledger().create_loan(book_id, borrower_id, today).await {
        Ok(loan) => (StatusCode::CREATED, Json(dto::loan_to_json(&loan))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn return_loan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoanActionRequest>,
) -> axum::response::Response {
    let book_id: BookId = match errors::parse_id(&body.book_id, "book id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let borrower_id: MemberId = match errors::parse_id(&body.borrower_id, "borrower id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let today = Utc::now().date_naive();
    match services.ledger().return_loan(book_id, borrower_id, today).await {
        Ok(outcome) => {
            let outcome = match outcome {
                ReturnOutcome::Returned => "returned",
                ReturnOutcome::AlreadyReturned => "already_returned",
            };
            (
                StatusCode::OK,
                Json(serde_json::json!({ "outcome": outcome })),
            )
                .into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_open_loans(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger().list_open_loans().await {
        Ok(loans) => {
            let items = loans.iter().map(dto::open_loan_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn available_books(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger().list_available_books().await {
        Ok(books) => {
            let items = books.iter().map(dto::book_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}
