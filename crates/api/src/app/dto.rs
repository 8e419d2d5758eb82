use serde::Deserialize;
use serde_json::{Value, json};

use familib_catalog::Book;
use familib_directory::Member;
use familib_lending::{Loan, OpenLoan};

use crate::app::services::MemberWithStats;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    /// Owner display name; the member is created on first sight.
    pub owner_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameMemberRequest {
    pub name: String,
}

/// Body for both lend and return: a loan is addressed by its pair.
#[derive(Debug, Deserialize)]
pub struct LoanActionRequest {
    pub book_id: String,
    pub borrower_id: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn book_to_json(book: &Book) -> Value {
    json!({
        "id": book.id.to_string(),
        "title": book.title,
        "author": book.author,
        "cover_url": book.cover_url,
        "owner_id": book.owner_id.to_string(),
        "is_available": book.is_available,
        "is_active": book.is_active,
    })
}

pub fn member_to_json(member: &Member) -> Value {
    json!({
        "id": member.id.to_string(),
        "name": member.name,
        "is_active": member.is_active,
    })
}

pub fn member_with_stats_to_json(entry: &MemberWithStats) -> Value {
    json!({
        "id": entry.member.id.to_string(),
        "name": entry.member.name,
        "is_active": entry.member.is_active,
        "book_count": entry.book_count,
        "active_loans": entry.active_loans,
    })
}

pub fn loan_to_json(loan: &Loan) -> Value {
    json!({
        "book_id": loan.book_id.to_string(),
        "borrower_id": loan.borrower_id.to_string(),
        "loan_date": loan.loan_date.to_string(),
        "returned_date": loan.returned_date.map(|d| d.to_string()),
    })
}

pub fn open_loan_to_json(entry: &OpenLoan) -> Value {
    json!({
        "book_id": entry.loan.book_id.to_string(),
        "borrower_id": entry.loan.borrower_id.to_string(),
        "loan_date": entry.loan.loan_date.to_string(),
        "book": book_to_json(&entry.book),
        "borrower": member_to_json(&entry.borrower),
    })
}
