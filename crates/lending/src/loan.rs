use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use familib_core::{BookId, MemberId};

/// A loan fact: a member borrowed a book on a date.
///
/// Identity is the composite `(book_id, borrower_id, loan_date)`; there is
/// no surrogate key. A loan with no return date is open — the book is out.
/// Closed loans are retained forever as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub book_id: BookId,
    pub borrower_id: MemberId,
    pub loan_date: NaiveDate,
    pub returned_date: Option<NaiveDate>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_date.is_none()
    }
}

/// Input for recording a new (open) loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLoan {
    pub book_id: BookId,
    pub borrower_id: MemberId,
    pub loan_date: NaiveDate,
}
