use async_trait::async_trait;
use chrono::NaiveDate;

use familib_core::{BookId, MemberId, StoreResult};

use crate::loan::{CreateLoan, Loan};

/// Table interface for the `loans` store.
///
/// Loans are insert-and-update only; no delete is ever issued, so closed
/// loans accumulate as the full lending history.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Insert a new open loan.
    async fn create(&self, loan: CreateLoan) -> StoreResult<()>;

    /// Set `returned_date` on the open loan matching `(book_id,
    /// borrower_id)`. The filter includes `returned_date IS NULL`, so a
    /// second call for the same pair matches nothing. Returns the number of
    /// rows closed.
    async fn close(
        &self,
        book_id: BookId,
        borrower_id: MemberId,
        returned_on: NaiveDate,
    ) -> StoreResult<u64>;

    /// All open loans, ordered by loan date descending (most recent first).
    async fn list_open(&self) -> StoreResult<Vec<Loan>>;

    /// Full lending history of a book, open and closed, most recent first.
    async fn history_for_book(&self, book_id: BookId) -> StoreResult<Vec<Loan>>;

    /// Number of open loans borrowed by the given member.
    async fn count_open_by_borrower(&self, borrower_id: MemberId) -> StoreResult<u64>;
}
