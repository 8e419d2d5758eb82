use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use familib_catalog::{Book, BookStore};
use familib_core::{BookId, MemberId, StoreError};
use familib_directory::{Member, MemberStore};

use crate::loan::{CreateLoan, Loan};
use crate::store::LoanStore;

/// Failure of a ledger operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("book not found")]
    BookNotFound,

    #[error("member not found")]
    MemberNotFound,

    /// The book is already lent out (or another caller won the race for it).
    #[error("book is not available")]
    BookUnavailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a return operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// The open loan was closed and the book is available again.
    Returned,
    /// No open loan matched; nothing was written. Returning twice is a no-op.
    AlreadyReturned,
}

/// An open loan enriched with its book and borrower records.
#[derive(Debug, Clone)]
pub struct OpenLoan {
    pub loan: Loan,
    pub book: Book,
    pub borrower: Member,
}

/// The lending ledger.
///
/// Maintains the invariant "a book is available iff it has no open loan"
/// over stores that give us per-row atomic updates and nothing stronger.
/// Dates are passed in by the caller; the ledger never reads ambient state.
pub struct LendingLedger {
    books: Arc<dyn BookStore>,
    members: Arc<dyn MemberStore>,
    loans: Arc<dyn LoanStore>,
}

impl LendingLedger {
    pub fn new(
        books: Arc<dyn BookStore>,
        members: Arc<dyn MemberStore>,
        loans: Arc<dyn LoanStore>,
    ) -> Self {
        Self {
            books,
            members,
            loans,
        }
    }

    /// Lend a book to a member.
    ///
    /// The availability flag is claimed first via the store's conditional
    /// update: of any number of concurrent callers, at most one flips it,
    /// so at most one open loan is ever created per book. Losers get
    /// [`LedgerError::BookUnavailable`] before any loan row exists.
    ///
    /// If the loan insert then fails, the flip is compensated (the flag goes
    /// back to available) before the store error surfaces — loans are never
    /// deleted, so compensation works on the flag side only.
    pub async fn create_loan(
        &self,
        book_id: BookId,
        borrower_id: MemberId,
        today: NaiveDate,
    ) -> Result<Loan, LedgerError> {
        let borrower_is_active = self
            .members
            .find(borrower_id)
            .await?
            .is_some_and(|m| m.is_active);
        if !borrower_is_active {
            return Err(LedgerError::MemberNotFound);
        }

        if !self.books.mark_unavailable(book_id).await? {
            // The flip matched no row: either the book is gone/inactive, or
            // it is already lent out. Look once more to tell the two apart.
            return match self.books.find(book_id).await? {
                Some(book) if book.is_active => Err(LedgerError::BookUnavailable),
                _ => Err(LedgerError::BookNotFound),
            };
        }

        let loan = CreateLoan {
            book_id,
            borrower_id,
            loan_date: today,
        };
        if let Err(err) = self.loans.create(loan).await {
            if let Err(undo_err) = self.books.mark_available(book_id).await {
                tracing::error!(
                    %book_id,
                    error = %undo_err,
                    "failed to restore availability after loan insert failure; \
                     book is flagged unavailable with no open loan"
                );
            }
            return Err(err.into());
        }

        tracing::info!(%book_id, %borrower_id, %today, "loan created");

        Ok(Loan {
            book_id,
            borrower_id,
            loan_date: today,
            returned_date: None,
        })
    }

    /// Return a lent book.
    ///
    /// The close is filtered on `returned_date IS NULL`, so it matches at
    /// most the open loan. When nothing matches the call is an idempotent
    /// no-op: no error, and the availability flag is left untouched.
    pub async fn return_loan(
        &self,
        book_id: BookId,
        borrower_id: MemberId,
        today: NaiveDate,
    ) -> Result<ReturnOutcome, LedgerError> {
        let closed = self.loans.close(book_id, borrower_id, today).await?;
        if closed == 0 {
            return Ok(ReturnOutcome::AlreadyReturned);
        }

        self.books.mark_available(book_id).await?;

        tracing::info!(%book_id, %borrower_id, %today, "loan returned");

        Ok(ReturnOutcome::Returned)
    }

    /// All open loans, most recent first, each enriched with its book and
    /// borrower. Borrowers resolve even after soft-deletion.
    pub async fn list_open_loans(&self) -> Result<Vec<OpenLoan>, LedgerError> {
        let loans = self.loans.list_open().await?;

        let mut enriched = Vec::with_capacity(loans.len());
        for loan in loans {
            let book = self
                .books
                .find(loan.book_id)
                .await?
                .ok_or(LedgerError::BookNotFound)?;
            let borrower = self
                .members
                .find(loan.borrower_id)
                .await?
                .ok_or(LedgerError::MemberNotFound)?;
            enriched.push(OpenLoan {
                loan,
                book,
                borrower,
            });
        }
        Ok(enriched)
    }

    /// Active, available books ordered by title — the lendable set.
    pub async fn list_available_books(&self) -> Result<Vec<Book>, LedgerError> {
        Ok(self.books.list_available().await?)
    }

    /// Active members ordered by name — the borrower selection set.
    pub async fn list_active_members(&self) -> Result<Vec<Member>, LedgerError> {
        Ok(self.members.list_active().await?)
    }
}
