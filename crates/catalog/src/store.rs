use async_trait::async_trait;

use familib_core::{BookId, MemberId, StoreResult};

use crate::book::{Book, NewBook};

/// Table interface for the `books` store.
///
/// Implementations offer per-row atomic updates only; there is no
/// multi-statement transaction across calls. The availability flips are the
/// single mutation the lending ledger performs on this table.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book (available, active) and return its id.
    async fn insert(&self, book: NewBook) -> StoreResult<BookId>;

    /// Fetch one book by id, active or not.
    async fn find(&self, id: BookId) -> StoreResult<Option<Book>>;

    /// All active books, ordered by title.
    async fn list_active(&self) -> StoreResult<Vec<Book>>;

    /// Active books currently available for lending, ordered by title.
    async fn list_available(&self) -> StoreResult<Vec<Book>>;

    /// Conditionally flip `is_available` to `false`.
    ///
    /// Succeeds only if the book is active and currently available; returns
    /// whether a row actually flipped. Concurrent callers race on this single
    /// atomic update, so at most one of them observes `true`.
    async fn mark_unavailable(&self, id: BookId) -> StoreResult<bool>;

    /// Flip `is_available` back to `true`; returns whether a row matched.
    async fn mark_available(&self, id: BookId) -> StoreResult<bool>;

    /// Soft-delete: flip `is_active` to `false`; returns whether a row
    /// matched. Rows are never removed.
    async fn deactivate(&self, id: BookId) -> StoreResult<bool>;

    /// Number of active books owned by the given member.
    async fn count_owned_by(&self, owner_id: MemberId) -> StoreResult<u64>;
}
