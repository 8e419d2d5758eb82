//! In-memory table stores for dev and tests.
//!
//! Each store keeps its rows under one lock; every trait method takes the
//! lock once, so each call is atomic exactly like a single-row store call.
//! The loans store mirrors the schema's partial unique index (one open loan
//! per book) so both backends fail the same way.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use familib_catalog::{Book, BookStore, NewBook};
use familib_core::{BookId, MemberId, StoreError, StoreResult};
use familib_directory::{Member, MemberStore, NewMember};
use familib_lending::{CreateLoan, Loan, LoanStore};

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::backend(anyhow::anyhow!("store lock poisoned")))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::backend(anyhow::anyhow!("store lock poisoned")))
}

/// In-memory `books` table.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    rows: RwLock<HashMap<BookId, Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, book: NewBook) -> StoreResult<BookId> {
        let id = BookId::new();
        let mut rows = write(&self.rows)?;
        rows.insert(
            id,
            Book {
                id,
                title: book.title,
                author: book.author,
                cover_url: book.cover_url,
                owner_id: book.owner_id,
                is_available: true,
                is_active: true,
            },
        );
        Ok(id)
    }

    async fn find(&self, id: BookId) -> StoreResult<Option<Book>> {
        Ok(read(&self.rows)?.get(&id).cloned())
    }

    async fn list_active(&self) -> StoreResult<Vec<Book>> {
        let rows = read(&self.rows)?;
        let mut books: Vec<Book> = rows.values().filter(|b| b.is_active).cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn list_available(&self) -> StoreResult<Vec<Book>> {
        let rows = read(&self.rows)?;
        let mut books: Vec<Book> = rows.values().filter(|b| b.is_lendable()).cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn mark_unavailable(&self, id: BookId) -> StoreResult<bool> {
        let mut rows = write(&self.rows)?;
        match rows.get_mut(&id) {
            Some(book) if book.is_active && book.is_available => {
                book.is_available = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_available(&self, id: BookId) -> StoreResult<bool> {
        let mut rows = write(&self.rows)?;
        match rows.get_mut(&id) {
            Some(book) => {
                book.is_available = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate(&self, id: BookId) -> StoreResult<bool> {
        let mut rows = write(&self.rows)?;
        match rows.get_mut(&id) {
            Some(book) => {
                book.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_owned_by(&self, owner_id: MemberId) -> StoreResult<u64> {
        let rows = read(&self.rows)?;
        Ok(rows
            .values()
            .filter(|b| b.is_active && b.owner_id == owner_id)
            .count() as u64)
    }
}

/// In-memory `members` table.
#[derive(Debug, Default)]
pub struct InMemoryMemberStore {
    rows: RwLock<HashMap<MemberId, Member>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn insert(&self, member: NewMember) -> StoreResult<MemberId> {
        let id = MemberId::new();
        let mut rows = write(&self.rows)?;
        rows.insert(
            id,
            Member {
                id,
                name: member.name,
                is_active: true,
            },
        );
        Ok(id)
    }

    async fn upsert_by_name(&self, member: NewMember) -> StoreResult<MemberId> {
        let mut rows = write(&self.rows)?;
        // Find-or-insert under one lock — the in-memory equivalent of the
        // schema's conditional insert against the unique active-name index.
        if let Some(existing) = rows
            .values()
            .find(|m| m.is_active && m.name.eq_ignore_ascii_case(&member.name))
        {
            return Ok(existing.id);
        }

        let id = MemberId::new();
        rows.insert(
            id,
            Member {
                id,
                name: member.name,
                is_active: true,
            },
        );
        Ok(id)
    }

    async fn find(&self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(read(&self.rows)?.get(&id).cloned())
    }

    async fn list_active(&self) -> StoreResult<Vec<Member>> {
        let rows = read(&self.rows)?;
        let mut members: Vec<Member> = rows.values().filter(|m| m.is_active).cloned().collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn rename(&self, id: MemberId, member: NewMember) -> StoreResult<bool> {
        let mut rows = write(&self.rows)?;
        match rows.get_mut(&id) {
            Some(row) => {
                row.name = member.name;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate(&self, id: MemberId) -> StoreResult<bool> {
        let mut rows = write(&self.rows)?;
        match rows.get_mut(&id) {
            Some(row) => {
                row.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory `loans` table.
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    rows: RwLock<Vec<Loan>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn create(&self, loan: CreateLoan) -> StoreResult<()> {
        let mut rows = write(&self.rows)?;
        if rows.iter().any(|l| l.book_id == loan.book_id && l.is_open()) {
            return Err(StoreError::backend(anyhow::anyhow!(
                "duplicate open loan for book {}",
                loan.book_id
            )));
        }
        rows.push(Loan {
            book_id: loan.book_id,
            borrower_id: loan.borrower_id,
            loan_date: loan.loan_date,
            returned_date: None,
        });
        Ok(())
    }

    async fn close(
        &self,
        book_id: BookId,
        borrower_id: MemberId,
        returned_on: NaiveDate,
    ) -> StoreResult<u64> {
        let mut rows = write(&self.rows)?;
        let mut closed = 0;
        for loan in rows
            .iter_mut()
            .filter(|l| l.book_id == book_id && l.borrower_id == borrower_id && l.is_open())
        {
            loan.returned_date = Some(returned_on);
            closed += 1;
        }
        Ok(closed)
    }

    async fn list_open(&self) -> StoreResult<Vec<Loan>> {
        let rows = read(&self.rows)?;
        let mut open: Vec<Loan> = rows.iter().filter(|l| l.is_open()).cloned().collect();
        open.sort_by(|a, b| b.loan_date.cmp(&a.loan_date));
        Ok(open)
    }

    async fn history_for_book(&self, book_id: BookId) -> StoreResult<Vec<Loan>> {
        let rows = read(&self.rows)?;
        let mut history: Vec<Loan> = rows.iter().filter(|l| l.book_id == book_id).cloned().collect();
        history.sort_by(|a, b| b.loan_date.cmp(&a.loan_date));
        Ok(history)
    }

    async fn count_open_by_borrower(&self, borrower_id: MemberId) -> StoreResult<u64> {
        let rows = read(&self.rows)?;
        Ok(rows
            .iter()
            .filter(|l| l.borrower_id == borrower_id && l.is_open())
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_by_name_reuses_active_member() {
        let store = InMemoryMemberStore::new();
        let first = store
            .upsert_by_name(NewMember::new("Ana").unwrap())
            .await
            .unwrap();
        let second = store
            .upsert_by_name(NewMember::new("ana").unwrap())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn upsert_by_name_ignores_deactivated_members() {
        let store = InMemoryMemberStore::new();
        let first = store
            .upsert_by_name(NewMember::new("Ana").unwrap())
            .await
            .unwrap();
        store.deactivate(first).await.unwrap();

        let second = store
            .upsert_by_name(NewMember::new("Ana").unwrap())
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn mark_unavailable_succeeds_once() {
        let books = InMemoryBookStore::new();
        let id = books
            .insert(NewBook::new("Dune", None, None, MemberId::new()).unwrap())
            .await
            .unwrap();

        assert!(books.mark_unavailable(id).await.unwrap());
        assert!(!books.mark_unavailable(id).await.unwrap());
    }

    #[tokio::test]
    async fn mark_unavailable_skips_deactivated_books() {
        let books = InMemoryBookStore::new();
        let id = books
            .insert(NewBook::new("Dune", None, None, MemberId::new()).unwrap())
            .await
            .unwrap();
        books.deactivate(id).await.unwrap();

        assert!(!books.mark_unavailable(id).await.unwrap());
    }

    #[tokio::test]
    async fn second_open_loan_for_book_is_rejected() {
        let loans = InMemoryLoanStore::new();
        let book_id = BookId::new();
        let loan_date = "2024-03-01".parse().unwrap();

        loans
            .create(CreateLoan {
                book_id,
                borrower_id: MemberId::new(),
                loan_date,
            })
            .await
            .unwrap();

        let err = loans
            .create(CreateLoan {
                book_id,
                borrower_id: MemberId::new(),
                loan_date,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
