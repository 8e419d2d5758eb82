use std::sync::Arc;

use thiserror::Error;

use familib_catalog::{Book, BookStore, NewBook};
use familib_core::{BookId, DomainError, MemberId, StoreError};
use familib_directory::{Member, MemberStore, NewMember};
use familib_infra::in_memory::{InMemoryBookStore, InMemoryLoanStore, InMemoryMemberStore};
use familib_infra::postgres::{PgBookStore, PgLoanStore, PgMemberStore};
use familib_lending::{LendingLedger, Loan, LoanStore};
use sqlx::PgPool;

/// Failure of a catalog/directory operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An active member together with its catalog/lending statistics.
#[derive(Debug, Clone)]
pub struct MemberWithStats {
    pub member: Member,
    pub book_count: u64,
    pub active_loans: u64,
}

/// Store handles plus the lending ledger — everything the handlers call.
///
/// Catalog and directory operations are thin pass-throughs; the only real
/// invariants live in [`LendingLedger`].
pub struct AppServices {
    books: Arc<dyn BookStore>,
    members: Arc<dyn MemberStore>,
    loans: Arc<dyn LoanStore>,
    ledger: LendingLedger,
}

/// Build services from the environment: in-memory stores by default,
/// Postgres when `USE_PERSISTENT_STORES=true`.
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        return build_postgres_services().await;
    }
    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    AppServices::new(
        Arc::new(InMemoryBookStore::new()),
        Arc::new(InMemoryMemberStore::new()),
        Arc::new(InMemoryLoanStore::new()),
    )
}

async fn build_postgres_services() -> AppServices {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");

    AppServices::new(
        Arc::new(PgBookStore::new(pool.clone())),
        Arc::new(PgMemberStore::new(pool.clone())),
        Arc::new(PgLoanStore::new(pool)),
    )
}

impl AppServices {
    pub fn new(
        books: Arc<dyn BookStore>,
        members: Arc<dyn MemberStore>,
        loans: Arc<dyn LoanStore>,
    ) -> Self {
        let ledger = LendingLedger::new(books.clone(), members.clone(), loans.clone());
        Self {
            books,
            members,
            loans,
            ledger,
        }
    }

    pub fn ledger(&self) -> &LendingLedger {
        &self.ledger
    }

    /// Catalog a book. The owner is resolved by name, creating the member
    /// on first sight (single conditional store call, no find-then-create).
    pub async fn add_book(
        &self,
        title: String,
        author: Option<String>,
        cover_url: Option<String>,
        owner_name: String,
    ) -> Result<Book, ServiceError> {
        let owner = NewMember::new(owner_name)
            .map_err(|_| DomainError::validation("owner name cannot be empty"))?;
        let owner_id = self.members.upsert_by_name(owner).await?;

        let new_book = NewBook::new(title, author, cover_url, owner_id)?;
        let id = self.books.insert(new_book.clone()).await?;

        Ok(Book {
            id,
            title: new_book.title,
            author: new_book.author,
            cover_url: new_book.cover_url,
            owner_id,
            is_available: true,
            is_active: true,
        })
    }

    /// The catalog grid: every active book, lent or not, by title.
    pub async fn list_books(&self) -> Result<Vec<Book>, ServiceError> {
        Ok(self.books.list_active().await?)
    }

    /// Soft-delete a book; its loan history stays intact.
    pub async fn remove_book(&self, id: BookId) -> Result<(), ServiceError> {
        if !self.books.deactivate(id).await? {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    /// Full lending history of one book, open and closed.
    pub async fn book_history(&self, id: BookId) -> Result<Vec<Loan>, ServiceError> {
        if self.books.find(id).await?.is_none() {
            return Err(DomainError::not_found().into());
        }
        Ok(self.loans.history_for_book(id).await?)
    }

    pub async fn add_member(&self, name: String) -> Result<Member, ServiceError> {
        let new_member = NewMember::new(name)?;
        let id = self.members.insert(new_member.clone()).await?;
        Ok(Member {
            id,
            name: new_member.name,
            is_active: true,
        })
    }

    pub async fn rename_member(&self, id: MemberId, name: String) -> Result<(), ServiceError> {
        let new_name = NewMember::new(name)?;
        if !self.members.rename(id, new_name).await? {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    /// Soft-delete a member; existing loans keep resolving their name.
    pub async fn remove_member(&self, id: MemberId) -> Result<(), ServiceError> {
        if !self.members.deactivate(id).await? {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    /// Active members by name, each with owned-book and open-loan counts.
    pub async fn list_members_with_stats(&self) -> Result<Vec<MemberWithStats>, ServiceError> {
        let members = self.members.list_active().await?;

        let mut out = Vec::with_capacity(members.len());
        for member in members {
            let book_count = self.books.count_owned_by(member.id).await?;
            let active_loans = self.loans.count_open_by_borrower(member.id).await?;
            out.push(MemberWithStats {
                member,
                book_count,
                active_loans,
            });
        }
        Ok(out)
    }
}
