//! Postgres-backed table stores (sqlx).
//!
//! Every mutation is a single-row statement, so each trait call maps to one
//! atomic store call — the same contract the in-memory stores give the
//! ledger. Schema: `migrations/0001_schema.sql`. No statement ever deletes
//! a row.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use familib_catalog::{Book, BookStore, NewBook};
use familib_core::{BookId, MemberId, StoreError, StoreResult};
use familib_directory::{Member, MemberStore, NewMember};
use familib_lending::{CreateLoan, Loan, LoanStore};

fn book_from_row(row: &PgRow) -> StoreResult<Book> {
    Ok(Book {
        id: BookId::from_uuid(row.try_get::<Uuid, _>("id").map_err(StoreError::backend)?),
        title: row.try_get("title").map_err(StoreError::backend)?,
        author: row.try_get("author").map_err(StoreError::backend)?,
        cover_url: row.try_get("cover_url").map_err(StoreError::backend)?,
        owner_id: MemberId::from_uuid(
            row.try_get::<Uuid, _>("owner_id")
                .map_err(StoreError::backend)?,
        ),
        is_available: row.try_get("is_available").map_err(StoreError::backend)?,
        is_active: row.try_get("is_active").map_err(StoreError::backend)?,
    })
}

fn member_from_row(row: &PgRow) -> StoreResult<Member> {
    Ok(Member {
        id: MemberId::from_uuid(row.try_get::<Uuid, _>("id").map_err(StoreError::backend)?),
        name: row.try_get("name").map_err(StoreError::backend)?,
        is_active: row.try_get("is_active").map_err(StoreError::backend)?,
    })
}

fn loan_from_row(row: &PgRow) -> StoreResult<Loan> {
    Ok(Loan {
        book_id: BookId::from_uuid(
            row.try_get::<Uuid, _>("book_id")
                .map_err(StoreError::backend)?,
        ),
        borrower_id: MemberId::from_uuid(
            row.try_get::<Uuid, _>("borrower_id")
                .map_err(StoreError::backend)?,
        ),
        loan_date: row.try_get("loan_date").map_err(StoreError::backend)?,
        returned_date: row.try_get("returned_date").map_err(StoreError::backend)?,
    })
}

/// `books` table on Postgres.
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn insert(&self, book: NewBook) -> StoreResult<BookId> {
        let id = BookId::new();
        sqlx::query(
            "INSERT INTO books (id, title, author, cover_url, owner_id, is_available, is_active) \
             VALUES ($1, $2, $3, $4, $5, TRUE, TRUE)",
        )
        .bind(id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.cover_url)
        .bind(book.owner_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(id)
    }

    async fn find(&self, id: BookId) -> StoreResult<Option<Book>> {
        let row = sqlx::query(
            "SELECT id, title, author, cover_url, owner_id, is_available, is_active \
             FROM books WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.as_ref().map(book_from_row).transpose()
    }

    async fn list_active(&self) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(
            "SELECT id, title, author, cover_url, owner_id, is_available, is_active \
             FROM books WHERE is_active ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        rows.iter().map(book_from_row).collect()
    }

    async fn list_available(&self) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(
            "SELECT id, title, author, cover_url, owner_id, is_available, is_active \
             FROM books WHERE is_active AND is_available ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        rows.iter().map(book_from_row).collect()
    }

    async fn mark_unavailable(&self, id: BookId) -> StoreResult<bool> {
        // Conditional compare-and-set: the WHERE clause makes concurrent
        // callers race on one row flip, so at most one sees rows_affected=1.
        let result = sqlx::query(
            "UPDATE books SET is_available = FALSE \
             WHERE id = $1 AND is_active AND is_available",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_available(&self, id: BookId) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE books SET is_available = TRUE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() == 1)
    }

    async fn deactivate(&self, id: BookId) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE books SET is_active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_owned_by(&self, owner_id: MemberId) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM books WHERE owner_id = $1 AND is_active")
            .bind(owner_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        let n: i64 = row.try_get("n").map_err(StoreError::backend)?;
        Ok(n as u64)
    }
}

/// `members` table on Postgres.
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberStore for PgMemberStore {
    async fn insert(&self, member: NewMember) -> StoreResult<MemberId> {
        let id = MemberId::new();
        sqlx::query("INSERT INTO members (id, name, is_active) VALUES ($1, $2, TRUE)")
            .bind(id.as_uuid())
            .bind(&member.name)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(id)
    }

    async fn upsert_by_name(&self, member: NewMember) -> StoreResult<MemberId> {
        // One conditional statement against the unique active-name index;
        // the no-op DO UPDATE lets RETURNING yield the existing row's id.
        let row = sqlx::query(
            "INSERT INTO members (id, name, is_active) VALUES ($1, $2, TRUE) \
             ON CONFLICT (lower(name)) WHERE is_active \
             DO UPDATE SET name = members.name \
             RETURNING id",
        )
        .bind(MemberId::new().as_uuid())
        .bind(&member.name)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        let id: Uuid = row.try_get("id").map_err(StoreError::backend)?;
        Ok(MemberId::from_uuid(id))
    }

    async fn find(&self, id: MemberId) -> StoreResult<Option<Member>> {
        let row = sqlx::query("SELECT id, name, is_active FROM members WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        row.as_ref().map(member_from_row).transpose()
    }

    async fn list_active(&self) -> StoreResult<Vec<Member>> {
        let rows =
            sqlx::query("SELECT id, name, is_active FROM members WHERE is_active ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        rows.iter().map(member_from_row).collect()
    }

    async fn rename(&self, id: MemberId, member: NewMember) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE members SET name = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&member.name)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() == 1)
    }

    async fn deactivate(&self, id: MemberId) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE members SET is_active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() == 1)
    }
}

/// `loans` table on Postgres.
pub struct PgLoanStore {
    pool: PgPool,
}

impl PgLoanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn create(&self, loan: CreateLoan) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO loans (book_id, borrower_id, loan_date, returned_date) \
             VALUES ($1, $2, $3, NULL)",
        )
        .bind(loan.book_id.as_uuid())
        .bind(loan.borrower_id.as_uuid())
        .bind(loan.loan_date)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn close(
        &self,
        book_id: BookId,
        borrower_id: MemberId,
        returned_on: NaiveDate,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE loans SET returned_date = $3 \
             WHERE book_id = $1 AND borrower_id = $2 AND returned_date IS NULL",
        )
        .bind(book_id.as_uuid())
        .bind(borrower_id.as_uuid())
        .bind(returned_on)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(result.rows_affected())
    }

    async fn list_open(&self) -> StoreResult<Vec<Loan>> {
        let rows = sqlx::query(
            "SELECT book_id, borrower_id, loan_date, returned_date \
             FROM loans WHERE returned_date IS NULL ORDER BY loan_date DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        rows.iter().map(loan_from_row).collect()
    }

    async fn history_for_book(&self, book_id: BookId) -> StoreResult<Vec<Loan>> {
        let rows = sqlx::query(
            "SELECT book_id, borrower_id, loan_date, returned_date \
             FROM loans WHERE book_id = $1 ORDER BY loan_date DESC",
        )
        .bind(book_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        rows.iter().map(loan_from_row).collect()
    }

    async fn count_open_by_borrower(&self, borrower_id: MemberId) -> StoreResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM loans \
             WHERE borrower_id = $1 AND returned_date IS NULL",
        )
        .bind(borrower_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        let n: i64 = row.try_get("n").map_err(StoreError::backend)?;
        Ok(n as u64)
    }
}
