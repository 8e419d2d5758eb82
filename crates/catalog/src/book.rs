use serde::{Deserialize, Serialize};

use familib_core::{BookId, DomainError, DomainResult, MemberId};

/// A catalog book record.
///
/// Invariant (maintained by the lending ledger, not by this type):
/// `is_available` is `false` exactly when an open loan for the book exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    /// Owning family member. Every book has exactly one owner.
    pub owner_id: MemberId,
    pub is_available: bool,
    /// Soft-delete marker. Inactive books stay in the store so loan history
    /// keeps resolving.
    pub is_active: bool,
}

impl Book {
    /// Whether the book can be offered for lending.
    pub fn is_lendable(&self) -> bool {
        self.is_active && self.is_available
    }
}

/// Validated input for cataloging a new book.
///
/// New books always start available and active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub owner_id: MemberId,
}

impl NewBook {
    /// Build a new-book record, trimming inputs.
    ///
    /// The title is required; blank optional fields collapse to `None`.
    pub fn new(
        title: impl Into<String>,
        author: Option<String>,
        cover_url: Option<String>,
        owner_id: MemberId,
    ) -> DomainResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }

        Ok(Self {
            title,
            author: normalize_optional(author),
            cover_url: normalize_optional(cover_url),
            owner_id,
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_book_trims_and_keeps_fields() {
        let owner = MemberId::new();
        let book = NewBook::new(
            "  The Hobbit ",
            Some("J. R. R. Tolkien".to_string()),
            Some(" https://covers.example/hobbit.jpg ".to_string()),
            owner,
        )
        .unwrap();

        assert_eq!(book.title, "The Hobbit");
        assert_eq!(book.author.as_deref(), Some("J. R. R. Tolkien"));
        assert_eq!(
            book.cover_url.as_deref(),
            Some("https://covers.example/hobbit.jpg")
        );
        assert_eq!(book.owner_id, owner);
    }

    #[test]
    fn new_book_rejects_blank_title() {
        let err = NewBook::new("   ", None, None, MemberId::new()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_optional_fields_collapse_to_none() {
        let book = NewBook::new(
            "Dune",
            Some("  ".to_string()),
            Some(String::new()),
            MemberId::new(),
        )
        .unwrap();

        assert_eq!(book.author, None);
        assert_eq!(book.cover_url, None);
    }
}
