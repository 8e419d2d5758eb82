use serde::{Deserialize, Serialize};

use familib_core::{DomainError, DomainResult, MemberId};

/// A family member: owns books, borrows books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Display name, used as the human-facing lookup key. Effectively unique
    /// among active members (enforced by the store's upsert).
    pub name: String,
    /// Soft-delete marker. Inactive members stay resolvable so loan history
    /// keeps its borrower names.
    pub is_active: bool,
}

/// Validated input for registering a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
}

impl NewMember {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self { name })
    }
}
