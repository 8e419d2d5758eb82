use async_trait::async_trait;

use familib_core::{MemberId, StoreResult};

use crate::member::{Member, NewMember};

/// Table interface for the `members` store.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert a new active member and return its id.
    async fn insert(&self, member: NewMember) -> StoreResult<MemberId>;

    /// Insert-or-fetch by name against the unique active-name constraint.
    ///
    /// If an active member with this name (case-insensitive) exists, its id
    /// is returned; otherwise a new member is created. A single conditional
    /// store call, so concurrent callers with the same name converge on one
    /// record instead of racing find-then-create.
    async fn upsert_by_name(&self, member: NewMember) -> StoreResult<MemberId>;

    /// Fetch one member by id. Resolves inactive members too — loan history
    /// depends on it.
    async fn find(&self, id: MemberId) -> StoreResult<Option<Member>>;

    /// All active members, ordered by name.
    async fn list_active(&self) -> StoreResult<Vec<Member>>;

    /// Update a member's display name; returns whether a row matched.
    async fn rename(&self, id: MemberId, member: NewMember) -> StoreResult<bool>;

    /// Soft-delete: flip `is_active` to `false`; returns whether a row
    /// matched. Rows are never removed.
    async fn deactivate(&self, id: MemberId) -> StoreResult<bool>;
}
