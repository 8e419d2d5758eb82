//! `familib-directory` — the Member Directory.
//!
//! Family-member records and the [`MemberStore`] table interface.

pub mod member;
pub mod store;

pub use member::{Member, NewMember};
pub use store::MemberStore;
