//! `familib-auth` — the session boundary.
//!
//! Token issuance belongs to the external identity provider; this crate
//! only verifies what comes back: HS256 signature plus a deterministic
//! claims check. Decoupled from HTTP and storage.

pub mod claims;
pub mod token;

pub use claims::{SessionClaims, SessionUserId, TokenValidationError, validate_claims};
pub use token::{Hs256SessionValidator, SessionTokenError, SessionValidator};
