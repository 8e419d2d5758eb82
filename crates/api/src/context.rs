use familib_auth::SessionUserId;

/// Authenticated session context for a request.
///
/// Inserted by the auth middleware and handed to handlers explicitly —
/// there is no ambient "current user" anywhere else.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user_id: SessionUserId,
}

impl CurrentUser {
    pub fn new(user_id: SessionUserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> SessionUserId {
        self.user_id
    }
}
