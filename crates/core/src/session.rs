//! The active user's session context.
//!
//! Threaded explicitly into constructors and ownership checks rather than
//! living in process-wide state, so two wizards for two users can coexist
//! in one process and tests need no global setup.

use crate::types::{UserId, UserRef};

/// Who is driving the wizard right now.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user: UserRef,
}

impl SessionContext {
    pub fn new(user: UserRef) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &UserRef {
        &self.user
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    /// Identity snapshot for attributing newly created objects.
    pub fn snapshot(&self) -> UserRef {
        self.user.clone()
    }
}
