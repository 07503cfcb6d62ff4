//! Inline comments attached to a question or to the draft overall.
//!
//! Comments are flat (no replies), soft-deleted only, and carry an identity
//! snapshot of their author plus the set of user ids that have seen them.

use serde::{Deserialize, Serialize};

use crate::session::SessionContext;
use crate::types::{Timestamp, UserId, UserRef};

// ---------------------------------------------------------------------------
// Wire payload
// ---------------------------------------------------------------------------

/// Persisted shape of a single comment.
///
/// Every field is optional: a freshly drafted comment round-trips as
/// `{value}` only, and [`Comment::from_data`] fills in the rest from the
/// session context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen_by: Option<Vec<UserId>>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A single annotation on a question.
#[derive(Debug, Clone)]
pub struct Comment {
    user: UserRef,
    last_modified: Option<Timestamp>,
    value: String,
    is_deleted: bool,
    seen_by: Vec<UserId>,
}

impl Comment {
    /// A freshly drafted, empty comment authored by the session user.
    pub fn new(ctx: &SessionContext) -> Self {
        Self::from_data(CommentData::default(), ctx)
    }

    /// Build a comment from a persisted payload.
    ///
    /// Payload-supplied fields win. A missing `user` defaults to the session
    /// user, and a missing `seen_by` defaults to a singleton set holding the
    /// session user's id.
    pub fn from_data(data: CommentData, ctx: &SessionContext) -> Self {
        Self {
            user: data.user.unwrap_or_else(|| ctx.snapshot()),
            last_modified: data.last_modified,
            value: data.value.unwrap_or_default(),
            is_deleted: data.is_deleted.unwrap_or(false),
            seen_by: data.seen_by.unwrap_or_else(|| vec![ctx.user_id()]),
        }
    }

    pub fn user(&self) -> &UserRef {
        &self.user
    }

    pub fn last_modified(&self) -> Option<Timestamp> {
        self.last_modified
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Soft-delete toggle. Deleting also clears the text in the same
    /// mutation; there is no way to delete a comment and keep its content.
    /// Un-deleting does not restore it.
    pub fn set_deleted(&mut self, deleted: bool) {
        if deleted {
            self.value.clear();
        }
        self.is_deleted = deleted;
    }

    pub fn seen_by(&self) -> &[UserId] {
        &self.seen_by
    }

    /// Whether this comment round-tripped from storage.
    ///
    /// The author snapshot is always present after construction, so a
    /// storage round-trip is signalled by the `last_modified` stamp the
    /// server puts on every saved comment; freshly drafted comments have
    /// none.
    pub fn saved(&self) -> bool {
        self.last_modified.is_some()
    }

    pub fn is_owner(&self, ctx: &SessionContext) -> bool {
        self.user.id == ctx.user_id()
    }

    /// The author's full name, even when the author is the session user.
    pub fn author(&self) -> &str {
        &self.user.fullname
    }

    /// `"You"` for the session user's own comments, the full name otherwise.
    pub fn display_author(&self, ctx: &SessionContext) -> &str {
        if self.is_owner(ctx) {
            "You"
        } else {
            self.author()
        }
    }

    /// Only the creator may delete.
    pub fn can_delete(&self, ctx: &SessionContext) -> bool {
        self.is_owner(ctx)
    }

    /// A comment is editable once it has been saved, and only by its
    /// creator.
    pub fn can_edit(&self, ctx: &SessionContext) -> bool {
        self.saved() && self.is_owner(ctx)
    }

    /// Record that `user` has seen this comment. Idempotent.
    pub fn mark_viewed(&mut self, user: &UserRef) {
        if !self.seen_by.contains(&user.id) {
            self.seen_by.push(user.id);
        }
    }

    /// Serialize back to the wire shape.
    pub fn to_data(&self) -> CommentData {
        CommentData {
            user: Some(self.user.clone()),
            last_modified: self.last_modified,
            value: Some(self.value.clone()),
            is_deleted: Some(self.is_deleted),
            seen_by: Some(self.seen_by.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
