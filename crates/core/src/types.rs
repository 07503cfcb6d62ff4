use serde::{Deserialize, Serialize};

/// Server-assigned draft keys are opaque strings.
pub type DraftPk = String;

/// User identifiers as issued by the account service.
pub type UserId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identity snapshot of a user taken when an object was created.
///
/// A snapshot, not a live reference: renaming the account later does not
/// rewrite the attribution on existing comments or drafts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub fullname: String,
}
