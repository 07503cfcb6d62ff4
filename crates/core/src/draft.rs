//! A persisted registration-in-progress and its lifecycle state machine.
//!
//! A draft moves `Unsaved -> Saved -> Submitted`, and only along those
//! edges. Submission is irreversible; once registered the wizard session
//! for this draft is over.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schema::{AnswerData, MetaSchema, SchemaParams};
use crate::session::SessionContext;
use crate::types::{DraftPk, Timestamp, UserRef};

// ---------------------------------------------------------------------------
// Lifecycle states
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    /// Never created server-side; no `pk` yet.
    Unsaved,
    /// Created and savable any number of times.
    Saved,
    /// Registered. Terminal.
    Submitted,
}

impl DraftState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsaved => "unsaved",
            Self::Saved => "saved",
            Self::Submitted => "submitted",
        }
    }
}

/// Validate a lifecycle transition.
///
/// Legal edges: `Unsaved -> Saved` (first create), `Saved -> Saved`
/// (re-save), `Saved -> Submitted` (register). Everything else is refused.
pub fn validate_transition(from: DraftState, to: DraftState) -> Result<(), CoreError> {
    use DraftState::*;
    match (from, to) {
        (Unsaved, Saved) | (Saved, Saved) | (Saved, Submitted) => Ok(()),
        _ => Err(CoreError::State(format!(
            "Cannot transition a draft from {} to {}",
            from.as_str(),
            to.as_str()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// Named endpoints the submission flow talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftUrls {
    pub before_register: String,
    pub register: String,
}

/// A draft as fetched from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftParams {
    #[serde(default)]
    pub pk: Option<DraftPk>,
    #[serde(default)]
    pub registration_metadata: AnswerData,
    #[serde(default)]
    pub initiator: Option<UserRef>,
    #[serde(default)]
    pub initiated: Option<Timestamp>,
    #[serde(default)]
    pub updated: Option<Timestamp>,
    pub urls: DraftUrls,
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// A registration draft: one schema, one answer tree, one submission.
#[derive(Debug, Clone)]
pub struct Draft {
    pk: Option<DraftPk>,
    meta_schema: MetaSchema,
    registration_metadata: AnswerData,
    initiator: Option<UserRef>,
    initiated: Option<Timestamp>,
    updated: Option<Timestamp>,
    urls: DraftUrls,
    submitted: bool,
    register_in_flight: bool,
}

impl Draft {
    /// Build a draft from its persisted representation, materializing the
    /// schema's question tree from the draft's answer payload.
    pub fn new(params: DraftParams, schema: SchemaParams, ctx: &SessionContext) -> Self {
        let meta_schema = MetaSchema::new(schema, &params.registration_metadata, ctx);
        Self {
            pk: params.pk,
            meta_schema,
            registration_metadata: params.registration_metadata,
            initiator: params.initiator,
            initiated: params.initiated,
            updated: params.updated,
            urls: params.urls,
            submitted: false,
            register_in_flight: false,
        }
    }

    pub fn pk(&self) -> Option<&DraftPk> {
        self.pk.as_ref()
    }

    pub fn meta_schema(&self) -> &MetaSchema {
        &self.meta_schema
    }

    pub fn meta_schema_mut(&mut self) -> &mut MetaSchema {
        &mut self.meta_schema
    }

    /// The answer payload as loaded; the live tree diverges from this as
    /// the user edits.
    pub fn registration_metadata(&self) -> &AnswerData {
        &self.registration_metadata
    }

    pub fn initiator(&self) -> Option<&UserRef> {
        self.initiator.as_ref()
    }

    pub fn initiated(&self) -> Option<Timestamp> {
        self.initiated
    }

    pub fn updated(&self) -> Option<Timestamp> {
        self.updated
    }

    pub fn set_updated(&mut self, updated: Timestamp) {
        self.updated = Some(updated);
    }

    pub fn urls(&self) -> &DraftUrls {
        &self.urls
    }

    pub fn state(&self) -> DraftState {
        if self.submitted {
            DraftState::Submitted
        } else if self.pk.is_some() {
            DraftState::Saved
        } else {
            DraftState::Unsaved
        }
    }

    /// Record the identity returned by the first successful create.
    ///
    /// A pk is assigned exactly once: re-assigning the same value is a
    /// no-op, a different value is refused.
    pub fn assign_pk(&mut self, pk: DraftPk) -> Result<(), CoreError> {
        match &self.pk {
            None => {
                self.pk = Some(pk);
                Ok(())
            }
            Some(existing) if *existing == pk => Ok(()),
            Some(existing) => Err(CoreError::State(format!(
                "Draft already has pk '{existing}'; refusing to reassign to '{pk}'"
            ))),
        }
    }

    /// Percentage of required questions answered, over the whole tree.
    pub fn completion(&self) -> f64 {
        let questions = self.meta_schema.flat_questions();
        let required: Vec<_> = questions.iter().filter(|q| q.required()).collect();
        if required.is_empty() {
            return 100.0;
        }
        let filled = required.iter().filter(|q| q.is_complete()).count();
        (filled as f64 / required.len() as f64) * 100.0
    }

    /// Claim the register slot before issuing the network call.
    ///
    /// Refused when a register is already in flight, when the draft has
    /// never been created, or when it is already submitted.
    pub fn begin_register(&mut self) -> Result<(), CoreError> {
        if self.register_in_flight {
            return Err(CoreError::State(
                "A register call is already in flight for this draft".to_string(),
            ));
        }
        validate_transition(self.state(), DraftState::Submitted)?;
        self.register_in_flight = true;
        Ok(())
    }

    /// Release the register slot once the network call has resolved.
    pub fn end_register(&mut self) {
        self.register_in_flight = false;
    }

    pub fn register_in_flight(&self) -> bool {
        self.register_in_flight
    }

    /// Mark the draft submitted. Only legal from `Saved`; irreversible.
    pub fn mark_submitted(&mut self) -> Result<(), CoreError> {
        validate_transition(self.state(), DraftState::Submitted)?;
        self.submitted = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
