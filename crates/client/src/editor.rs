//! The wizard editor: binds a draft, navigates its pages, and keeps the
//! server copy fresh.
//!
//! Saves are fire-and-forget: a failed save surfaces through the presenter
//! as a notification and never interrupts what the user is doing. The
//! locally entered answers stay in memory either way.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use regdraft_core::draft::Draft;
use regdraft_core::error::CoreError;
use regdraft_core::schema::AnswerData;
use regdraft_core::session::SessionContext;
use regdraft_core::types::Timestamp;

use crate::api::{DraftIdentity, DraftSaveRequest, RegistrationApi};
use crate::error::ClientResult;
use crate::presenter::WizardPresenter;
use crate::submission::{self, SubmissionOutcome};

/// Placeholder substituted with the draft's pk in templated URLs.
pub const DRAFT_PK_TEMPLATE: &str = "{draft_pk}";

/// How long entered answers may sit unsaved before an autosave tick
/// should flush them.
pub const AUTOSAVE_INTERVAL_SECS: i64 = 60;

/// Whether an autosave tick at `now` should save, given the last
/// successful save.
pub fn autosave_due(last_saved: Option<Timestamp>, now: Timestamp) -> bool {
    match last_saved {
        None => true,
        Some(t) => now.signed_duration_since(t).num_seconds() >= AUTOSAVE_INTERVAL_SECS,
    }
}

/// Endpoints the editor talks to. `update` carries a
/// [`DRAFT_PK_TEMPLATE`] placeholder.
#[derive(Debug, Clone)]
pub struct EditorUrls {
    pub create: String,
    pub update: String,
}

/// Drives one draft through the wizard.
pub struct RegistrationEditor<A, P> {
    api: A,
    presenter: P,
    ctx: SessionContext,
    urls: EditorUrls,
    draft: Option<Draft>,
    current_page: usize,
    dirty: bool,
    last_save_token: Option<Uuid>,
    last_saved_at: Option<Timestamp>,
}

impl<A, P> RegistrationEditor<A, P>
where
    A: RegistrationApi,
    P: WizardPresenter,
{
    pub fn new(api: A, presenter: P, ctx: SessionContext, urls: EditorUrls) -> Self {
        Self {
            api,
            presenter,
            ctx,
            urls,
            draft: None,
            current_page: 0,
            dirty: false,
            last_save_token: None,
            last_saved_at: None,
        }
    }

    /// Bind the editor to a draft. Navigation lands on the first page with
    /// unanswered questions, or the first page when everything is complete.
    pub fn init(&mut self, draft: Draft) {
        self.current_page = draft
            .meta_schema()
            .pages()
            .iter()
            .position(|page| !page.is_complete())
            .unwrap_or(0);
        tracing::info!(
            pk = ?draft.pk(),
            page = self.current_page,
            "Editor bound to draft"
        );
        self.draft = Some(draft);
        self.dirty = false;
        self.last_save_token = None;
        self.last_saved_at = None;
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    // -- page navigation ---------------------------------------------------

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.draft
            .as_ref()
            .map(|d| d.meta_schema().pages().len())
            .unwrap_or(0)
    }

    pub fn goto_page(&mut self, index: usize) -> Result<(), CoreError> {
        if index >= self.page_count() {
            return Err(CoreError::Validation(format!(
                "Page index {index} is out of range (0..{})",
                self.page_count()
            )));
        }
        self.current_page = index;
        Ok(())
    }

    pub fn next_page(&mut self) -> Result<(), CoreError> {
        self.goto_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> Result<(), CoreError> {
        if self.current_page == 0 {
            return Err(CoreError::Validation(
                "Already on the first page; cannot go back".to_string(),
            ));
        }
        self.current_page -= 1;
        Ok(())
    }

    // -- editing -----------------------------------------------------------

    /// Write an answer into the question tree and mark the draft dirty.
    pub fn set_value(&mut self, qid: &str, value: serde_json::Value) -> Result<(), CoreError> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| CoreError::State("No draft bound to the editor".to_string()))?;
        let question = draft
            .meta_schema_mut()
            .find_question_mut(qid)
            .ok_or_else(|| CoreError::Validation(format!("Unknown question id '{qid}'")))?;
        question.set_value(value);
        self.dirty = true;
        Ok(())
    }

    /// Update the comment being drafted on a question.
    pub fn set_next_comment(&mut self, qid: &str, text: &str) -> Result<(), CoreError> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| CoreError::State("No draft bound to the editor".to_string()))?;
        let question = draft
            .meta_schema_mut()
            .find_question_mut(qid)
            .ok_or_else(|| CoreError::Validation(format!("Unknown question id '{qid}'")))?;
        question.set_next_comment(text);
        Ok(())
    }

    /// Promote a question's drafted comment and persist immediately.
    pub async fn add_comment(&mut self, qid: &str) -> Result<(), CoreError> {
        let ctx = self.ctx.clone();
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| CoreError::State("No draft bound to the editor".to_string()))?;
        let question = draft
            .meta_schema_mut()
            .find_question_mut(qid)
            .ok_or_else(|| CoreError::Validation(format!("Unknown question id '{qid}'")))?;
        if !question.allow_add_next() {
            return Err(CoreError::Validation(
                "Comment text is blank".to_string(),
            ));
        }

        let mut added = false;
        question.add_comment(&ctx, || added = true);
        if added {
            self.dirty = true;
            self.save().await;
        }
        Ok(())
    }

    /// Record that the session user has seen every comment on a question,
    /// e.g. when its comment pane is opened.
    pub fn view_comments(&mut self, qid: &str) -> Result<(), CoreError> {
        let user = self.ctx.snapshot();
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| CoreError::State("No draft bound to the editor".to_string()))?;
        let question = draft
            .meta_schema_mut()
            .find_question_mut(qid)
            .ok_or_else(|| CoreError::Validation(format!("Unknown question id '{qid}'")))?;
        for comment in question.comments_mut() {
            comment.mark_viewed(&user);
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved_at(&self) -> Option<Timestamp> {
        self.last_saved_at
    }

    // -- persistence -------------------------------------------------------

    /// Create the draft server-side with the given answers, record the
    /// returned identity, and refresh local state from it.
    pub async fn create(&mut self, schema_data: AnswerData) -> ClientResult<()> {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| CoreError::State("No draft bound to the editor".to_string()))?;
        let body = DraftSaveRequest {
            schema_name: draft.meta_schema().name().to_string(),
            schema_version: draft.meta_schema().version(),
            schema_data,
        };
        body.validate()
            .map_err(|err| CoreError::Validation(err.to_string()))?;

        let identity = self.api.post_create(&self.urls.create, &body).await?;
        tracing::info!(pk = %identity.pk, "Draft created");
        self.update_data(identity)?;
        Ok(())
    }

    /// Refresh local state from an authoritative server response.
    pub fn update_data(&mut self, identity: DraftIdentity) -> Result<(), CoreError> {
        let Some(draft) = self.draft.as_mut() else {
            return Ok(());
        };
        draft.assign_pk(identity.pk)?;
        if let Some(updated) = identity.updated {
            draft.set_updated(updated);
        }
        self.dirty = false;
        Ok(())
    }

    /// Persist the current answers.
    ///
    /// Fire-and-forget: failures surface through the presenter as a
    /// notification, never to the caller, and page navigation is not
    /// blocked on completion. A draft that has never been created is
    /// created instead. Responses to superseded saves are ignored.
    pub async fn save(&mut self) {
        let Some(draft) = self.draft.as_ref() else {
            return;
        };

        let Some(pk) = draft.pk().cloned() else {
            let data = draft.meta_schema().to_answer_data();
            if let Err(err) = self.create(data).await {
                tracing::warn!(error = %err, "Draft create during save failed");
                self.presenter.notify_save_failed(&err.to_string());
            }
            return;
        };

        let body = DraftSaveRequest {
            schema_name: draft.meta_schema().name().to_string(),
            schema_version: draft.meta_schema().version(),
            schema_data: draft.meta_schema().to_answer_data(),
        };
        let url = self.urls.update.replace(DRAFT_PK_TEMPLATE, &pk);
        let token = Uuid::new_v4();
        self.last_save_token = Some(token);

        match self.api.put_update(&url, &body).await {
            Ok(identity) => {
                if self.last_save_token != Some(token) {
                    tracing::debug!(pk = %pk, "Ignoring stale save response");
                    return;
                }
                if let Err(err) = self.update_data(identity) {
                    tracing::warn!(error = %err, "Save response rejected");
                    self.presenter.notify_save_failed(&err.to_string());
                    return;
                }
                self.last_saved_at = Some(Utc::now());
                tracing::debug!(pk = %pk, "Draft saved");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Draft save failed");
                self.presenter.notify_save_failed(&err.to_string());
            }
        }
    }

    /// Periodic tick: save only when there are unsaved edits and the
    /// interval has elapsed.
    pub async fn autosave(&mut self) {
        if self.dirty && autosave_due(self.last_saved_at, Utc::now()) {
            self.save().await;
        }
    }

    // -- submission --------------------------------------------------------

    /// Start the submission flow, gated on local validity: if any question
    /// is invalid the gate presents the problems and nothing is sent.
    pub async fn submit(&mut self, payload: Option<AnswerData>) -> SubmissionOutcome {
        let Self {
            draft,
            api,
            presenter,
            ..
        } = self;
        let Some(draft) = draft.as_mut() else {
            return SubmissionOutcome::Failed;
        };

        let unanswered: Vec<String> = draft
            .meta_schema()
            .flat_questions()
            .iter()
            .filter(|q| !q.is_valid())
            .map(|q| {
                format!(
                    "'{}' is required and has no answer",
                    q.title().unwrap_or_else(|| q.id())
                )
            })
            .collect();
        if !unanswered.is_empty() {
            tracing::info!(count = unanswered.len(), "Submission blocked locally");
            presenter.pre_register_errors(&unanswered);
            return SubmissionOutcome::Blocked;
        }

        submission::before_register(draft, &*api, &*presenter, payload).await
    }

    /// Proceed with registration after the user has acknowledged the
    /// pre-registration prompts.
    pub async fn confirm_submit(&mut self, payload: Option<AnswerData>) -> SubmissionOutcome {
        let Self {
            draft,
            api,
            presenter,
            ..
        } = self;
        let Some(draft) = draft.as_mut() else {
            return SubmissionOutcome::Failed;
        };
        let payload = payload.unwrap_or_else(|| draft.meta_schema().to_answer_data());
        submission::register(draft, &*api, &*presenter, &payload).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
