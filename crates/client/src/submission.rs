//! The pre-registration confirmation flow and the final, irreversible
//! registration call.
//!
//! Both entry points always resolve to a [`SubmissionOutcome`]; failures
//! are routed through the presenter, never returned as errors, so callers
//! can attach one completion path regardless of which branch ran.

use regdraft_core::draft::Draft;
use regdraft_core::schema::AnswerData;

use crate::api::RegistrationApi;
use crate::presenter::WizardPresenter;

/// Dialog body shown when a registration goes through.
pub const SUBMISSION_SUCCESS_MESSAGE: &str =
    "Your registration has been submitted. You will be redirected momentarily.";

/// How a submission attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Server-side validation errors were presented; nothing was sent.
    Blocked,
    /// Confirmation prompts were presented; waiting on the user.
    AwaitingConfirmation,
    /// The draft is registered. Terminal.
    Registered,
    /// Transport or lifecycle refusal; draft state unchanged.
    Failed,
}

/// Consult the `before_register` endpoint, then act on its verdict.
///
/// Priority order: errors block, prompts wait for confirmation, and a clean
/// response proceeds straight to [`register`] with the same payload. A
/// transport failure on the validation fetch blocks the submission: an
/// irreversible register must never be triggered by a failed read.
pub async fn before_register<A, P>(
    draft: &mut Draft,
    api: &A,
    presenter: &P,
    payload: Option<AnswerData>,
) -> SubmissionOutcome
where
    A: RegistrationApi + ?Sized,
    P: WizardPresenter + ?Sized,
{
    let payload = payload.unwrap_or_else(|| draft.meta_schema().to_answer_data());
    let url = draft.urls().before_register.clone();

    match api.get_before_register(&url, &payload).await {
        Err(err) => {
            tracing::warn!(error = %err, "Pre-register fetch failed; blocking submission");
            presenter.show_submission_failure(&err.to_string());
            SubmissionOutcome::Failed
        }
        Ok(response) if !response.errors.is_empty() => {
            tracing::info!(
                count = response.errors.len(),
                "Pre-register validation errors"
            );
            presenter.pre_register_errors(&response.errors);
            SubmissionOutcome::Blocked
        }
        Ok(response) if !response.prompts.is_empty() => {
            tracing::info!(count = response.prompts.len(), "Pre-register prompts");
            presenter.pre_register_prompts(&response.prompts);
            SubmissionOutcome::AwaitingConfirmation
        }
        Ok(_) => register(draft, api, presenter, &payload).await,
    }
}

/// Issue the registration call.
///
/// Guarded against double-submits: the draft's register slot is claimed
/// before the network call and released after, and an already-submitted or
/// never-created draft is refused up front.
pub async fn register<A, P>(
    draft: &mut Draft,
    api: &A,
    presenter: &P,
    payload: &AnswerData,
) -> SubmissionOutcome
where
    A: RegistrationApi + ?Sized,
    P: WizardPresenter + ?Sized,
{
    if let Err(err) = draft.begin_register() {
        tracing::warn!(error = %err, "Register refused");
        presenter.show_submission_failure(&err.to_string());
        return SubmissionOutcome::Failed;
    }

    let url = draft.urls().register.clone();
    let result = api.post_register(&url, payload).await;
    draft.end_register();

    match result {
        Ok(receipt) => match draft.mark_submitted() {
            Ok(()) => {
                tracing::info!(pk = ?draft.pk(), "Draft registered");
                presenter.show_submission_success(SUBMISSION_SUCCESS_MESSAGE);
                presenter.redirect(&receipt.redirect_url);
                SubmissionOutcome::Registered
            }
            Err(err) => {
                presenter.show_submission_failure(&err.to_string());
                SubmissionOutcome::Failed
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "Register call failed");
            presenter.show_submission_failure(&err.to_string());
            SubmissionOutcome::Failed
        }
    }
}
