//! Presentation seam: dialogs, notifications, and navigation.
//!
//! The wizard never renders anything itself. Whatever hosts it (a webview,
//! a TUI, a test harness) implements [`WizardPresenter`] and decides how a
//! blocking error list, a confirmation prompt, or a redirect actually
//! looks. All methods are fire-and-forget from the wizard's point of view.

/// Everything the wizard shows to, or asks of, the user.
pub trait WizardPresenter: Send + Sync {
    /// Blocking problems reported by pre-registration validation. The
    /// wizard stays where it is; the user edits and retries.
    fn pre_register_errors(&self, errors: &[String]);

    /// Non-blocking warnings that need explicit acknowledgment before the
    /// submission proceeds.
    fn pre_register_prompts(&self, prompts: &[String]);

    /// The registration went through.
    fn show_submission_success(&self, message: &str);

    /// The registration (or its preflight) failed; draft state unchanged.
    fn show_submission_failure(&self, message: &str);

    /// A background save failed. Locally entered answers are still in
    /// memory; nothing was lost.
    fn notify_save_failed(&self, message: &str);

    /// Send the user to a server-supplied location.
    fn redirect(&self, url: &str);
}
