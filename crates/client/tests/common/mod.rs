//! Shared harness for the client flow tests: an in-memory transport that
//! records every call, a presenter that records every dialog, and fixture
//! builders for schemas and drafts.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use regdraft_client::api::{
    DraftIdentity, DraftList, DraftSaveRequest, PreRegisterResponse, RegisterReceipt,
    RegistrationApi, SchemaList,
};
use regdraft_client::error::{ClientError, ClientResult};
use regdraft_client::presenter::WizardPresenter;
use regdraft_core::draft::{Draft, DraftParams, DraftUrls};
use regdraft_core::question::{QuestionData, QuestionDescriptor, QuestionType};
use regdraft_core::schema::{AnswerData, PageDescriptor, SchemaDescriptor, SchemaParams};
use regdraft_core::session::SessionContext;
use regdraft_core::types::UserRef;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn ctx() -> SessionContext {
    SessionContext::new(UserRef {
        id: 1,
        fullname: "Ada Lovelace".to_string(),
    })
}

pub fn string_question(qid: &str, required: bool) -> QuestionDescriptor {
    QuestionDescriptor {
        qid: qid.to_string(),
        title: Some(format!("Question {qid}")),
        nav: Some(qid.to_string()),
        question_type: QuestionType::String,
        format: Some("text".to_string()),
        description: None,
        help: None,
        required,
        options: vec![],
        properties: BTreeMap::new(),
    }
}

/// Two pages: page 0 holds required q0/q1, page 1 holds required q2 and
/// optional q3.
pub fn schema_params() -> SchemaParams {
    SchemaParams {
        schema_name: "Preregistration".to_string(),
        schema_version: 2,
        title: Some("Preregistration".to_string()),
        schema: SchemaDescriptor {
            title: Some("Preregistration".to_string()),
            version: Some(2),
            description: None,
            fulfills: vec![],
            pages: vec![
                PageDescriptor {
                    id: "page0".to_string(),
                    title: Some("Study design".to_string()),
                    questions: vec![string_question("q0", true), string_question("q1", true)],
                },
                PageDescriptor {
                    id: "page1".to_string(),
                    title: Some("Analysis plan".to_string()),
                    questions: vec![string_question("q2", true), string_question("q3", false)],
                },
            ],
        },
        id: "prereg".to_string(),
    }
}

pub fn draft_urls(pk: &str) -> DraftUrls {
    DraftUrls {
        before_register: format!("/drafts/{pk}/before_register"),
        register: format!("/drafts/{pk}/register"),
    }
}

pub fn draft_params(pk: Option<&str>) -> DraftParams {
    DraftParams {
        pk: pk.map(str::to_string),
        registration_metadata: AnswerData::new(),
        initiator: Some(ctx().snapshot()),
        initiated: Some(Utc::now()),
        updated: Some(Utc::now()),
        urls: draft_urls(pk.unwrap_or("new")),
    }
}

/// A saved draft with every required question already answered.
pub fn answered_draft(pk: &str) -> Draft {
    let mut params = draft_params(Some(pk));
    for qid in ["q0", "q1", "q2"] {
        params.registration_metadata.insert(
            qid.to_string(),
            QuestionData {
                value: serde_json::json!("answered"),
                comments: vec![],
            },
        );
    }
    Draft::new(params, schema_params(), &ctx())
}

/// A saved draft with nothing answered yet.
pub fn blank_draft(pk: &str) -> Draft {
    Draft::new(draft_params(Some(pk)), schema_params(), &ctx())
}

// ---------------------------------------------------------------------------
// Recording transport
// ---------------------------------------------------------------------------

/// In-memory [`RegistrationApi`] with scriptable responses. Every call is
/// appended to `calls` as `(endpoint, url)`.
#[derive(Default)]
pub struct MockApi {
    pub pre_register: Mutex<PreRegisterResponse>,
    pub fail_before_register: AtomicBool,
    pub fail_register: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub redirect_url: Mutex<String>,
    pub created_pk: Mutex<String>,
    pub schemas: Mutex<Vec<SchemaParams>>,
    pub drafts: Mutex<Vec<DraftParams>>,
    pub last_register_payload: Mutex<Option<AnswerData>>,
    pub last_update_body: Mutex<Option<DraftSaveRequest>>,
    pub calls: Mutex<Vec<(&'static str, String)>>,
}

impl MockApi {
    pub fn new() -> Self {
        let api = Self::default();
        *api.redirect_url.lock().unwrap() = "/registrations/reg1".to_string();
        *api.created_pk.lock().unwrap() = "draft1".to_string();
        api
    }

    fn record(&self, endpoint: &'static str, url: &str) {
        self.calls.lock().unwrap().push((endpoint, url.to_string()));
    }

    pub fn calls_named(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .count()
    }

    pub fn last_url(&self, endpoint: &str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| *name == endpoint)
            .map(|(_, url)| url.clone())
    }

    fn transport_refused() -> ClientError {
        ClientError::Transport("connection refused".to_string())
    }
}

#[async_trait]
impl RegistrationApi for MockApi {
    async fn get_before_register(
        &self,
        url: &str,
        _payload: &AnswerData,
    ) -> ClientResult<PreRegisterResponse> {
        self.record("before_register", url);
        if self.fail_before_register.load(Ordering::SeqCst) {
            return Err(Self::transport_refused());
        }
        Ok(self.pre_register.lock().unwrap().clone())
    }

    async fn post_register(
        &self,
        url: &str,
        payload: &AnswerData,
    ) -> ClientResult<RegisterReceipt> {
        self.record("register", url);
        *self.last_register_payload.lock().unwrap() = Some(payload.clone());
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 500,
                message: "registration failed".to_string(),
            });
        }
        Ok(RegisterReceipt {
            redirect_url: self.redirect_url.lock().unwrap().clone(),
        })
    }

    async fn post_create(&self, url: &str, _body: &DraftSaveRequest) -> ClientResult<DraftIdentity> {
        self.record("create", url);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::transport_refused());
        }
        Ok(DraftIdentity {
            pk: self.created_pk.lock().unwrap().clone(),
            updated: Some(Utc::now()),
        })
    }

    async fn put_update(&self, url: &str, body: &DraftSaveRequest) -> ClientResult<DraftIdentity> {
        self.record("update", url);
        *self.last_update_body.lock().unwrap() = Some(body.clone());
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Self::transport_refused());
        }
        Ok(DraftIdentity {
            pk: self.created_pk.lock().unwrap().clone(),
            updated: Some(Utc::now()),
        })
    }

    async fn get_schemas(&self, url: &str) -> ClientResult<SchemaList> {
        self.record("schemas", url);
        Ok(SchemaList {
            meta_schemas: self.schemas.lock().unwrap().clone(),
        })
    }

    async fn get_drafts(&self, url: &str) -> ClientResult<DraftList> {
        self.record("drafts", url);
        Ok(DraftList {
            drafts: self.drafts.lock().unwrap().clone(),
        })
    }

    async fn delete_draft(&self, url: &str) -> ClientResult<()> {
        self.record("delete", url);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording presenter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    Errors(Vec<String>),
    Prompts(Vec<String>),
    Success(String),
    Failure(String),
    SaveFailed(String),
    Redirect(String),
}

/// [`WizardPresenter`] that records every presentation instead of showing
/// anything.
#[derive(Default)]
pub struct RecordingPresenter {
    pub events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matcher: impl Fn(&PresenterEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| matcher(e)).count()
    }

    pub fn error_dialogs(&self) -> usize {
        self.count(|e| matches!(e, PresenterEvent::Errors(_)))
    }

    pub fn prompt_dialogs(&self) -> usize {
        self.count(|e| matches!(e, PresenterEvent::Prompts(_)))
    }

    pub fn success_dialogs(&self) -> usize {
        self.count(|e| matches!(e, PresenterEvent::Success(_)))
    }

    pub fn failure_dialogs(&self) -> usize {
        self.count(|e| matches!(e, PresenterEvent::Failure(_)))
    }

    pub fn save_failures(&self) -> usize {
        self.count(|e| matches!(e, PresenterEvent::SaveFailed(_)))
    }

    pub fn redirects(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Redirect(url) => Some(url),
                _ => None,
            })
            .collect()
    }
}

impl WizardPresenter for RecordingPresenter {
    fn pre_register_errors(&self, errors: &[String]) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Errors(errors.to_vec()));
    }

    fn pre_register_prompts(&self, prompts: &[String]) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Prompts(prompts.to_vec()));
    }

    fn show_submission_success(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Success(message.to_string()));
    }

    fn show_submission_failure(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Failure(message.to_string()));
    }

    fn notify_save_failed(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::SaveFailed(message.to_string()));
    }

    fn redirect(&self, url: &str) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Redirect(url.to_string()));
    }
}
