//! Transport seam to the registration backend.
//!
//! [`RegistrationApi`] is the async boundary the editor, manager, and
//! submission flow talk through; [`HttpRegistrationApi`] is the production
//! implementation. Tests substitute their own implementation and never
//! open a socket.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use regdraft_core::draft::DraftParams;
use regdraft_core::schema::{AnswerData, SchemaParams};
use regdraft_core::types::{DraftPk, Timestamp};

use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// Request / response DTOs
// ---------------------------------------------------------------------------

/// Server-side validation result fetched before registering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreRegisterResponse {
    /// Blocking problems; registration must not proceed.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Warnings requiring explicit user acknowledgment.
    #[serde(default)]
    pub prompts: Vec<String>,
}

/// Successful registration response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterReceipt {
    /// Where the backend wants the user sent next.
    pub redirect_url: String,
}

/// Body for draft create and update calls.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DraftSaveRequest {
    #[validate(length(min = 1, message = "schema_name must not be empty"))]
    pub schema_name: String,
    pub schema_version: i64,
    pub schema_data: AnswerData,
}

/// Identity (and freshness) of a draft as echoed by create/update.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftIdentity {
    pub pk: DraftPk,
    #[serde(default)]
    pub updated: Option<Timestamp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaList {
    pub meta_schemas: Vec<SchemaParams>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftList {
    pub drafts: Vec<DraftParams>,
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Everything the wizard asks of the backend.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// Fetch pre-registration validation for `payload`.
    async fn get_before_register(
        &self,
        url: &str,
        payload: &AnswerData,
    ) -> ClientResult<PreRegisterResponse>;

    /// Submit the registration. Irreversible on success.
    async fn post_register(&self, url: &str, payload: &AnswerData)
        -> ClientResult<RegisterReceipt>;

    /// Create a new draft; returns its server-assigned identity.
    async fn post_create(&self, url: &str, body: &DraftSaveRequest) -> ClientResult<DraftIdentity>;

    /// Persist the current answers of an existing draft.
    async fn put_update(&self, url: &str, body: &DraftSaveRequest) -> ClientResult<DraftIdentity>;

    /// List the active registration schemas.
    async fn get_schemas(&self, url: &str) -> ClientResult<SchemaList>;

    /// List the drafts in progress.
    async fn get_drafts(&self, url: &str) -> ClientResult<DraftList>;

    /// Delete a draft.
    async fn delete_draft(&self, url: &str) -> ClientResult<()>;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

/// Production transport over HTTP.
pub struct HttpRegistrationApi {
    http: reqwest::Client,
}

impl HttpRegistrationApi {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured client (auth headers, proxies, timeouts).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))
    }
}

impl Default for HttpRegistrationApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn get_before_register(
        &self,
        url: &str,
        payload: &AnswerData,
    ) -> ClientResult<PreRegisterResponse> {
        let data = serde_json::to_string(payload)
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        tracing::debug!(url, "Fetching pre-register validation");
        let response = self
            .http
            .get(url)
            .query(&[("data", data)])
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Self::parse(response).await
    }

    async fn post_register(
        &self,
        url: &str,
        payload: &AnswerData,
    ) -> ClientResult<RegisterReceipt> {
        tracing::debug!(url, "Registering draft");
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Self::parse(response).await
    }

    async fn post_create(&self, url: &str, body: &DraftSaveRequest) -> ClientResult<DraftIdentity> {
        tracing::debug!(url, schema = %body.schema_name, "Creating draft");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Self::parse(response).await
    }

    async fn put_update(&self, url: &str, body: &DraftSaveRequest) -> ClientResult<DraftIdentity> {
        tracing::debug!(url, "Saving draft");
        let response = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Self::parse(response).await
    }

    async fn get_schemas(&self, url: &str) -> ClientResult<SchemaList> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Self::parse(response).await
    }

    async fn get_drafts(&self, url: &str) -> ClientResult<DraftList> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Self::parse(response).await
    }

    async fn delete_draft(&self, url: &str) -> ClientResult<()> {
        tracing::debug!(url, "Deleting draft");
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
