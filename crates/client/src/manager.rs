//! Entry point for the wizard landing view: lists the active schemas and
//! the drafts in progress, starts new drafts, and deletes abandoned ones.

use chrono::Utc;
use validator::Validate;

use regdraft_core::draft::{Draft, DraftParams, DraftUrls};
use regdraft_core::error::CoreError;
use regdraft_core::schema::{AnswerData, SchemaParams};
use regdraft_core::session::SessionContext;
use regdraft_core::types::DraftPk;

use crate::api::{DraftSaveRequest, RegistrationApi};
use crate::editor::DRAFT_PK_TEMPLATE;
use crate::error::{ClientError, ClientResult};

/// Endpoints the manager talks to. `delete`, `before_register`, and
/// `register` carry a [`DRAFT_PK_TEMPLATE`] placeholder.
#[derive(Debug, Clone)]
pub struct ManagerUrls {
    pub schemas: String,
    pub drafts: String,
    pub create: String,
    pub delete: String,
    pub before_register: String,
    pub register: String,
}

impl ManagerUrls {
    /// Per-draft submission endpoints for a freshly created draft.
    fn draft_urls(&self, pk: &str) -> DraftUrls {
        DraftUrls {
            before_register: self.before_register.replace(DRAFT_PK_TEMPLATE, pk),
            register: self.register.replace(DRAFT_PK_TEMPLATE, pk),
        }
    }
}

/// Manages the collection of drafts for one registration target.
pub struct RegistrationManager<A> {
    api: A,
    ctx: SessionContext,
    urls: ManagerUrls,
    schemas: Vec<SchemaParams>,
    drafts: Vec<DraftParams>,
}

impl<A> RegistrationManager<A>
where
    A: RegistrationApi,
{
    pub fn new(api: A, ctx: SessionContext, urls: ManagerUrls) -> Self {
        Self {
            api,
            ctx,
            urls,
            schemas: Vec::new(),
            drafts: Vec::new(),
        }
    }

    /// Fetch the active schemas and the draft list. Drafts are ordered
    /// most-recently-updated first; never-saved timestamps sort last.
    pub async fn init(&mut self) -> ClientResult<()> {
        self.schemas = self.api.get_schemas(&self.urls.schemas).await?.meta_schemas;

        let mut drafts = self.api.get_drafts(&self.urls.drafts).await?.drafts;
        drafts.sort_by(|a, b| b.updated.cmp(&a.updated));
        self.drafts = drafts;

        tracing::info!(
            schemas = self.schemas.len(),
            drafts = self.drafts.len(),
            "Registration manager initialized"
        );
        Ok(())
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn schemas(&self) -> &[SchemaParams] {
        &self.schemas
    }

    pub fn drafts(&self) -> &[DraftParams] {
        &self.drafts
    }

    pub fn find_schema(&self, name: &str, version: i64) -> Option<&SchemaParams> {
        self.schemas
            .iter()
            .find(|s| s.schema_name == name && s.schema_version == version)
    }

    /// Start a new draft against one of the known schemas.
    ///
    /// Creates it server-side with an empty answer payload, records it in
    /// the local list, and returns the materialized draft ready for an
    /// editor.
    pub async fn new_draft(&mut self, schema_name: &str, schema_version: i64) -> ClientResult<Draft> {
        let body = DraftSaveRequest {
            schema_name: schema_name.to_string(),
            schema_version,
            schema_data: AnswerData::new(),
        };
        body.validate()
            .map_err(|err| CoreError::Validation(err.to_string()))?;

        let schema = self
            .find_schema(schema_name, schema_version)
            .cloned()
            .ok_or_else(|| {
                ClientError::Core(CoreError::Validation(format!(
                    "Unknown schema '{schema_name}' version {schema_version}"
                )))
            })?;

        let identity = self.api.post_create(&self.urls.create, &body).await?;
        tracing::info!(pk = %identity.pk, schema = schema_name, "Draft started");

        let params = DraftParams {
            pk: Some(identity.pk.clone()),
            registration_metadata: AnswerData::new(),
            initiator: Some(self.ctx.snapshot()),
            initiated: Some(Utc::now()),
            updated: identity.updated,
            urls: self.urls.draft_urls(&identity.pk),
        };
        self.drafts.insert(0, params.clone());

        Ok(Draft::new(params, schema, &self.ctx))
    }

    /// Delete a draft server-side and drop it from the local list.
    pub async fn delete_draft(&mut self, pk: &DraftPk) -> ClientResult<()> {
        let url = self.urls.delete.replace(DRAFT_PK_TEMPLATE, pk);
        self.api.delete_draft(&url).await?;
        self.drafts.retain(|d| d.pk.as_ref() != Some(pk));
        tracing::info!(pk = %pk, "Draft deleted");
        Ok(())
    }
}
