//! Versioned registration schemas and their materialized page trees.
//!
//! A [`MetaSchema`] pairs an immutable schema descriptor with a parallel
//! answer payload and materializes one [`Question`] per descriptor, page by
//! page. The schema shape never changes after construction; only the
//! questions' answer state does.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::question::{Question, QuestionData, QuestionDescriptor};
use crate::session::SessionContext;

/// Persisted answers, keyed by top-level question id.
pub type AnswerData = BTreeMap<String, QuestionData>;

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// A schema as fetched from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaParams {
    pub schema_name: String,
    pub schema_version: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub schema: SchemaDescriptor,
    pub id: String,
}

/// The raw descriptor: pages of question descriptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fulfills: Vec<String>,
    pub pages: Vec<PageDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDescriptor {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub questions: Vec<QuestionDescriptor>,
}

// ---------------------------------------------------------------------------
// Materialized pages
// ---------------------------------------------------------------------------

/// One wizard page: the descriptor's question list, materialized in order.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: String,
    pub title: Option<String>,
    pub questions: Vec<Question>,
}

impl Page {
    /// A page is complete when every question on it is complete.
    pub fn is_complete(&self) -> bool {
        self.questions.iter().all(Question::is_complete)
    }
}

/// An immutable versioned schema paired with its materialized question
/// tree.
#[derive(Debug, Clone)]
pub struct MetaSchema {
    name: String,
    version: i64,
    id: String,
    schema: SchemaDescriptor,
    pages: Vec<Page>,
}

impl MetaSchema {
    /// Materialize the page tree by merging each question descriptor with
    /// the matching slice of `data`, keyed by question id.
    pub fn new(params: SchemaParams, data: &AnswerData, ctx: &SessionContext) -> Self {
        let pages = params
            .schema
            .pages
            .iter()
            .map(|page| Page {
                id: page.id.clone(),
                title: page.title.clone(),
                questions: page
                    .questions
                    .iter()
                    .map(|desc| Question::from_descriptor(desc, data.get(&desc.qid), ctx))
                    .collect(),
            })
            .collect();

        Self {
            name: params.schema_name,
            version: params.schema_version,
            id: params.id,
            schema: params.schema,
            pages,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw descriptor the pages were materialized from.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    /// Every question across all pages, in pre-order: pages in order,
    /// questions in descriptor order, each parent immediately followed by
    /// its children (children in property-key order). Recomputed on every
    /// call; the schema is immutable so this is safe, just not cached.
    pub fn flat_questions(&self) -> Vec<&Question> {
        fn walk<'a>(question: &'a Question, out: &mut Vec<&'a Question>) {
            out.push(question);
            if let Some(properties) = question.properties() {
                for child in properties.values() {
                    walk(child, out);
                }
            }
        }

        let mut out = Vec::new();
        for page in &self.pages {
            for question in &page.questions {
                walk(question, &mut out);
            }
        }
        out
    }

    /// Find any question (top-level or nested) by id.
    pub fn find_question_mut(&mut self, qid: &str) -> Option<&mut Question> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.questions.iter_mut())
            .find_map(|question| question.find_mut(qid))
    }

    /// Serialize the tree back to the flat persisted payload, keyed by
    /// top-level question id. Nested questions ride along inside their
    /// parent's slice.
    pub fn to_answer_data(&self) -> AnswerData {
        self.pages
            .iter()
            .flat_map(|page| &page.questions)
            .map(|question| (question.id().to_string(), question.to_data()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
