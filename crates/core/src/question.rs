//! A single form question merged with its answer state.
//!
//! A question is either scalar (it holds the answer value directly) or
//! composite (it owns a mapping of named sub-questions, one level of which
//! is enough for the registration domain). Completeness and validity are
//! derived on read; nothing here is reactive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::comment::{Comment, CommentData};
use crate::session::SessionContext;

// ---------------------------------------------------------------------------
// Question type
// ---------------------------------------------------------------------------

/// The fixed set of question types the wizard renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    String,
    Number,
    Choose,
    Object,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Choose => "choose",
            Self::Object => "object",
        }
    }

    /// Object-typed questions own sub-questions instead of a value.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object)
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// Schema-supplied description of one question.
///
/// Nested descriptors (under `properties`) may omit `qid`; the property key
/// then becomes the child question's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDescriptor {
    #[serde(default)]
    pub qid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub nav: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, QuestionDescriptor>,
}

/// Persisted answer slice for one question: the value plus its comments.
///
/// For a composite question `value` is an object keyed by property name
/// whose entries are the child `{value, comments}` slices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionData {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CommentData>,
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// Scalar questions carry the answer; composite questions carry children.
#[derive(Debug, Clone)]
enum QuestionKind {
    Scalar {
        value: serde_json::Value,
        options: Vec<String>,
    },
    Composite {
        properties: BTreeMap<String, Question>,
    },
}

/// One form field definition merged with its answer state.
#[derive(Debug, Clone)]
pub struct Question {
    id: String,
    title: Option<String>,
    nav: Option<String>,
    question_type: QuestionType,
    format: Option<String>,
    description: Option<String>,
    help: Option<String>,
    required: bool,
    kind: QuestionKind,
    comments: Vec<Comment>,
    next_comment: String,
    show_example: bool,
}

/// Whether a JSON answer counts as filled (non-null, non-blank string,
/// non-empty array).
fn value_filled(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        _ => true,
    }
}

impl Question {
    /// Materialize a question from its schema descriptor and the matching
    /// slice of persisted answer data, if any.
    ///
    /// Children of a composite question are built first; the composite's
    /// effective `required` is its declared flag OR any child's.
    pub fn from_descriptor(
        desc: &QuestionDescriptor,
        data: Option<&QuestionData>,
        ctx: &SessionContext,
    ) -> Self {
        Self::build(desc.qid.clone(), desc, data, ctx)
    }

    fn from_property(
        key: &str,
        desc: &QuestionDescriptor,
        data: Option<&QuestionData>,
        ctx: &SessionContext,
    ) -> Self {
        let id = if desc.qid.is_empty() {
            key.to_string()
        } else {
            desc.qid.clone()
        };
        Self::build(id, desc, data, ctx)
    }

    fn build(
        id: String,
        desc: &QuestionDescriptor,
        data: Option<&QuestionData>,
        ctx: &SessionContext,
    ) -> Self {
        let kind = if desc.question_type.is_composite() {
            let properties = desc
                .properties
                .iter()
                .map(|(key, child_desc)| {
                    let slice = child_slice(data, key);
                    let child = Question::from_property(key, child_desc, slice.as_ref(), ctx);
                    (key.clone(), child)
                })
                .collect();
            QuestionKind::Composite { properties }
        } else {
            QuestionKind::Scalar {
                value: data.map(|d| d.value.clone()).unwrap_or_default(),
                options: desc.options.clone(),
            }
        };

        let required = match &kind {
            QuestionKind::Composite { properties } => {
                desc.required || properties.values().any(|child| child.required())
            }
            QuestionKind::Scalar { .. } => desc.required,
        };

        let comments = data
            .map(|d| {
                d.comments
                    .iter()
                    .map(|c| Comment::from_data(c.clone(), ctx))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            title: desc.title.clone(),
            nav: desc.nav.clone(),
            question_type: desc.question_type,
            format: desc.format.clone(),
            description: desc.description.clone(),
            help: desc.help.clone(),
            required,
            kind,
            comments,
            next_comment: String::new(),
            show_example: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn nav(&self) -> Option<&str> {
        self.nav.as_deref()
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Effective required flag (declared OR inherited from any child).
    pub fn required(&self) -> bool {
        self.required
    }

    /// Ordered choice list; empty for composite questions.
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::Scalar { options, .. } => options,
            QuestionKind::Composite { .. } => &[],
        }
    }

    /// Sub-questions, keyed by property name. `None` for scalar questions.
    pub fn properties(&self) -> Option<&BTreeMap<String, Question>> {
        match &self.kind {
            QuestionKind::Composite { properties } => Some(properties),
            QuestionKind::Scalar { .. } => None,
        }
    }

    /// The current answer. For a composite question this is the assembled
    /// object of child answers, keyed by property name.
    pub fn value(&self) -> serde_json::Value {
        match &self.kind {
            QuestionKind::Scalar { value, .. } => value.clone(),
            QuestionKind::Composite { properties } => {
                let map: serde_json::Map<String, serde_json::Value> = properties
                    .iter()
                    .map(|(key, child)| (key.clone(), child.value()))
                    .collect();
                serde_json::Value::Object(map)
            }
        }
    }

    /// Overwrite the answer. Composite questions hold no scalar value of
    /// their own, so this is a no-op for them; write through the children
    /// instead.
    pub fn set_value(&mut self, value: serde_json::Value) {
        if let QuestionKind::Scalar { value: slot, .. } = &mut self.kind {
            *slot = value;
        }
    }

    /// Whether the question has been answered.
    ///
    /// Scalar: the value is filled. Composite: every required child is
    /// complete (a composite with no required children counts as complete).
    pub fn is_complete(&self) -> bool {
        match &self.kind {
            QuestionKind::Scalar { value, .. } => value_filled(value),
            QuestionKind::Composite { properties } => properties
                .values()
                .filter(|child| child.required())
                .all(|child| child.is_complete()),
        }
    }

    /// Scalar: required implies filled. Composite: all children are valid.
    pub fn is_valid(&self) -> bool {
        match &self.kind {
            QuestionKind::Scalar { value, .. } => !self.required || value_filled(value),
            QuestionKind::Composite { properties } => {
                properties.values().all(|child| child.is_valid())
            }
        }
    }

    /// Find this question or one of its descendants by id.
    pub fn find_mut(&mut self, qid: &str) -> Option<&mut Question> {
        if self.id == qid {
            return Some(self);
        }
        match &mut self.kind {
            QuestionKind::Composite { properties } => properties
                .values_mut()
                .find_map(|child| child.find_mut(qid)),
            QuestionKind::Scalar { .. } => None,
        }
    }

    // -- comments ----------------------------------------------------------

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut [Comment] {
        &mut self.comments
    }

    /// Scratch text for the comment being drafted.
    pub fn next_comment(&self) -> &str {
        &self.next_comment
    }

    pub fn set_next_comment(&mut self, text: impl Into<String>) {
        self.next_comment = text.into();
    }

    /// Whether the drafted comment may be submitted (non-blank after
    /// trimming).
    pub fn allow_add_next(&self) -> bool {
        !self.next_comment.trim().is_empty()
    }

    /// Turn the drafted text into a new [`Comment`], clear the scratch
    /// field, then invoke `save` exactly once. Persistence is the caller's
    /// concern.
    pub fn add_comment(&mut self, ctx: &SessionContext, save: impl FnOnce()) {
        let comment = Comment::from_data(
            CommentData {
                value: Some(self.next_comment.clone()),
                ..CommentData::default()
            },
            ctx,
        );
        self.comments.push(comment);
        self.next_comment.clear();
        save();
    }

    pub fn show_example(&self) -> bool {
        self.show_example
    }

    pub fn toggle_example(&mut self) {
        self.show_example = !self.show_example;
    }

    // -- serialization -----------------------------------------------------

    /// Serialize the question (and, recursively, its children) back to the
    /// persisted `{value, comments}` slice.
    pub fn to_data(&self) -> QuestionData {
        let value = match &self.kind {
            QuestionKind::Scalar { value, .. } => value.clone(),
            QuestionKind::Composite { properties } => {
                let map: serde_json::Map<String, serde_json::Value> = properties
                    .iter()
                    .map(|(key, child)| {
                        let slice = serde_json::to_value(child.to_data())
                            .unwrap_or(serde_json::Value::Null);
                        (key.clone(), slice)
                    })
                    .collect();
                serde_json::Value::Object(map)
            }
        };
        QuestionData {
            value,
            comments: self.comments.iter().map(Comment::to_data).collect(),
        }
    }
}

/// Pull the child `{value, comments}` slice for `key` out of a composite
/// question's data.
fn child_slice(data: Option<&QuestionData>, key: &str) -> Option<QuestionData> {
    data.and_then(|d| d.value.get(key))
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
