//! Shared types for scribe
//!
//! This crate provides the types shared between the sync engine, the HTTP
//! client and the CLI: post identifiers, the locally edited document, save
//! status and the wire payloads of the posts/AI API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Post identifier assigned by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        PostId(id.to_string())
    }
}

/// The document being edited locally.
///
/// `snapshot` is the editing surface's serialized state and is never
/// interpreted here. `snapshot` and `plain_text` always change together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Option<PostId>,
    pub title: String,
    pub snapshot: Option<Value>,
    pub plain_text: String,
}

impl Document {
    pub fn has_content(&self) -> bool {
        !self.plain_text.trim().is_empty()
    }
}

impl From<Post> for Document {
    fn from(post: Post) -> Self {
        Self {
            id: Some(post.id),
            title: post.title,
            snapshot: post.lexical_state,
            plain_text: post.plain_text,
        }
    }
}

/// User-visible save feedback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    /// Edited locally, save not started yet
    Pending,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Pending => "pending",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI actions the generation endpoint understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamAction {
    Summarize,
    FixGrammar,
}

impl StreamAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamAction::Summarize => "summarize",
            StreamAction::FixGrammar => "fix_grammar",
        }
    }
}

impl fmt::Display for StreamAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity returned when a draft is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftHandle {
    pub id: PostId,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

/// Full post as returned on create, get and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: PostId,
    pub title: String,
    #[serde(default)]
    pub lexical_state: Option<Value>,
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight listing entry; omits the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub id: PostId,
    pub title: String,
    pub status: PostStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCreate {
    pub title: String,
}

/// Partial update. Every save sends the full current state, so in practice
/// all three fields are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_state: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
}

impl PostUpdate {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            title: Some(doc.title.clone()),
            lexical_state: doc.snapshot.clone(),
            plain_text: Some(doc.plain_text.clone()),
        }
    }
}

/// Body of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    pub action: StreamAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_uses_underscore_id_on_the_wire() {
        let post: Post = serde_json::from_value(json!({
            "_id": "65f0c0ffee",
            "title": "Untitled",
            "lexical_state": null,
            "plain_text": "",
            "status": "draft",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(post.id, PostId::new("65f0c0ffee"));
        assert_eq!(post.status, PostStatus::Draft);

        let doc = Document::from(post);
        assert_eq!(doc.id.as_ref().map(PostId::as_str), Some("65f0c0ffee"));
        assert!(!doc.has_content());
    }

    #[test]
    fn update_omits_missing_fields() {
        let update = PostUpdate {
            title: Some("Hello".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "title": "Hello" }));
    }

    #[test]
    fn generate_request_uses_snake_case_actions() {
        let req = GenerateRequest {
            text: "teh cat".into(),
            action: StreamAction::FixGrammar,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "text": "teh cat", "action": "fix_grammar" })
        );
        assert_eq!(StreamAction::FixGrammar.to_string(), "fix_grammar");
        assert_eq!(
            serde_json::from_value::<StreamAction>(json!("summarize")).unwrap(),
            StreamAction::Summarize
        );
        assert!(serde_json::from_value::<StreamAction>(json!("translate")).is_err());
    }
}
