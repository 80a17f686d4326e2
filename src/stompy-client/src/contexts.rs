//! Context endpoints (`/projects/{project}/contexts`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::session::{Session, segment};

/// Body of a context lock. Tags are comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextCreateRequest {
    pub topic: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force_store: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl ContextUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.priority.is_none() && self.tags.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextResponse {
    pub id: i64,
    pub topic: String,
    pub version: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_concepts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A context with its full content and version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDetailResponse {
    #[serde(flatten)]
    pub context: ContextResponse,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<VersionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextCreateResponse {
    pub status: String,
    pub topic: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDeleteResponse {
    pub status: String,
    pub topic: String,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMoveResponse {
    pub status: String,
    pub topic: String,
    pub target_project: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextListResponse {
    #[serde(default)]
    pub contexts: Vec<ContextResponse>,
    #[serde(default)]
    pub total: u64,
}

/// Filters for listing contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextListQuery {
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ContextListQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(p) = self.priority.as_ref().filter(|p| !p.is_empty()) {
            q.push(("priority", p.clone()));
        }
        if let Some(t) = self.tags.as_ref().filter(|t| !t.is_empty()) {
            q.push(("tags", t.clone()));
        }
        if let Some(l) = self.limit.filter(|l| *l > 0) {
            q.push(("limit", l.to_string()));
        }
        if let Some(o) = self.offset.filter(|o| *o > 0) {
            q.push(("offset", o.to_string()));
        }
        q
    }
}

fn contexts_path(project: &str) -> String {
    format!("/projects/{}/contexts", segment(project))
}

fn context_path(project: &str, topic: &str) -> String {
    format!("{}/{}", contexts_path(project), segment(topic))
}

impl Session {
    pub async fn list_contexts(
        &mut self,
        project: &str,
        query: &ContextListQuery,
    ) -> ClientResult<ContextListResponse> {
        self.get(&contexts_path(project), &query.to_pairs()).await
    }

    /// Fetch a context; `version` selects an older revision.
    pub async fn get_context(
        &mut self,
        project: &str,
        topic: &str,
        version: Option<&str>,
    ) -> ClientResult<ContextDetailResponse> {
        let query: Vec<(&str, String)> = version
            .filter(|v| !v.is_empty())
            .map(|v| vec![("version", v.to_string())])
            .unwrap_or_default();
        self.get(&context_path(project, topic), &query).await
    }

    pub async fn lock_context(
        &mut self,
        project: &str,
        req: &ContextCreateRequest,
    ) -> ClientResult<ContextCreateResponse> {
        self.post(&contexts_path(project), req).await
    }

    /// Delete a context. Servers may answer 204, in which case a synthetic
    /// response is returned.
    pub async fn unlock_context(
        &mut self,
        project: &str,
        topic: &str,
        version: Option<&str>,
        force: bool,
        no_archive: bool,
    ) -> ClientResult<ContextDeleteResponse> {
        let mut query = Vec::new();
        if let Some(v) = version.filter(|v| !v.is_empty()) {
            query.push(("version", v.to_string()));
        }
        if force {
            query.push(("force", "true".to_string()));
        }
        if no_archive {
            query.push(("no_archive", "true".to_string()));
        }

        let resp = self
            .delete_with_result(&context_path(project, topic), &query)
            .await?;
        Ok(resp.unwrap_or_else(|| ContextDeleteResponse {
            status: "deleted".to_string(),
            topic: topic.to_string(),
            archived: !no_archive,
        }))
    }

    pub async fn update_context(
        &mut self,
        project: &str,
        topic: &str,
        req: &ContextUpdateRequest,
    ) -> ClientResult<ContextResponse> {
        self.put(&context_path(project, topic), req).await
    }

    pub async fn search_contexts(
        &mut self,
        project: &str,
        search: &str,
        limit: Option<u32>,
    ) -> ClientResult<ContextListResponse> {
        let mut query = vec![("search", search.to_string())];
        if let Some(l) = limit.filter(|l| *l > 0) {
            query.push(("limit", l.to_string()));
        }
        self.get(&contexts_path(project), &query).await
    }

    pub async fn move_context(
        &mut self,
        project: &str,
        topic: &str,
        target_project: &str,
    ) -> ClientResult<ContextMoveResponse> {
        let path = format!("{}/move", context_path(project, topic));
        let body = serde_json::json!({ "target_project": target_project });
        self.post(&path, &body).await
    }
}
