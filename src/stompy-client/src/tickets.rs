//! Ticket endpoints (`/projects/{project}/tickets`).
//!
//! Timestamps on tickets are Unix seconds as floats, passed through as-is.

use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::session::{Session, segment};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketCreate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Partial update; unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TicketUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.tags.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketHistory {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLink {
    pub id: i64,
    pub source_id: i64,
    pub target_id: i64,
    pub link_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketResponse {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub status: String,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<TicketHistory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<TicketLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketListResponse {
    #[serde(default)]
    pub tickets: Vec<TicketResponse>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketSearchResponse {
    #[serde(rename = "tickets", default)]
    pub results: Vec<TicketResponse>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub status: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub tickets: Vec<TicketResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(default)]
    pub columns: Vec<BoardColumn>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCreate {
    pub target_id: i64,
    pub link_type: String,
}

#[derive(Serialize)]
struct TransitionRequest<'a> {
    status: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketListQuery {
    pub status: Option<String>,
    pub ticket_type: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketSearchQuery {
    pub query: String,
    pub ticket_type: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub view: Option<String>,
    pub ticket_type: Option<String>,
    pub status: Option<String>,
}

/// Builds a query string, dropping empty values and non-positive numbers.
#[derive(Default)]
struct Params(Vec<(&'static str, String)>);

impl Params {
    fn text(mut self, key: &'static str, value: &Option<String>) -> Self {
        if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
            self.0.push((key, v.clone()));
        }
        self
    }

    fn number(mut self, key: &'static str, value: Option<u32>) -> Self {
        if let Some(v) = value.filter(|v| *v > 0) {
            self.0.push((key, v.to_string()));
        }
        self
    }
}

impl TicketListQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        Params::default()
            .text("status", &self.status)
            .text("type", &self.ticket_type)
            .text("priority", &self.priority)
            .number("limit", self.limit)
            .number("offset", self.offset)
            .0
    }
}

impl TicketSearchQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Params(vec![("query", self.query.clone())])
            .text("type", &self.ticket_type)
            .text("status", &self.status);
        params = params.number("limit", self.limit);
        params.0
    }
}

impl BoardQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        Params::default()
            .text("view", &self.view)
            .text("type", &self.ticket_type)
            .text("status", &self.status)
            .0
    }
}

fn tickets_path(project: &str) -> String {
    format!("/projects/{}/tickets", segment(project))
}

fn ticket_path(project: &str, id: i64) -> String {
    format!("{}/{id}", tickets_path(project))
}

impl Session {
    pub async fn list_tickets(
        &mut self,
        project: &str,
        query: &TicketListQuery,
    ) -> ClientResult<TicketListResponse> {
        self.get(&tickets_path(project), &query.to_pairs()).await
    }

    pub async fn get_ticket(&mut self, project: &str, id: i64) -> ClientResult<TicketResponse> {
        self.get(&ticket_path(project, id), &[]).await
    }

    pub async fn create_ticket(
        &mut self,
        project: &str,
        req: &TicketCreate,
    ) -> ClientResult<TicketResponse> {
        self.post(&tickets_path(project), req).await
    }

    pub async fn update_ticket(
        &mut self,
        project: &str,
        id: i64,
        req: &TicketUpdate,
    ) -> ClientResult<TicketResponse> {
        self.put(&ticket_path(project, id), req).await
    }

    /// Move a ticket to another workflow status.
    pub async fn transition_ticket(
        &mut self,
        project: &str,
        id: i64,
        status: &str,
    ) -> ClientResult<TicketResponse> {
        let path = format!("{}/move", ticket_path(project, id));
        self.post(&path, &TransitionRequest { status }).await
    }

    pub async fn search_tickets(
        &mut self,
        project: &str,
        query: &TicketSearchQuery,
    ) -> ClientResult<TicketSearchResponse> {
        let path = format!("{}/search", tickets_path(project));
        self.get(&path, &query.to_pairs()).await
    }

    pub async fn board(&mut self, project: &str, query: &BoardQuery) -> ClientResult<BoardView> {
        let path = format!("{}/board", tickets_path(project));
        self.get(&path, &query.to_pairs()).await
    }

    pub async fn add_link(
        &mut self,
        project: &str,
        ticket_id: i64,
        req: &LinkCreate,
    ) -> ClientResult<TicketLink> {
        let path = format!("{}/links", ticket_path(project, ticket_id));
        self.post(&path, req).await
    }

    pub async fn list_links(&mut self, project: &str, ticket_id: i64) -> ClientResult<Vec<TicketLink>> {
        let path = format!("{}/links", ticket_path(project, ticket_id));
        self.get(&path, &[]).await
    }

    pub async fn remove_link(&mut self, project: &str, ticket_id: i64, link_id: i64) -> ClientResult<()> {
        let path = format!("{}/links/{link_id}", ticket_path(project, ticket_id));
        self.delete(&path, &[]).await
    }
}
