//! Project endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::session::{Session, segment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    #[serde(default)]
    pub context_count: u64,
    #[serde(default)]
    pub session_count: u64,
    #[serde(default)]
    pub file_count: u64,
    #[serde(default)]
    pub storage_bytes_db: u64,
    #[serde(default)]
    pub storage_bytes_s3: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub name: String,
    #[serde(default)]
    pub schema_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ProjectStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectListResponse {
    #[serde(default)]
    pub projects: Vec<ProjectResponse>,
    #[serde(default)]
    pub total: u64,
}

fn stats_query(with_stats: bool) -> Vec<(&'static str, String)> {
    if with_stats {
        vec![("stats", "true".to_string())]
    } else {
        Vec::new()
    }
}

impl Session {
    pub async fn list_projects(&mut self, with_stats: bool) -> ClientResult<ProjectListResponse> {
        self.get("/projects", &stats_query(with_stats)).await
    }

    pub async fn get_project(&mut self, name: &str, with_stats: bool) -> ClientResult<ProjectResponse> {
        let path = format!("/projects/{}", segment(name));
        self.get(&path, &stats_query(with_stats)).await
    }

    pub async fn create_project(&mut self, req: &ProjectCreate) -> ClientResult<ProjectResponse> {
        self.post("/projects", req).await
    }

    pub async fn delete_project(&mut self, name: &str) -> ClientResult<()> {
        let path = format!("/projects/{}", segment(name));
        self.delete(&path, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "schema_name": format!("proj_{name}"),
            "created_at": "2025-01-15T10:30:00Z",
            "role": "owner",
            "is_system": false
        })
    }

    fn session(server: &MockServer) -> Session {
        Session::new(&server.uri(), Some("key".into()), "1.0.0")
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_retries: 0,
                base_delay: std::time::Duration::ZERO,
            })
    }

    #[tokio::test]
    async fn test_list_projects_with_stats() {
        let server = MockServer::start().await;
        let mut body = project_json("alpha");
        body["stats"] = serde_json::json!({
            "context_count": 12,
            "session_count": 3,
            "file_count": 1,
            "storage_bytes_db": 2048,
            "storage_bytes_s3": 0
        });
        Mock::given(method("GET"))
            .and(path("/projects"))
            .and(query_param("stats", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"projects": [body], "total": 1})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let list = session(&server).list_projects(true).await.unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.projects[0].name, "alpha");
        assert_eq!(list.projects[0].stats.as_ref().unwrap().context_count, 12);
    }

    #[tokio::test]
    async fn test_get_project_escapes_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/my%20project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_json("my project")))
            .expect(1)
            .mount(&server)
            .await;

        let project = session(&server).get_project("my project", false).await.unwrap();
        assert_eq!(project.name, "my project");
        assert_eq!(project.role, "owner");
    }

    #[tokio::test]
    async fn test_create_project_omits_empty_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects"))
            .and(body_json(serde_json::json!({"name": "beta"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(project_json("beta")))
            .expect(1)
            .mount(&server)
            .await;

        let req = ProjectCreate {
            name: "beta".into(),
            description: None,
        };
        let created = session(&server).create_project(&req).await.unwrap();
        assert_eq!(created.schema_name, "proj_beta");
    }

    #[tokio::test]
    async fn test_delete_project() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/projects/old"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        session(&server).delete_project("old").await.unwrap();
    }
}
