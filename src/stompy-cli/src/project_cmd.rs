//! `project create|list|info|delete|use`.

use anyhow::{Result, bail};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use stompy_client::{ProjectCreate, ProjectResponse, ProjectStats};
use stompy_update::format_size;

use crate::app::AppContext;

/// Manage projects.
#[derive(Debug, Parser)]
pub struct ProjectCli {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        name: String,
        /// Project description
        #[arg(long)]
        description: Option<String>,
    },

    /// List all projects
    List {
        /// Include project statistics
        #[arg(long)]
        stats: bool,
    },

    /// Show project details
    Info {
        name: String,
        /// Include project statistics
        #[arg(long)]
        stats: bool,
    },

    /// Delete a project
    Delete {
        name: String,
        /// Confirm deletion (required)
        #[arg(long)]
        confirm: bool,
    },

    /// Set the default project
    Use { name: String },
}

impl ProjectCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        let out = app.output();
        match self.action {
            ProjectAction::Create { name, description } => {
                let mut session = app.session().await?;
                let req = ProjectCreate {
                    name,
                    description: description.filter(|d| !d.is_empty()),
                };
                let resp = session.create_project(&req).await?;
                print!(
                    "{}",
                    out.format_single(&[
                        ("Name", resp.name),
                        ("Schema", resp.schema_name),
                        ("Created", local_datetime(&resp.created_at)),
                    ])
                );
            }
            ProjectAction::List { stats } => {
                let mut session = app.session().await?;
                let resp = session.list_projects(stats).await?;

                let mut headers = vec!["NAME", "SCHEMA", "CREATED", "ROLE"];
                if stats {
                    headers.extend(["CONTEXTS", "SESSIONS", "FILES"]);
                }
                let rows: Vec<Vec<String>> =
                    resp.projects.iter().map(|p| list_row(p, stats)).collect();

                print!("{}", out.format_table(&headers, &rows));
                if out.is_table() {
                    println!("\nTotal: {} projects", resp.total);
                }
            }
            ProjectAction::Info { name, stats } => {
                let mut session = app.session().await?;
                let resp = session.get_project(&name, stats).await?;
                print!("{}", out.format_single(&info_fields(&resp, stats)));
            }
            ProjectAction::Delete { name, confirm } => {
                if !confirm {
                    bail!("must pass --confirm to delete project {name:?}");
                }
                let mut session = app.session().await?;
                session.delete_project(&name).await?;
                println!("Project {name:?} deleted.");
            }
            ProjectAction::Use { name } => {
                app.config.set_value("default_project", &name)?;
                println!("Default project set to {name:?}");
            }
        }
        Ok(())
    }
}

fn local_datetime(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn list_row(p: &ProjectResponse, stats: bool) -> Vec<String> {
    let mut row = vec![
        p.name.clone(),
        p.schema_name.clone(),
        p.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        p.role.clone(),
    ];
    if stats && let Some(s) = &p.stats {
        row.extend([
            s.context_count.to_string(),
            s.session_count.to_string(),
            s.file_count.to_string(),
        ]);
    }
    row
}

fn info_fields(p: &ProjectResponse, stats: bool) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Name", p.name.clone()),
        ("Schema", p.schema_name.clone()),
        ("Created", local_datetime(&p.created_at)),
        ("Role", p.role.clone()),
        ("System", p.is_system.to_string()),
    ];
    if let Some(desc) = &p.description {
        fields.push(("Description", desc.clone()));
    }
    if stats && let Some(s) = &p.stats {
        fields.extend(stats_fields(s));
    }
    fields
}

fn stats_fields(s: &ProjectStats) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Contexts", s.context_count.to_string()),
        ("Sessions", s.session_count.to_string()),
        ("Files", s.file_count.to_string()),
        ("DB Storage", format_size(s.storage_bytes_db)),
        ("S3 Storage", format_size(s.storage_bytes_s3)),
    ];
    if let Some(t) = &s.last_activity {
        fields.push(("Last Activity", local_datetime(t)));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project(stats: Option<ProjectStats>) -> ProjectResponse {
        ProjectResponse {
            name: "alpha".into(),
            schema_name: "proj_alpha".into(),
            created_at: Utc::now(),
            role: "owner".into(),
            is_system: false,
            description: Some("first".into()),
            stats,
        }
    }

    #[test]
    fn test_list_row_with_and_without_stats() {
        let p = project(Some(ProjectStats {
            context_count: 12,
            session_count: 3,
            file_count: 1,
            ..Default::default()
        }));
        assert_eq!(list_row(&p, false).len(), 4);
        let row = list_row(&p, true);
        assert_eq!(&row[4..], &["12", "3", "1"]);

        // Stats requested but not returned: no extra cells
        assert_eq!(list_row(&project(None), true).len(), 4);
    }

    #[test]
    fn test_info_fields_with_stats() {
        let p = project(Some(ProjectStats {
            storage_bytes_db: 2048,
            storage_bytes_s3: 5 * 1024 * 1024,
            ..Default::default()
        }));
        let fields = info_fields(&p, true);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "Name", "Schema", "Created", "Role", "System", "Description", "Contexts",
                "Sessions", "Files", "DB Storage", "S3 Storage"
            ]
        );
        assert_eq!(fields[4].1, "false");
        assert_eq!(fields[9].1, "2.0 KB");
        assert_eq!(fields[10].1, "5.0 MB");
    }

    #[test]
    fn test_info_fields_without_stats() {
        let fields = info_fields(&project(None), false);
        assert_eq!(fields.len(), 6);
    }
}
