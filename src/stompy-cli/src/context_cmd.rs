//! `context lock|recall|unlock|list|search|update|move`.

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use stompy_client::{
    ContextCreateRequest, ContextDetailResponse, ContextListQuery, ContextResponse,
    ContextUpdateRequest,
};

use crate::app::AppContext;

const PREVIEW_WIDTH: usize = 60;

/// Manage stored contexts.
#[derive(Debug, Parser)]
pub struct ContextCli {
    #[command(subcommand)]
    pub action: ContextAction,
}

#[derive(Debug, Subcommand)]
pub enum ContextAction {
    /// Store a new context
    Lock {
        topic: String,
        /// Content to store (use @file to read from file)
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Priority (always_check, important, reference)
        #[arg(long)]
        priority: Option<String>,
        /// Store even if similar content exists
        #[arg(long)]
        force: bool,
    },

    /// Retrieve a context
    Recall {
        topic: String,
        /// Specific version to retrieve
        #[arg(long)]
        version: Option<String>,
    },

    /// Delete a context
    Unlock {
        topic: String,
        /// Specific version to delete
        #[arg(long)]
        version: Option<String>,
        /// Delete even if the context is always_check
        #[arg(long)]
        force: bool,
        /// Skip archiving before deletion
        #[arg(long)]
        no_archive: bool,
    },

    /// List contexts
    List {
        /// Filter by priority
        #[arg(long)]
        priority: Option<String>,
        /// Filter by tags
        #[arg(long)]
        tags: Option<String>,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,
        /// Number of results to skip
        #[arg(long)]
        offset: Option<u32>,
    },

    /// Search contexts
    Search {
        query: String,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Update a context
    Update {
        topic: String,
        /// New content (use @file to read from file)
        #[arg(long)]
        content: Option<String>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
        /// New tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Move a context to another project
    Move {
        topic: String,
        /// Target project name
        #[arg(long)]
        to: Option<String>,
    },
}

impl ContextCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        let out = app.output();
        match self.action {
            ContextAction::Lock {
                topic,
                content,
                tags,
                priority,
                force,
            } => {
                let content = require_content(content)?;
                let (mut session, project) = app.project_session().await?;
                let req = ContextCreateRequest {
                    topic,
                    content,
                    priority: non_empty(priority),
                    tags: non_empty(tags),
                    force_store: force,
                };
                let resp = session.lock_context(&project, &req).await?;
                println!("Context locked: {} (version {})", resp.topic, resp.version);
            }
            ContextAction::Recall { topic, version } => {
                let (mut session, project) = app.project_session().await?;
                let resp = session
                    .get_context(&project, &topic, version.as_deref())
                    .await?;
                print!("{}", out.format_single(&recall_fields(resp)));
            }
            ContextAction::Unlock {
                topic,
                version,
                force,
                no_archive,
            } => {
                let (mut session, project) = app.project_session().await?;
                let resp = session
                    .unlock_context(&project, &topic, version.as_deref(), force, no_archive)
                    .await?;
                let suffix = if resp.archived { " (archived)" } else { "" };
                println!("Context unlocked: {}{suffix}", resp.topic);
            }
            ContextAction::List {
                priority,
                tags,
                limit,
                offset,
            } => {
                let (mut session, project) = app.project_session().await?;
                let query = ContextListQuery {
                    priority: non_empty(priority),
                    tags: non_empty(tags),
                    limit,
                    offset,
                };
                let resp = session.list_contexts(&project, &query).await?;
                let rows: Vec<Vec<String>> = resp.contexts.iter().map(list_row).collect();
                print!(
                    "{}",
                    out.format_table(
                        &["ID", "TOPIC", "VERSION", "PRIORITY", "TAGS", "ACCESS COUNT"],
                        &rows
                    )
                );
                if out.is_table() {
                    println!("\nTotal: {} contexts", resp.total);
                }
            }
            ContextAction::Search { query, limit } => {
                let (mut session, project) = app.project_session().await?;
                let resp = session.search_contexts(&project, &query, limit).await?;
                let rows: Vec<Vec<String>> = resp.contexts.iter().map(search_row).collect();
                print!(
                    "{}",
                    out.format_table(&["ID", "TOPIC", "PRIORITY", "PREVIEW"], &rows)
                );
                if out.is_table() {
                    println!("\nFound: {} contexts", resp.total);
                }
            }
            ContextAction::Update {
                topic,
                content,
                priority,
                tags,
            } => {
                let content = optional_content(content)?;
                let req = ContextUpdateRequest {
                    content,
                    priority: non_empty(priority),
                    tags: non_empty(tags),
                };
                if req.is_empty() {
                    bail!("nothing to update: pass --content, --priority or --tags");
                }
                let (mut session, project) = app.project_session().await?;
                let resp = session.update_context(&project, &topic, &req).await?;
                println!("Context updated: {} (version {})", resp.topic, resp.version);
            }
            ContextAction::Move { topic, to } => {
                let Some(target) = non_empty(to) else {
                    bail!("--to flag is required");
                };
                let (mut session, project) = app.project_session().await?;
                let resp = session.move_context(&project, &topic, &target).await?;
                println!(
                    "Context {:?} moved to project {:?}",
                    resp.topic, resp.target_project
                );
            }
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Content from `--content`, where `@path` reads a file.
fn content_from_flag(flag: &str) -> Result<String> {
    match flag.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading file {path:?}"))
        }
        None => Ok(flag.to_string()),
    }
}

/// Resolve content from the flag, else from `input` unless it is a terminal.
fn resolve_content(
    flag: Option<String>,
    input_is_terminal: bool,
    mut input: impl Read,
) -> Result<Option<String>> {
    if let Some(flag) = non_empty(flag) {
        return content_from_flag(&flag).map(Some);
    }
    if input_is_terminal {
        return Ok(None);
    }
    let mut buf = String::new();
    input
        .read_to_string(&mut buf)
        .context("reading content from stdin")?;
    Ok(Some(buf).filter(|s| !s.is_empty()))
}

fn optional_content(flag: Option<String>) -> Result<Option<String>> {
    let stdin = std::io::stdin();
    let is_terminal = stdin.is_terminal();
    resolve_content(flag, is_terminal, stdin.lock())
}

fn require_content(flag: Option<String>) -> Result<String> {
    match optional_content(flag)? {
        Some(content) => Ok(content),
        None => bail!("--content flag is required (or pipe content via stdin)"),
    }
}

fn recall_fields(resp: ContextDetailResponse) -> Vec<(&'static str, String)> {
    let ctx = resp.context;
    let mut fields = vec![
        ("Topic", ctx.topic),
        ("Version", ctx.version),
        ("Priority", ctx.priority),
    ];
    if !ctx.tags.is_empty() {
        fields.push(("Tags", ctx.tags.join(", ")));
    }
    fields.push(("Content", resp.content));
    fields
}

fn list_row(c: &ContextResponse) -> Vec<String> {
    vec![
        c.id.to_string(),
        c.topic.clone(),
        c.version.clone(),
        c.priority.clone(),
        c.tags.join(", "),
        c.access_count.to_string(),
    ]
}

fn search_row(c: &ContextResponse) -> Vec<String> {
    vec![
        c.id.to_string(),
        c.topic.clone(),
        c.priority.clone(),
        preview(c.preview.as_deref().unwrap_or_default()),
    ]
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_WIDTH {
        let head: String = text.chars().take(PREVIEW_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn context(tags: Vec<String>, preview: Option<String>) -> ContextResponse {
        ContextResponse {
            id: 7,
            topic: "api-design".into(),
            version: "1.2".into(),
            priority: "important".into(),
            tags,
            preview,
            key_concepts: None,
            content_hash: None,
            locked_at: None,
            last_accessed: None,
            access_count: 42,
        }
    }

    #[test]
    fn test_content_flag_wins_over_input() {
        let got = resolve_content(Some("inline".into()), false, Cursor::new("piped")).unwrap();
        assert_eq!(got.as_deref(), Some("inline"));
    }

    #[test]
    fn test_content_from_file_reference() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.md");
        std::fs::write(&file, "# Notes\nbody").unwrap();

        let flag = format!("@{}", file.display());
        let got = resolve_content(Some(flag), true, Cursor::new("")).unwrap();
        assert_eq!(got.as_deref(), Some("# Notes\nbody"));
    }

    #[test]
    fn test_missing_file_reference_errors() {
        let err = resolve_content(Some("@/no/such/file.md".into()), true, Cursor::new(""))
            .unwrap_err();
        assert!(format!("{err:#}").contains("reading file \"/no/such/file.md\""));
    }

    #[test]
    fn test_piped_input_used_when_no_flag() {
        let got = resolve_content(None, false, Cursor::new("from pipe")).unwrap();
        assert_eq!(got.as_deref(), Some("from pipe"));
    }

    #[test]
    fn test_terminal_input_is_not_read() {
        let got = resolve_content(None, true, Cursor::new("ignored")).unwrap();
        assert_eq!(got, None);

        let empty = resolve_content(None, false, Cursor::new("")).unwrap();
        assert_eq!(empty, None);
    }

    #[test]
    fn test_recall_fields_skip_empty_tags() {
        let detail = ContextDetailResponse {
            context: context(vec![], None),
            content: "body".into(),
            versions: vec![],
        };
        let keys: Vec<&str> = recall_fields(detail).iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["Topic", "Version", "Priority", "Content"]);

        let detail = ContextDetailResponse {
            context: context(vec!["a".into(), "b".into()], None),
            content: "body".into(),
            versions: vec![],
        };
        let fields = recall_fields(detail);
        assert_eq!(fields[3], ("Tags", "a, b".to_string()));
    }

    #[test]
    fn test_list_row() {
        let row = list_row(&context(vec!["x".into(), "y".into()], None));
        assert_eq!(row, vec!["7", "api-design", "1.2", "important", "x, y", "42"]);
    }

    #[test]
    fn test_preview_truncation() {
        assert_eq!(preview("short"), "short");
        let exact = "a".repeat(60);
        assert_eq!(preview(&exact), exact);

        let long = "b".repeat(61);
        let got = preview(&long);
        assert_eq!(got.chars().count(), 60);
        assert!(got.ends_with("..."));
    }

    #[test]
    fn test_search_row_without_preview() {
        let row = search_row(&context(vec![], None));
        assert_eq!(row[3], "");
    }
}
