//! `ticket` commands: CRUD, workflow moves, board, search and links.

use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use stompy_client::{
    BoardQuery, BoardView, LinkCreate, TicketCreate, TicketLink, TicketListQuery, TicketResponse,
    TicketSearchQuery, TicketUpdate,
};

use crate::app::AppContext;

const TITLE_WIDTH: usize = 50;

/// Manage tickets.
#[derive(Debug, Parser)]
pub struct TicketCli {
    #[command(subcommand)]
    pub action: TicketAction,
}

#[derive(Debug, Subcommand)]
pub enum TicketAction {
    /// Create a new ticket
    Create {
        /// Ticket title (required)
        #[arg(long)]
        title: Option<String>,
        /// Ticket description
        #[arg(long)]
        description: Option<String>,
        /// Ticket type: task, bug, feature, decision
        #[arg(long = "type", default_value = "task")]
        ticket_type: String,
        /// Priority: critical, high, medium, low
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Assignee
        #[arg(long)]
        assignee: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Show ticket details
    Get { id: String },

    /// Update a ticket
    Update {
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
        /// New assignee
        #[arg(long)]
        assignee: Option<String>,
        /// New comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Transition a ticket to a new status
    Move {
        id: String,
        /// Target status (required)
        #[arg(long)]
        status: Option<String>,
    },

    /// Close a ticket with its type's terminal status
    Close { id: String },

    /// List tickets
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Filter by type
        #[arg(long = "type")]
        ticket_type: Option<String>,
        /// Filter by priority
        #[arg(long)]
        priority: Option<String>,
        /// Limit results
        #[arg(long)]
        limit: Option<u32>,
        /// Offset for pagination
        #[arg(long)]
        offset: Option<u32>,
    },

    /// Show tickets grouped by status
    Board {
        /// Board view: kanban, summary
        #[arg(long, default_value = "summary")]
        view: String,
        /// Filter by type
        #[arg(long = "type")]
        ticket_type: Option<String>,
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
    },

    /// Search tickets
    Search {
        query: String,
        /// Filter by type
        #[arg(long = "type")]
        ticket_type: Option<String>,
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Limit results
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Manage ticket links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum LinkAction {
    /// Link a ticket to another
    Add {
        ticket_id: String,
        /// Target ticket ID (required)
        #[arg(long)]
        target: Option<i64>,
        /// Link type: blocks, parent, related, duplicate (required)
        #[arg(long = "type")]
        link_type: Option<String>,
    },

    /// List a ticket's links
    List { ticket_id: String },

    /// Remove a link
    Remove { ticket_id: String, link_id: String },
}

impl TicketCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        let out = app.output();
        match self.action {
            TicketAction::Create {
                title,
                description,
                ticket_type,
                priority,
                assignee,
                tags,
            } => {
                let Some(title) = non_empty(title) else {
                    bail!("--title is required");
                };
                let req = TicketCreate {
                    title,
                    description: non_empty(description),
                    ticket_type,
                    priority,
                    assignee: non_empty(assignee),
                    tags: split_tags(tags.as_deref().unwrap_or_default()),
                    metadata: Default::default(),
                };
                let (mut session, project) = app.project_session().await?;
                let resp = session.create_ticket(&project, &req).await?;
                println!("Ticket #{} created: {}", resp.id, resp.title);
            }
            TicketAction::Get { id } => {
                let id = parse_ticket_id(&id)?;
                let (mut session, project) = app.project_session().await?;
                let resp = session.get_ticket(&project, id).await?;
                print!("{}", out.format_single(&ticket_fields(&resp)));
            }
            TicketAction::Update {
                id,
                title,
                description,
                priority,
                assignee,
                tags,
            } => {
                let id = parse_ticket_id(&id)?;
                let req = TicketUpdate {
                    title,
                    description,
                    priority,
                    assignee,
                    tags: tags.as_deref().map(split_tags).unwrap_or_default(),
                };
                let (mut session, project) = app.project_session().await?;
                let resp = session.update_ticket(&project, id, &req).await?;
                println!("Ticket #{} updated: {}", resp.id, resp.title);
            }
            TicketAction::Move { id, status } => {
                let id = parse_ticket_id(&id)?;
                let Some(status) = non_empty(status) else {
                    bail!("--status is required");
                };
                let (mut session, project) = app.project_session().await?;
                let resp = session.transition_ticket(&project, id, &status).await?;
                println!("Ticket #{} moved to {:?}", resp.id, resp.status);
            }
            TicketAction::Close { id } => {
                let id = parse_ticket_id(&id)?;
                let (mut session, project) = app.project_session().await?;
                let ticket = session.get_ticket(&project, id).await?;
                let target = close_status(&ticket.ticket_type);
                let resp = session.transition_ticket(&project, id, target).await?;
                println!(
                    "Ticket #{} closed ({} -> {})",
                    resp.id, ticket.status, resp.status
                );
            }
            TicketAction::List {
                status,
                ticket_type,
                priority,
                limit,
                offset,
            } => {
                let query = TicketListQuery {
                    status: non_empty(status),
                    ticket_type: non_empty(ticket_type),
                    priority: non_empty(priority),
                    limit,
                    offset,
                };
                let (mut session, project) = app.project_session().await?;
                let resp = session.list_tickets(&project, &query).await?;
                let rows: Vec<Vec<String>> = resp.tickets.iter().map(list_row).collect();
                print!(
                    "{}",
                    out.format_table(
                        &["ID", "TYPE", "STATUS", "PRIORITY", "TITLE", "ASSIGNEE"],
                        &rows
                    )
                );
                if out.is_table() {
                    println!("\nTotal: {} tickets", resp.total);
                }
            }
            TicketAction::Board {
                view,
                ticket_type,
                status,
            } => {
                let query = BoardQuery {
                    view: Some(view).filter(|v| !v.is_empty()),
                    ticket_type: non_empty(ticket_type),
                    status: non_empty(status),
                };
                let (mut session, project) = app.project_session().await?;
                let board = session.board(&project, &query).await?;
                print!("{}", render_board(&board));
            }
            TicketAction::Search {
                query,
                ticket_type,
                status,
                limit,
            } => {
                let query = TicketSearchQuery {
                    query,
                    ticket_type: non_empty(ticket_type),
                    status: non_empty(status),
                    limit,
                };
                let (mut session, project) = app.project_session().await?;
                let resp = session.search_tickets(&project, &query).await?;
                let rows: Vec<Vec<String>> = resp.results.iter().map(search_row).collect();
                print!(
                    "{}",
                    out.format_table(&["ID", "TYPE", "STATUS", "PRIORITY", "TITLE"], &rows)
                );
                if out.is_table() {
                    println!("\nFound: {} tickets", resp.total);
                }
            }
            TicketAction::Link { action } => run_link(action, app).await?,
        }
        Ok(())
    }
}

async fn run_link(action: LinkAction, app: &mut AppContext) -> Result<()> {
    match action {
        LinkAction::Add {
            ticket_id,
            target,
            link_type,
        } => {
            let id = parse_ticket_id(&ticket_id)?;
            let Some(target_id) = target.filter(|t| *t != 0) else {
                bail!("--target is required");
            };
            let Some(link_type) = non_empty(link_type) else {
                bail!("--type is required (blocks, parent, related, duplicate)");
            };
            let (mut session, project) = app.project_session().await?;
            let link = session
                .add_link(&project, id, &LinkCreate { target_id, link_type })
                .await?;
            println!(
                "Link created: #{} -[{}]-> #{}",
                link.source_id, link.link_type, link.target_id
            );
        }
        LinkAction::List { ticket_id } => {
            let id = parse_ticket_id(&ticket_id)?;
            let (mut session, project) = app.project_session().await?;
            let links = session.list_links(&project, id).await?;
            if links.is_empty() {
                println!("No links found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = links.iter().map(link_row).collect();
            print!(
                "{}",
                app.output().format_table(
                    &["LINK ID", "TYPE", "TARGET ID", "TARGET TITLE", "TARGET STATUS"],
                    &rows
                )
            );
        }
        LinkAction::Remove { ticket_id, link_id } => {
            let id = parse_ticket_id(&ticket_id)?;
            let Ok(link_id) = link_id.parse::<i64>() else {
                bail!("invalid link ID: {link_id}");
            };
            let (mut session, project) = app.project_session().await?;
            session.remove_link(&project, id, link_id).await?;
            println!("Link {link_id} removed from ticket #{id}");
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_ticket_id(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) => Ok(id),
        Err(_) => bail!("invalid ticket ID: {raw}"),
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Terminal status a ticket of `ticket_type` closes into.
pub fn close_status(ticket_type: &str) -> &'static str {
    match ticket_type {
        "task" => "done",
        "bug" => "resolved",
        "feature" => "shipped",
        "decision" => "decided",
        _ => "done",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

/// Float Unix seconds as local time.
fn format_timestamp(ts: f64) -> String {
    let secs = ts.trunc() as i64;
    let nanos = ((ts - ts.trunc()) * 1e9) as u32;
    DateTime::from_timestamp(secs, nanos)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn ticket_fields(t: &TicketResponse) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("ID", t.id.to_string()),
        ("Title", t.title.clone()),
        ("Type", t.ticket_type.clone()),
        ("Status", t.status.clone()),
        ("Priority", t.priority.clone()),
    ];
    if let Some(d) = t.description.as_ref().filter(|d| !d.is_empty()) {
        fields.push(("Description", d.clone()));
    }
    if let Some(a) = t.assignee.as_ref().filter(|a| !a.is_empty()) {
        fields.push(("Assignee", a.clone()));
    }
    if !t.tags.is_empty() {
        fields.push(("Tags", t.tags.join(", ")));
    }
    if let Some(ts) = t.created_at {
        fields.push(("Created", format_timestamp(ts)));
    }
    if let Some(ts) = t.updated_at {
        fields.push(("Updated", format_timestamp(ts)));
    }
    fields
}

fn list_row(t: &TicketResponse) -> Vec<String> {
    vec![
        t.id.to_string(),
        t.ticket_type.clone(),
        t.status.clone(),
        t.priority.clone(),
        truncate(&t.title, TITLE_WIDTH),
        t.assignee.clone().unwrap_or_default(),
    ]
}

fn search_row(t: &TicketResponse) -> Vec<String> {
    vec![
        t.id.to_string(),
        t.ticket_type.clone(),
        t.status.clone(),
        t.priority.clone(),
        truncate(&t.title, TITLE_WIDTH),
    ]
}

fn link_row(l: &TicketLink) -> Vec<String> {
    vec![
        l.id.to_string(),
        l.link_type.clone(),
        l.target_id.to_string(),
        l.target_title.clone().unwrap_or_default(),
        l.target_status.clone().unwrap_or_default(),
    ]
}

fn render_board(board: &BoardView) -> String {
    let mut out = String::new();
    for col in &board.columns {
        out.push_str(&format!(
            "\n=== {} ({}) ===\n",
            col.status.to_uppercase(),
            col.count
        ));
        for t in &col.tickets {
            let assignee = t
                .assignee
                .as_ref()
                .map(|a| format!(" @{a}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  #{:<4} [{}] {}{assignee}\n",
                t.id,
                t.priority,
                truncate(&t.title, TITLE_WIDTH)
            ));
        }
        if col.tickets.is_empty() {
            out.push_str("  (empty)\n");
        }
    }
    out.push_str(&format!("\nTotal: {} tickets\n", board.total));
    out
}
