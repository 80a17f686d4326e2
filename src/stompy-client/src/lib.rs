//! Stompy Client - transport and resource APIs for the stompy service.
//!
//! [`Session`] wraps every outbound call with bearer auth, idempotency-aware
//! retry and server compatibility negotiation. The resource modules add typed
//! project, context and ticket operations on top of it.

pub mod compat;
pub mod contexts;
pub mod error;
pub mod projects;
pub mod retry;
pub mod session;
pub mod tickets;

pub use compat::check_compat;
pub use contexts::{
    ContextCreateRequest, ContextCreateResponse, ContextDeleteResponse, ContextDetailResponse,
    ContextListQuery, ContextListResponse, ContextMoveResponse, ContextResponse,
    ContextUpdateRequest, VersionSummary,
};
pub use error::{ApiError, ClientError, ClientResult};
pub use projects::{ProjectCreate, ProjectListResponse, ProjectResponse, ProjectStats};
pub use reqwest::{Method, StatusCode};
pub use retry::RetryPolicy;
pub use session::{API_VERSION_HEADER, MIN_CLI_VERSION_HEADER, Session};
pub use tickets::{
    BoardColumn, BoardQuery, BoardView, LinkCreate, TicketCreate, TicketHistory, TicketLink,
    TicketListQuery, TicketListResponse, TicketResponse, TicketSearchQuery, TicketSearchResponse,
    TicketUpdate,
};
