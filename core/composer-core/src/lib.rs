//! # composer-core
//!
//! Decides whether a session's composer is blocked by a pending permission or
//! question, and whether a permission should be answered automatically.
//!
//! ## Design Principles
//!
//! - **Pure core**: Tree walks, request resolution and auto-accept policy take
//!   immutable snapshots and never fail. Recompute on every change.
//! - **Synchronous**: No async runtime dependency. Hosts wrap with async if needed.
//! - **Graceful degradation**: Unknown sessions, cycles and missing files
//!   resolve to safe defaults, not errors.
//! - **Transport at the edge**: [`PermissionClient`] is the only seam that talks
//!   to the server.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use composer_core::{snapshot_blocked_state, PreferenceStore};
//!
//! let store = PreferenceStore::load(&path)?;
//! let state = snapshot_blocked_state(&snapshot, store.auto_accept(), Some("ses_1"), Some(dir));
//! if let Some(request) = state.primary() {
//!     println!("blocked by {}", request.id());
//! }
//! ```

pub mod auto_accept;
pub mod blocked;
pub mod config;
pub mod error;
pub mod requests;
pub mod responder;
pub mod tree;

// Re-export commonly used items at crate root
pub use auto_accept::preferences::PreferenceStore;
pub use auto_accept::rules::permission_prompts_enabled;
pub use auto_accept::{
    accept_key, decode_directory, encode_directory, resolve_auto_accept, session_auto_accepts,
    AutoAcceptMap,
};
pub use blocked::{
    blocked_state, snapshot_blocked_state, BlockedState, BlockedSummary, BlockingRequest,
};
pub use config::*;
pub use error::{ComposerError, Result};
pub use requests::{
    first_blocking_request, resolve_blocking_request, session_permission_request,
    session_question_request,
};
pub use responder::{AutoResponder, EnableTicket, PermissionClient, RespondedCache};
pub use tree::{downward, upward, OwnedRequest, SessionNode};

pub use composer_protocol as protocol;
