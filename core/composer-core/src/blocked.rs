//! Composer blocked state for a session.
//!
//! Questions always block. Permissions block only when the requesting
//! session's lineage policy says not to auto-accept them. Both are reported
//! separately so the caller picks which one to present.

use serde::Serialize;

use composer_protocol::{PermissionRequest, QuestionRequest, RequestIndex, SessionSnapshot};

use crate::auto_accept::{resolve_auto_accept, AutoAcceptMap};
use crate::requests::{session_permission_request, session_question_request};
use crate::tree::SessionNode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockingRequest<'a> {
    Question(&'a QuestionRequest),
    Permission(&'a PermissionRequest),
}

impl BlockingRequest<'_> {
    pub fn id(&self) -> &str {
        match self {
            BlockingRequest::Question(question) => &question.id,
            BlockingRequest::Permission(permission) => &permission.id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockedState<'a> {
    pub question: Option<&'a QuestionRequest>,
    pub permission: Option<&'a PermissionRequest>,
}

impl<'a> BlockedState<'a> {
    pub fn is_blocked(&self) -> bool {
        self.question.is_some() || self.permission.is_some()
    }

    /// The request to present first; questions take precedence.
    pub fn primary(&self) -> Option<BlockingRequest<'a>> {
        self.question
            .map(BlockingRequest::Question)
            .or(self.permission.map(BlockingRequest::Permission))
    }

    pub fn summary(&self) -> BlockedSummary {
        BlockedSummary {
            blocked: self.is_blocked(),
            question: self.question.map(|q| q.id.clone()),
            permission: self.permission.map(|p| p.id.clone()),
        }
    }
}

/// Serializable form of [`BlockedState`], carrying request IDs only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockedSummary {
    pub blocked: bool,
    pub question: Option<String>,
    pub permission: Option<String>,
}

/// Computes what blocks `session_id`'s composer.
pub fn blocked_state<'a, S: SessionNode>(
    sessions: &[S],
    permissions: &'a RequestIndex<PermissionRequest>,
    questions: &'a RequestIndex<QuestionRequest>,
    auto_accept: &AutoAcceptMap,
    session_id: Option<&str>,
    directory: Option<&str>,
) -> BlockedState<'a> {
    let question = session_question_request(sessions, questions, session_id, |_| true);
    let permission = session_permission_request(sessions, permissions, session_id, |item| {
        !resolve_auto_accept(auto_accept, sessions, item, directory)
    });

    BlockedState {
        question,
        permission,
    }
}

/// [`blocked_state`] over a whole snapshot.
pub fn snapshot_blocked_state<'a>(
    snapshot: &'a SessionSnapshot,
    auto_accept: &AutoAcceptMap,
    session_id: Option<&str>,
    directory: Option<&str>,
) -> BlockedState<'a> {
    blocked_state(
        &snapshot.sessions,
        &snapshot.permission,
        &snapshot.question,
        auto_accept,
        session_id,
        directory,
    )
}
