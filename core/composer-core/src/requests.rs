//! Blocking request resolution over a session tree.
//!
//! A session's composer is blocked by the first pending request found in its
//! own tree: the session itself first, then children in breadth-first order.

use composer_protocol::{PermissionRequest, QuestionRequest, RequestIndex};

use crate::tree::{downward, SessionNode};

/// Finds the request that blocks `root_id`, if any.
///
/// Walks `root_id` and its descendants in breadth-first order and returns the
/// first entry satisfying `include` from the first session that has one.
/// An absent or empty `root_id` resolves to nothing.
pub fn resolve_blocking_request<'r, S, T, F>(
    sessions: &[S],
    requests: &'r RequestIndex<T>,
    root_id: Option<&str>,
    mut include: F,
) -> Option<&'r T>
where
    S: SessionNode,
    F: FnMut(&T) -> bool,
{
    let root_id = root_id.filter(|id| !id.is_empty())?;

    downward(sessions, root_id).into_iter().find_map(|id| {
        requests
            .get(id)
            .and_then(|list| list.iter().find(|&item| include(item)))
    })
}

/// [`resolve_blocking_request`] accepting every pending entry.
pub fn first_blocking_request<'r, S, T>(
    sessions: &[S],
    requests: &'r RequestIndex<T>,
    root_id: Option<&str>,
) -> Option<&'r T>
where
    S: SessionNode,
{
    resolve_blocking_request(sessions, requests, root_id, |_| true)
}

pub fn session_permission_request<'r, S, F>(
    sessions: &[S],
    permissions: &'r RequestIndex<PermissionRequest>,
    root_id: Option<&str>,
    include: F,
) -> Option<&'r PermissionRequest>
where
    S: SessionNode,
    F: FnMut(&PermissionRequest) -> bool,
{
    resolve_blocking_request(sessions, permissions, root_id, include)
}

pub fn session_question_request<'r, S, F>(
    sessions: &[S],
    questions: &'r RequestIndex<QuestionRequest>,
    root_id: Option<&str>,
    include: F,
) -> Option<&'r QuestionRequest>
where
    S: SessionNode,
    F: FnMut(&QuestionRequest) -> bool,
{
    resolve_blocking_request(sessions, questions, root_id, include)
}
