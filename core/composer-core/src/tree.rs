//! Session tree traversal.
//!
//! Sessions form a forest through optional parent links. Two walks are used:
//!
//! ```text
//! downward(root)  root → children → grandchildren   (breadth-first, request lookup)
//! upward(child)   child → parent → grandparent      (lineage, policy lookup)
//! ```
//!
//! Both walks visit each ID at most once, so a parent cycle in a bad snapshot
//! terminates instead of looping. IDs missing from the snapshot are valid roots
//! and resolve to a tree of just themselves.

use std::collections::{HashMap, HashSet};

use composer_protocol::{PermissionRequest, QuestionRequest, Session};

/// Anything with a session ID and an optional parent link.
pub trait SessionNode {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

impl SessionNode for Session {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

/// A pending request owned by a session.
pub trait OwnedRequest {
    fn id(&self) -> &str;
    fn session_id(&self) -> &str;
}

impl OwnedRequest for PermissionRequest {
    fn id(&self) -> &str {
        &self.id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl OwnedRequest for QuestionRequest {
    fn id(&self) -> &str {
        &self.id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Returns `root_id` followed by its descendants in breadth-first discovery order.
pub fn downward<'a, S: SessionNode>(sessions: &'a [S], root_id: &'a str) -> Vec<&'a str> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for session in sessions {
        if let Some(parent_id) = session.parent_id() {
            children.entry(parent_id).or_default().push(session.id());
        }
    }

    let mut seen: HashSet<&str> = HashSet::from([root_id]);
    let mut ids = vec![root_id];
    let mut cursor = 0;

    while let Some(&id) = ids.get(cursor) {
        cursor += 1;
        let Some(list) = children.get(id) else {
            continue;
        };
        for &child in list {
            if seen.insert(child) {
                ids.push(child);
            }
        }
    }

    ids
}

/// Returns `root_id` followed by its parent, grandparent, and so on.
pub fn upward<'a, S: SessionNode>(sessions: &'a [S], root_id: &'a str) -> Vec<&'a str> {
    // Later entries win when a session is listed twice.
    let parents: HashMap<&str, &str> = sessions
        .iter()
        .filter_map(|session| session.parent_id().map(|parent| (session.id(), parent)))
        .collect();

    let mut seen: HashSet<&str> = HashSet::from([root_id]);
    let mut ids = vec![root_id];
    let mut current = root_id;

    while let Some(&parent) = parents.get(current) {
        if !seen.insert(parent) {
            break;
        }
        ids.push(parent);
        current = parent;
    }

    ids
}
