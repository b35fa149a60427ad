//! Auto-accept policy for permission requests.
//!
//! Preferences are booleans keyed either by session ID alone (legacy) or by
//! `base64(directory)/sessionID`. Resolution walks the requesting session's
//! lineage upward and the nearest configured session wins:
//!
//! ```text
//! self (dir key) → self (legacy) → parent (dir key) → parent (legacy) → … → true
//! ```
//!
//! # Module Structure
//!
//! - [`preferences`]: File-backed preference map with enable/disable writes
//! - [`rules`]: Whether a project's permission config prompts at all

pub mod preferences;
pub mod rules;

use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tracing::trace;

use crate::tree::{upward, OwnedRequest, SessionNode};

/// Auto-accept preference map, keyed by [`accept_key`].
pub type AutoAcceptMap = HashMap<String, bool>;

/// Encodes a directory the way it appears in preference keys and routes.
pub fn encode_directory(directory: &str) -> String {
    URL_SAFE_NO_PAD.encode(directory.as_bytes())
}

/// Inverse of [`encode_directory`]. Malformed input yields `None`.
pub fn decode_directory(encoded: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
    String::from_utf8(bytes).ok()
}

/// Builds the preference key for a session, scoped to `directory` when given.
pub fn accept_key(session_id: &str, directory: Option<&str>) -> String {
    match directory.filter(|dir| !dir.is_empty()) {
        Some(dir) => format!("{}/{}", encode_directory(dir), session_id),
        None => session_id.to_string(),
    }
}

/// The override configured for exactly this session, if any.
fn accepted(auto_accept: &AutoAcceptMap, session_id: &str, directory: Option<&str>) -> Option<bool> {
    auto_accept
        .get(&accept_key(session_id, directory))
        .or_else(|| auto_accept.get(session_id))
        .copied()
}

/// Whether `session_id` auto-accepts, inheriting from its nearest configured ancestor.
pub fn session_auto_accepts<S: SessionNode>(
    auto_accept: &AutoAcceptMap,
    sessions: &[S],
    session_id: &str,
    directory: Option<&str>,
) -> bool {
    let lineage = upward(sessions, session_id);
    let resolved = lineage.iter().find_map(|&id| {
        accepted(auto_accept, id, directory).map(|value| (id, value))
    });

    match resolved {
        Some((source, value)) => {
            trace!(session_id, source, value, "Auto-accept override resolved");
            value
        }
        None => true,
    }
}

/// Whether `request` should be answered without prompting.
pub fn resolve_auto_accept<S, R>(
    auto_accept: &AutoAcceptMap,
    sessions: &[S],
    request: &R,
    directory: Option<&str>,
) -> bool
where
    S: SessionNode,
    R: OwnedRequest + ?Sized,
{
    session_auto_accepts(auto_accept, sessions, request.session_id(), directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_protocol::{PermissionRequest, Session};

    const DIR: &str = "/tmp/project";

    fn root_and_child() -> Vec<Session> {
        vec![Session::root("root"), Session::child("child", "root")]
    }

    fn map(entries: &[(String, bool)]) -> AutoAcceptMap {
        entries.iter().cloned().collect()
    }

    #[test]
    fn accept_key_scopes_by_directory() {
        assert_eq!(accept_key("s1", None), "s1");
        assert_eq!(accept_key("s1", Some("")), "s1");
        assert_eq!(accept_key("s1", Some(DIR)), "L3RtcC9wcm9qZWN0/s1");
    }

    #[test]
    fn directory_encoding_is_url_safe() {
        let encoded = encode_directory("/a/b?c>d");
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('='));
        assert_eq!(decode_directory(&encoded).as_deref(), Some("/a/b?c>d"));
    }

    #[test]
    fn decode_directory_rejects_garbage() {
        assert_eq!(decode_directory("***"), None);
    }

    #[test]
    fn uses_a_parent_sessions_directory_scoped_auto_accept() {
        let auto_accept = map(&[(accept_key("root", Some(DIR)), true)]);
        let request = PermissionRequest::new("p", "child");

        assert!(resolve_auto_accept(&auto_accept, &root_and_child(), &request, Some(DIR)));
    }

    #[test]
    fn uses_a_parent_sessions_legacy_key() {
        let auto_accept = map(&[("root".to_string(), false)]);
        let request = PermissionRequest::new("p", "child");

        assert!(!resolve_auto_accept(&auto_accept, &root_and_child(), &request, Some(DIR)));
    }

    #[test]
    fn defaults_to_auto_accept_without_lineage_override() {
        let sessions = vec![
            Session::root("root"),
            Session::child("child", "root"),
            Session::root("other"),
        ];
        let auto_accept = map(&[("other".to_string(), false)]);
        let request = PermissionRequest::new("p", "child");

        assert!(resolve_auto_accept(&auto_accept, &sessions, &request, Some(DIR)));
    }

    #[test]
    fn empty_map_always_accepts() {
        let auto_accept = AutoAcceptMap::new();
        for id in ["root", "child", "unknown"] {
            assert!(session_auto_accepts(&auto_accept, &root_and_child(), id, None));
            assert!(session_auto_accepts(&auto_accept, &root_and_child(), id, Some(DIR)));
        }
    }

    #[test]
    fn inherits_a_parent_sessions_false_override() {
        let auto_accept = map(&[(accept_key("root", Some(DIR)), false)]);
        let request = PermissionRequest::new("p", "child");

        assert!(!resolve_auto_accept(&auto_accept, &root_and_child(), &request, Some(DIR)));
    }

    #[test]
    fn prefers_a_child_override_over_parent_override() {
        let auto_accept = map(&[
            (accept_key("root", Some(DIR)), false),
            (accept_key("child", Some(DIR)), true),
        ]);
        let request = PermissionRequest::new("p", "child");

        assert!(resolve_auto_accept(&auto_accept, &root_and_child(), &request, Some(DIR)));
    }

    #[test]
    fn directory_key_beats_legacy_key_for_same_session() {
        let auto_accept = map(&[
            ("child".to_string(), true),
            (accept_key("child", Some(DIR)), false),
        ]);

        assert!(!session_auto_accepts(&auto_accept, &root_and_child(), "child", Some(DIR)));
        // Without a directory only the legacy key is consulted.
        assert!(session_auto_accepts(&auto_accept, &root_and_child(), "child", None));
    }

    #[test]
    fn own_legacy_key_beats_parent_directory_key() {
        let auto_accept = map(&[
            (accept_key("root", Some(DIR)), true),
            ("child".to_string(), false),
        ]);

        assert!(!session_auto_accepts(&auto_accept, &root_and_child(), "child", Some(DIR)));
    }

    #[test]
    fn other_directory_keys_are_ignored() {
        let auto_accept = map(&[(accept_key("child", Some("/elsewhere")), false)]);

        assert!(session_auto_accepts(&auto_accept, &root_and_child(), "child", Some(DIR)));
    }

    #[test]
    fn descendants_do_not_affect_ancestors() {
        let auto_accept = map(&[(accept_key("child", Some(DIR)), false)]);

        assert!(session_auto_accepts(&auto_accept, &root_and_child(), "root", Some(DIR)));
    }

    #[test]
    fn cyclic_lineage_falls_back_to_default() {
        let sessions = vec![Session::child("x", "y"), Session::child("y", "x")];
        assert!(session_auto_accepts(&AutoAcceptMap::new(), &sessions, "x", None));
    }
}
