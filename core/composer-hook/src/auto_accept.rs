//! `auto-accept`: inspects or edits a session's auto-accept preference.
//!
//! ## Usage
//!
//! ```bash
//! composer-hook auto-accept status --session ses_abc --dir /path/to/project --snapshot snap.json
//! composer-hook auto-accept toggle --session ses_abc --dir /path/to/project
//! # {"sessionID":"ses_abc","directory":"/path/to/project","autoAccept":false}
//! ```
//!
//! Lineage (inherited parent settings) is only visible when `--snapshot`
//! supplies the session list; without it the session is resolved on its own.

use composer_core::{session_auto_accepts, PreferenceStore, Result};
use composer_protocol::Session;
use serde::Serialize;
use std::path::Path;

use crate::input::{load_preferences, load_snapshot_file};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Status,
    Enable,
    Disable,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoAcceptStatus {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub directory: Option<String>,
    #[serde(rename = "autoAccept")]
    pub auto_accept: bool,
}

pub fn run(
    action: Action,
    session_id: &str,
    directory: Option<&str>,
    snapshot: Option<&Path>,
    prefs: Option<&Path>,
) -> Result<()> {
    let sessions = load_snapshot_file(snapshot)?.sessions;
    let mut store = load_preferences(prefs)?;

    let status = apply(action, &mut store, &sessions, session_id, directory);
    if action != Action::Status {
        store.save()?;
        tracing::info!(
            action = ?action,
            session = %session_id,
            directory = ?directory,
            auto_accept = status.auto_accept,
            "Auto-accept preference updated"
        );
    }

    crate::print_json(&status)
}

fn apply(
    action: Action,
    store: &mut PreferenceStore,
    sessions: &[Session],
    session_id: &str,
    directory: Option<&str>,
) -> AutoAcceptStatus {
    let accepting = session_auto_accepts(store.auto_accept(), sessions, session_id, directory);
    let enable = match action {
        Action::Status => None,
        Action::Enable => Some(true),
        Action::Disable => Some(false),
        Action::Toggle => Some(!accepting),
    };

    match enable {
        Some(true) => store.enable(session_id, directory.unwrap_or_default()),
        Some(false) => store.disable(session_id, directory),
        None => {}
    }

    AutoAcceptStatus {
        session_id: session_id.to_string(),
        directory: directory.map(str::to_string),
        auto_accept: session_auto_accepts(store.auto_accept(), sessions, session_id, directory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_core::accept_key;

    const DIR: &str = "/tmp/project";

    fn sessions() -> Vec<Session> {
        vec![Session::root("root"), Session::child("child", "root")]
    }

    #[test]
    fn status_reports_inherited_value() {
        let mut store = PreferenceStore::new_in_memory();
        store.disable("root", Some(DIR));

        let status = apply(Action::Status, &mut store, &sessions(), "child", Some(DIR));
        assert!(!status.auto_accept);
    }

    #[test]
    fn toggle_flips_the_session_itself() {
        let mut store = PreferenceStore::new_in_memory();

        let status = apply(Action::Toggle, &mut store, &sessions(), "child", Some(DIR));
        assert!(!status.auto_accept);
        assert_eq!(
            store.auto_accept().get(&accept_key("child", Some(DIR))),
            Some(&false)
        );

        let status = apply(Action::Toggle, &mut store, &sessions(), "child", Some(DIR));
        assert!(status.auto_accept);
    }

    #[test]
    fn enable_without_directory_writes_legacy_key() {
        let mut store = PreferenceStore::new_in_memory();
        store.disable("child", None);

        let status = apply(Action::Enable, &mut store, &sessions(), "child", None);
        assert!(status.auto_accept);
        assert_eq!(store.auto_accept().get("child"), Some(&true));
    }

    #[test]
    fn run_persists_changes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let prefs = dir.path().join("permission.json");

        run(Action::Disable, "root", Some(DIR), None, Some(&prefs)).expect("run");

        let store = PreferenceStore::load(&prefs).expect("load");
        assert_eq!(
            store.auto_accept().get(&accept_key("root", Some(DIR))),
            Some(&false)
        );
    }

    #[test]
    fn status_serializes_server_field_names() {
        let status = AutoAcceptStatus {
            session_id: "s1".to_string(),
            directory: None,
            auto_accept: true,
        };
        assert_eq!(
            serde_json::to_value(&status).expect("serialize"),
            serde_json::json!({ "sessionID": "s1", "directory": null, "autoAccept": true })
        );
    }
}
