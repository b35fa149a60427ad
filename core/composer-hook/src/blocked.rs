//! `blocked`: reports what blocks a session's composer.
//!
//! ## Usage
//!
//! ```bash
//! composer-hook blocked --session ses_abc --dir /path/to/project < snapshot.json
//! # {"blocked":true,"question":null,"permission":"per_123"}
//! ```

use composer_core::{snapshot_blocked_state, BlockedSummary, PreferenceStore, Result};
use composer_protocol::SessionSnapshot;
use std::io;
use std::path::Path;

use crate::input::{load_preferences, read_snapshot};

pub fn run(session: Option<&str>, directory: Option<&str>, prefs: Option<&Path>) -> Result<()> {
    let snapshot = read_snapshot(io::stdin().lock())?;
    let store = load_preferences(prefs)?;
    let summary = evaluate(&snapshot, &store, session, directory);

    tracing::debug!(
        session = ?session,
        blocked = summary.blocked,
        question = ?summary.question,
        permission = ?summary.permission,
        "Blocked state evaluated"
    );
    crate::print_json(&summary)
}

fn evaluate(
    snapshot: &SessionSnapshot,
    store: &PreferenceStore,
    session: Option<&str>,
    directory: Option<&str>,
) -> BlockedSummary {
    snapshot_blocked_state(snapshot, store.auto_accept(), session, directory).summary()
}
