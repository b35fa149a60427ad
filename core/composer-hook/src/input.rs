//! Snapshot and preference loading shared by the subcommands.

use composer_core::{
    decode_directory, load_composer_config, ComposerError, PreferenceStore, Result,
};
use composer_protocol::{parse_snapshot, SessionSnapshot, MAX_SNAPSHOT_BYTES};
use fs_err as fs;
use std::io::Read;
use std::path::Path;

/// Reads a snapshot from `reader`. Empty input is an empty snapshot.
pub fn read_snapshot<R: Read>(reader: R) -> Result<SessionSnapshot> {
    let mut payload = Vec::new();
    reader
        .take(MAX_SNAPSHOT_BYTES as u64 + 1)
        .read_to_end(&mut payload)
        .map_err(|source| ComposerError::Io {
            context: "reading snapshot".to_string(),
            source,
        })?;

    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(SessionSnapshot::default());
    }

    Ok(parse_snapshot(&payload)?)
}

/// Reads a snapshot file, or returns an empty snapshot when no path is given.
pub fn load_snapshot_file(path: Option<&Path>) -> Result<SessionSnapshot> {
    let Some(path) = path else {
        return Ok(SessionSnapshot::default());
    };
    let file = fs::File::open(path).map_err(|source| ComposerError::Io {
        context: "opening snapshot file".to_string(),
        source,
    })?;
    read_snapshot(file)
}

/// Picks the workspace directory from a plain path or an encoded route segment.
pub fn resolve_directory(dir: Option<String>, slug: Option<&str>) -> Result<Option<String>> {
    match slug {
        Some(encoded) => decode_directory(encoded)
            .map(Some)
            .ok_or_else(|| ComposerError::InvalidDirectory {
                encoded: encoded.to_string(),
            }),
        None => Ok(dir),
    }
}

/// Loads preferences from `path`, or from the configured location.
pub fn load_preferences(path: Option<&Path>) -> Result<PreferenceStore> {
    match path {
        Some(path) => PreferenceStore::load(path),
        None => {
            let path = load_composer_config()
                .resolve_preferences_path()
                .ok_or(ComposerError::HomeDirNotFound)?;
            PreferenceStore::load(&path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn dir_slug_is_decoded() {
        let dir = resolve_directory(None, Some("L3RtcC9wcm9qZWN0")).expect("decode");
        assert_eq!(dir.as_deref(), Some("/tmp/project"));

        let dir = resolve_directory(Some("/srv".to_string()), None).expect("plain");
        assert_eq!(dir.as_deref(), Some("/srv"));
    }

    #[test]
    fn malformed_dir_slug_is_an_error() {
        assert!(matches!(
            resolve_directory(None, Some("***")),
            Err(ComposerError::InvalidDirectory { .. })
        ));
    }

    #[test]
    fn blank_input_is_empty_snapshot() {
        let snapshot = read_snapshot(Cursor::new(b"  \n")).expect("read");
        assert_eq!(snapshot, SessionSnapshot::default());
    }

    #[test]
    fn invalid_input_is_snapshot_error() {
        let err = read_snapshot(Cursor::new(b"{\"session\": 3}")).unwrap_err();
        assert!(matches!(err, ComposerError::InvalidSnapshot { .. }));
    }

    #[test]
    fn oversized_input_is_rejected() {
        let mut payload = b"{\"session\": []".to_vec();
        payload.resize(MAX_SNAPSHOT_BYTES + 16, b' ');
        payload.push(b'}');

        let err = read_snapshot(Cursor::new(payload)).unwrap_err();
        assert!(matches!(
            err,
            ComposerError::InvalidSnapshot { ref code, .. } if code == "snapshot_too_large"
        ));
    }

    #[test]
    fn missing_snapshot_path_is_empty() {
        let snapshot = load_snapshot_file(None).expect("load");
        assert!(snapshot.sessions.is_empty());
    }

    #[test]
    fn explicit_preferences_path_is_used() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("permission.json");
        std::fs::write(&path, r#"{"autoAccept": {"s1": false}}"#).expect("write");

        let store = load_preferences(Some(&path)).expect("load");
        assert_eq!(store.auto_accept().get("s1"), Some(&false));
        assert_eq!(store.file_path(), Some(path.as_path()));
    }
}
