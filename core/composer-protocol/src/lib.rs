//! Snapshot and event types for composer-core.
//!
//! This crate is shared by the core and its clients to prevent schema drift.
//! Field names follow the server's JSON (`sessionID`, `parentID`) so snapshots
//! taken from the event feed deserialize without translation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const MAX_SNAPSHOT_BYTES: usize = 8 * 1024 * 1024; // 8MB

pub const EVENT_PERMISSION_ASKED: &str = "permission.asked";
pub const EVENT_PERMISSION_REPLIED: &str = "permission.replied";
pub const EVENT_QUESTION_ASKED: &str = "question.asked";

/// Pending requests of one kind, keyed by owning session ID.
pub type RequestIndex<T> = HashMap<String, Vec<T>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(
        rename = "parentID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,
}

impl Session {
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
        }
    }

    pub fn child(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: Some(parent_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub id: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(default)]
    pub permission: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub always: Vec<String>,
}

impl PermissionRequest {
    pub fn new(id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            permission: String::new(),
            patterns: Vec::new(),
            metadata: Map::new(),
            always: Vec::new(),
        }
    }
}

/// A pending multiple-choice prompt. Individual prompts are opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub id: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(default)]
    pub questions: Vec<Value>,
}

impl QuestionRequest {
    pub fn new(id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            questions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionReply {
    Once,
    Always,
    Reject,
}

/// Payload sent to the transport when answering a permission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "permissionID")]
    pub permission_id: String,
    pub response: PermissionReply,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// One directory's view of sessions and their pending requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default, rename = "session")]
    pub sessions: Vec<Session>,
    #[serde(default, deserialize_with = "deserialize_request_index")]
    pub permission: RequestIndex<PermissionRequest>,
    #[serde(default, deserialize_with = "deserialize_request_index")]
    pub question: RequestIndex<QuestionRequest>,
}

impl SessionSnapshot {
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        for session in &self.sessions {
            require_id(&session.id, "session.id")?;
            if let Some(parent_id) = &session.parent_id {
                require_id(parent_id, "session.parentID")?;
            }
        }

        for (owner, list) in &self.permission {
            require_id(owner, "permission owner")?;
            for item in list {
                require_id(&item.id, "permission.id")?;
            }
        }

        for (owner, list) in &self.question {
            require_id(owner, "question owner")?;
            for item in list {
                require_id(&item.id, "question.id")?;
            }
        }

        Ok(())
    }
}

pub fn parse_snapshot(payload: &[u8]) -> Result<SessionSnapshot, ErrorInfo> {
    if payload.len() > MAX_SNAPSHOT_BYTES {
        return Err(ErrorInfo::new(
            "snapshot_too_large",
            format!("snapshot exceeds {} bytes", MAX_SNAPSHOT_BYTES),
        ));
    }

    let snapshot: SessionSnapshot = serde_json::from_slice(payload).map_err(|err| {
        ErrorInfo::new(
            "invalid_snapshot",
            format!("snapshot payload is invalid JSON: {}", err),
        )
    })?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEventKind {
    PermissionAsked,
    PermissionReplied,
    QuestionAsked,
    Other,
}

/// An event from the server's subscription feed.
///
/// Properties stay as raw JSON so unknown event types pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub properties: Value,
}

impl SyncEvent {
    pub fn kind(&self) -> SyncEventKind {
        match self.event_type.as_str() {
            EVENT_PERMISSION_ASKED => SyncEventKind::PermissionAsked,
            EVENT_PERMISSION_REPLIED => SyncEventKind::PermissionReplied,
            EVENT_QUESTION_ASKED => SyncEventKind::QuestionAsked,
            _ => SyncEventKind::Other,
        }
    }

    /// Decodes the permission carried by a `permission.asked` event.
    pub fn permission_asked(&self) -> Option<PermissionRequest> {
        if self.kind() != SyncEventKind::PermissionAsked {
            return None;
        }
        serde_json::from_value(self.properties.clone()).ok()
    }

    /// ID of the permission settled by a `permission.replied` event.
    pub fn replied_permission_id(&self) -> Option<&str> {
        if self.kind() != SyncEventKind::PermissionReplied {
            return None;
        }
        ["permissionID", "requestID"]
            .iter()
            .find_map(|field| self.properties.get(*field).and_then(Value::as_str))
            .filter(|id| !id.is_empty())
    }

    /// Decodes the question carried by a `question.asked` event.
    pub fn question_asked(&self) -> Option<QuestionRequest> {
        if self.kind() != SyncEventKind::QuestionAsked {
            return None;
        }
        serde_json::from_value(self.properties.clone()).ok()
    }
}

/// A sync event tagged with the workspace directory that emitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEvent {
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub details: Option<SyncEvent>,
}

fn deserialize_request_index<'de, D, T>(deserializer: D) -> Result<RequestIndex<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw: HashMap<String, Option<Vec<T>>> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(owner, list)| list.map(|list| (owner, list)))
        .collect())
}

fn require_id(value: &str, field: &str) -> Result<(), ErrorInfo> {
    if value.is_empty() {
        return Err(ErrorInfo::new(
            "missing_field",
            format!("{} is required", field),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_snapshot_with_server_field_names() {
        let payload = json!({
            "session": [
                { "id": "root" },
                { "id": "child", "parentID": "root" }
            ],
            "permission": {
                "child": [{ "id": "perm-1", "sessionID": "child", "permission": "edit" }]
            }
        });

        let snapshot = parse_snapshot(payload.to_string().as_bytes()).expect("parse snapshot");
        assert_eq!(snapshot.sessions[1], Session::child("child", "root"));
        assert_eq!(snapshot.permission["child"][0].permission, "edit");
        assert!(snapshot.question.is_empty());
    }

    #[test]
    fn null_request_lists_are_dropped() {
        let payload = json!({
            "session": [{ "id": "root" }],
            "question": { "root": null }
        });

        let snapshot = parse_snapshot(payload.to_string().as_bytes()).expect("parse snapshot");
        assert!(!snapshot.question.contains_key("root"));
    }

    #[test]
    fn rejects_empty_session_id() {
        let payload = json!({ "session": [{ "id": "" }] });
        let err = parse_snapshot(payload.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.code, "missing_field");
    }

    #[test]
    fn accepts_long_and_padded_ids() {
        let long_id = "a".repeat(512);
        let payload = json!({
            "session": [{ "id": " root " }],
            "permission": { " root ": [{ "id": long_id, "sessionID": " root " }] }
        });
        let snapshot = parse_snapshot(payload.to_string().as_bytes()).expect("parse snapshot");
        assert_eq!(snapshot.sessions[0].id, " root ");
        assert_eq!(snapshot.permission[" root "][0].id, long_id);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_snapshot(b"{not json").unwrap_err();
        assert_eq!(err.code, "invalid_snapshot");
    }

    #[test]
    fn decodes_permission_asked_event() {
        let event: SyncEvent = serde_json::from_value(json!({
            "type": "permission.asked",
            "properties": { "id": "perm-1", "sessionID": "s1", "patterns": ["src/*"] }
        }))
        .expect("decode event");

        let permission = event.permission_asked().expect("permission payload");
        assert_eq!(permission.id, "perm-1");
        assert_eq!(permission.patterns, vec!["src/*".to_string()]);
    }

    #[test]
    fn decodes_replied_and_question_events() {
        let replied: SyncEvent = serde_json::from_value(json!({
            "type": "permission.replied",
            "properties": { "sessionID": "s1", "permissionID": "perm-1", "response": "once" }
        }))
        .expect("decode event");
        assert_eq!(replied.kind(), SyncEventKind::PermissionReplied);
        assert_eq!(replied.replied_permission_id(), Some("perm-1"));
        assert!(replied.permission_asked().is_none());

        let asked: SyncEvent = serde_json::from_value(json!({
            "type": "question.asked",
            "properties": { "id": "q-1", "sessionID": "s1", "questions": [{ "question": "?" }] }
        }))
        .expect("decode event");
        let question = asked.question_asked().expect("question payload");
        assert_eq!(question.id, "q-1");
        assert_eq!(question.questions.len(), 1);
        assert!(asked.replied_permission_id().is_none());
    }

    #[test]
    fn unknown_events_are_other() {
        let event: SyncEvent = serde_json::from_value(json!({
            "type": "session.updated",
            "properties": { "info": {} }
        }))
        .expect("decode event");

        assert_eq!(event.kind(), SyncEventKind::Other);
        assert!(event.permission_asked().is_none());
    }

    #[test]
    fn permission_response_omits_missing_directory() {
        let response = PermissionResponse {
            session_id: "s1".to_string(),
            permission_id: "perm-1".to_string(),
            response: PermissionReply::Once,
            directory: None,
        };

        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            value,
            json!({ "sessionID": "s1", "permissionID": "perm-1", "response": "once" })
        );
    }
}
