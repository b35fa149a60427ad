//! Permission prompt detection for a project's `permission` config value.
//!
//! A config that allows everything never raises prompts, so auto-accept
//! controls are pointless there. Accepted shapes:
//!
//! ```text
//! "allow" | "ask" | "deny"                      single rule for everything
//! { "edit": "ask", "bash": { "git *": "allow" } } per-tool rule or pattern map
//! ```

use serde_json::Value;

const ALLOW: &str = "allow";

/// Whether `permission` contains any rule that is not `allow`.
pub fn permission_prompts_enabled(permission: &Value) -> bool {
    match permission {
        Value::String(rule) => is_prompting_rule(rule),
        Value::Object(config) => config.values().any(is_non_allow_rule),
        _ => false,
    }
}

fn is_non_allow_rule(rule: &Value) -> bool {
    match rule {
        Value::String(rule) => is_prompting_rule(rule),
        Value::Object(actions) => actions.values().any(|action| action.as_str() != Some(ALLOW)),
        _ => false,
    }
}

fn is_prompting_rule(rule: &str) -> bool {
    !rule.is_empty() && rule != ALLOW
}
