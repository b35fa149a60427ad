//! `prompts`: whether a project config can raise permission prompts at all.

use composer_core::{permission_prompts_enabled, ComposerError, Result};
use fs_err as fs;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Serialize)]
struct PromptStatus {
    enabled: bool,
}

pub fn run(config: &Path) -> Result<()> {
    let enabled = prompts_enabled(config)?;
    crate::print_json(&PromptStatus { enabled })
}

fn prompts_enabled(config: &Path) -> Result<bool> {
    let content = fs::read_to_string(config).map_err(|source| ComposerError::Io {
        context: "reading project config".to_string(),
        source,
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|source| ComposerError::Json {
        context: "parsing project config".to_string(),
        source,
    })?;

    Ok(document
        .get("permission")
        .is_some_and(permission_prompts_enabled))
}
