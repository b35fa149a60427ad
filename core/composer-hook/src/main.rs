//! composer-hook: CLI front end for composer-core.
//!
//! Evaluates snapshots from the event feed and edits auto-accept preferences.
//! Results are printed to stdout as one JSON line; logs go to a file.
//!
//! ## Subcommands
//!
//! - `blocked`: What blocks a session's composer (snapshot JSON on stdin)
//! - `auto-accept`: Inspect or edit a session's auto-accept preference
//! - `prompts`: Whether a project config raises permission prompts

mod auto_accept;
mod blocked;
mod input;
mod logging;
mod prompts;

use clap::{Args, Parser, Subcommand};
use composer_core::{ComposerError, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "composer-hook")]
#[command(about = "Session composer blocking and auto-accept tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report what blocks a session's composer (reads snapshot JSON from stdin)
    Blocked {
        /// Session whose composer is being checked
        #[arg(long)]
        session: Option<String>,

        /// Workspace directory the snapshot belongs to
        #[arg(long)]
        dir: Option<String>,

        /// Workspace directory as its base64url route segment
        #[arg(long, conflicts_with = "dir")]
        dir_slug: Option<String>,

        /// Preference file (defaults to ~/.composer/permission.json)
        #[arg(long)]
        prefs: Option<PathBuf>,
    },

    /// Inspect or change a session's auto-accept preference
    AutoAccept {
        #[command(subcommand)]
        action: AutoAcceptCommand,
    },

    /// Report whether a project config raises permission prompts
    Prompts {
        /// Project config JSON file
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Subcommand)]
enum AutoAcceptCommand {
    /// Show the effective value, including inherited settings
    Status(TargetArgs),
    /// Auto-accept permissions for the session and its children
    Enable(TargetArgs),
    /// Prompt for permissions for the session and its children
    Disable(TargetArgs),
    /// Flip the effective value
    Toggle(TargetArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Session ID
    #[arg(long)]
    session: String,

    /// Workspace directory; omit to use the directory-independent key
    #[arg(long)]
    dir: Option<String>,

    /// Workspace directory as its base64url route segment
    #[arg(long, conflicts_with = "dir")]
    dir_slug: Option<String>,

    /// Snapshot file supplying the session list for lineage
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Preference file (defaults to ~/.composer/permission.json)
    #[arg(long)]
    prefs: Option<PathBuf>,
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command) {
        tracing::error!(error = %e, "composer-hook failed");
        eprintln!("composer-hook: {}", e);
        std::process::exit(1);
    }
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Blocked {
            session,
            dir,
            dir_slug,
            prefs,
        } => {
            let dir = input::resolve_directory(dir, dir_slug.as_deref())?;
            blocked::run(session.as_deref(), dir.as_deref(), prefs.as_deref())
        }
        Commands::AutoAccept { action } => {
            let (action, target) = match action {
                AutoAcceptCommand::Status(target) => (auto_accept::Action::Status, target),
                AutoAcceptCommand::Enable(target) => (auto_accept::Action::Enable, target),
                AutoAcceptCommand::Disable(target) => (auto_accept::Action::Disable, target),
                AutoAcceptCommand::Toggle(target) => (auto_accept::Action::Toggle, target),
            };
            let dir = input::resolve_directory(target.dir, target.dir_slug.as_deref())?;
            auto_accept::run(
                action,
                &target.session,
                dir.as_deref(),
                target.snapshot.as_deref(),
                target.prefs.as_deref(),
            )
        }
        Commands::Prompts { config } => prompts::run(&config),
    }
}

/// Prints `value` to stdout as a single JSON line.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).map_err(|source| ComposerError::Json {
        context: "serializing output".to_string(),
        source,
    })?;
    println!("{}", line);
    Ok(())
}
