// src/commands/mod.rs
//! Command handlers for the addonrepo CLI

mod build;
mod create;
mod update;

pub use build::cmd_build_repository;
pub use create::cmd_create_package;
pub use update::{cmd_update_package, UpdatePackageArgs};

use addonrepo::publish::PublishOutcome;
use std::path::PathBuf;

/// Work directory for a run, defaulting to `addonrepo` under the system temp directory
fn work_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| std::env::temp_dir().join("addonrepo"))
}

/// Print how a publish run ended
fn report(outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::NoChange => println!("No changes, nothing to publish"),
        PublishOutcome::Published {
            branch,
            pull_request,
        } => println!(
            "Pushed {} and opened pull request #{}: {}",
            branch, pull_request.number, pull_request.html_url
        ),
    }
}
