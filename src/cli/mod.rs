// src/cli/mod.rs
//! CLI definitions for addonrepo
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! - `update-package` - Fetch one addon and propose a package list update
//! - `build-repository` - Rebuild every platform's index from the package lists
//! - `create-package` - Archive a tagged addon checkout into a package zip

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "addonrepo")]
#[command(version)]
#[command(about = "Addon repository sync and idempotent index builder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch an addon package and record it in the platform's package list
    UpdatePackage {
        /// Owner of the package list repository
        #[arg(short = 'u', long = "packages-gh-user")]
        list_owner: String,

        /// Name of the package list repository
        #[arg(short = 'n', long = "packages-gh-repo")]
        list_repository: String,

        /// Fetch type: release-artifact (gh-release) or source-snapshot (gh-repository)
        #[arg(short = 'e', long = "fetch-type")]
        fetch_type: String,

        /// Addon source repository as owner/name
        #[arg(short = 'r', long)]
        repository: String,

        /// Release tag (release-artifact)
        #[arg(short = 't', long = "tag")]
        release_tag: Option<String>,

        /// Release asset file name (release-artifact)
        #[arg(short = 'f', long = "file")]
        filename: Option<String>,

        /// Commit id (source-snapshot)
        #[arg(short = 's', long)]
        sha: Option<String>,

        /// Platform version (defaults to $KODI_VERSION, then $DEFAULT_KODI_VERSION)
        #[arg(short = 'k', long = "kodi-version")]
        platform: Option<String>,

        /// Branch holding the package lists
        #[arg(long, default_value = "master")]
        list_branch: String,

        /// Directory for temporary clones and the run lock
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },

    /// Rebuild the published repository indices from the package lists
    BuildRepository {
        /// Owner of the package list repository
        #[arg(short = 'u', long = "packages-gh-user")]
        list_owner: String,

        /// Name of the package list repository
        #[arg(short = 'n', long = "packages-gh-repo")]
        list_repository: String,

        /// Branch holding the package lists
        #[arg(long, default_value = "master")]
        list_branch: String,

        /// Branch the repository is published from
        #[arg(long, default_value = "gh-pages")]
        pages_branch: String,

        /// Directory for temporary clones and the run lock
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },

    /// Archive a tagged addon checkout into `{id}-{version}.zip`
    CreatePackage {
        /// Path of the local addon repository
        #[arg(short = 'r', long = "repository")]
        repository_path: PathBuf,

        /// Tag to archive
        #[arg(short = 't', long)]
        tag: String,

        /// Explicit archive file name
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        /// Explicit addon id
        #[arg(short = 'p', long = "package")]
        addon_id: Option<String>,

        /// Explicit addon version
        #[arg(short = 'v', long = "package-version")]
        addon_version: Option<String>,
    },
}
