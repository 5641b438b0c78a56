// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::UpdatePackage {
            list_owner,
            list_repository,
            fetch_type,
            repository,
            release_tag,
            filename,
            sha,
            platform,
            list_branch,
            work_dir,
        } => commands::cmd_update_package(commands::UpdatePackageArgs {
            list_owner,
            list_repository,
            list_branch,
            fetch_type,
            repository,
            release_tag,
            filename,
            sha,
            platform,
            work_dir,
        }),

        Commands::BuildRepository {
            list_owner,
            list_repository,
            list_branch,
            pages_branch,
            work_dir,
        } => commands::cmd_build_repository(
            &list_owner,
            &list_repository,
            &list_branch,
            &pages_branch,
            work_dir,
        ),

        Commands::CreatePackage {
            repository_path,
            tag,
            file,
            addon_id,
            addon_version,
        } => commands::cmd_create_package(&repository_path, &tag, file, addon_id, addon_version),
    }
}
