//! # scribe CLI
//!
//! Terminal client for the scribe editor backend: push and watch text files
//! as posts through the auto-save engine, stream AI actions, manage posts.

mod cli;
mod commands;
mod config;
mod surface;

use clap::Parser;

use crate::cli::{Cli, Commands, PostsCommands};
use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    scribe_sync::init_tracing(cli.verbose)?;

    let config = CliConfig::from_cli(&cli)?;

    match cli.command {
        Commands::Ai {
            action,
            file,
            append,
            text,
        } => commands::run_ai(&config, action.into(), file.as_deref(), text, append).await,
        Commands::Push { file, title, id } => {
            commands::push_file(&config, &file, title.as_deref(), id.as_deref()).await
        }
        Commands::Watch { file, title, id } => {
            commands::watch_file(&config, &file, title.as_deref(), id.as_deref()).await
        }
        Commands::Posts { command } => match command {
            PostsCommands::List { json } => commands::list_posts(&config, json).await,
            PostsCommands::Show { id, json } => commands::show_post(&config, &id, json).await,
            PostsCommands::Publish { id } => commands::publish_post(&config, &id).await,
        },
    }
}
