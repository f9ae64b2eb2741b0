//! `magicctl sockets` - web socket connection diagnostics

use anyhow::Result;
use clap::{Parser, Subcommand};
use magicctl_core::{filter_local, MagicConfig, SocketUser};

use super::OutputFormat;
use crate::magic::MagicClient;
use crate::ui;

#[derive(Parser, Debug)]
pub struct SocketsArgs {
    #[command(subcommand)]
    pub command: SocketsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SocketsCommands {
    /// List users with open socket connections
    List(ListArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only users whose name contains this text (case-sensitive)
    #[arg(long, short)]
    pub filter: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, conflicts_with = "output")]
    pub json: bool,
}

pub async fn run_sockets(args: SocketsArgs, config: &MagicConfig) -> Result<()> {
    match args.command {
        SocketsCommands::List(args) => run_list(args, config).await,
    }
}

async fn run_list(args: ListArgs, config: &MagicConfig) -> Result<()> {
    let client = MagicClient::new(&config.backend)?;

    let pb = ui::spinner("Fetching socket connections...");
    let users = client.socket_users().await;
    ui::finish(pb);
    let users = users?;

    // The endpoint returns everything; filtering happens here
    let text = args.filter.unwrap_or_default();
    let shown = filter_local(&users, text.trim());

    match args.output.resolve(args.json) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Quiet => {
            for user in &shown {
                println!("{}", user.username);
            }
        }
        OutputFormat::Human => print_users(&shown, users.len()),
    }
    Ok(())
}

fn print_users(shown: &[&SocketUser], total: usize) {
    println!("┌─ socket users :: {} of {}", shown.len(), total);
    println!("│");

    if shown.is_empty() {
        println!("│  (no connections)");
        return;
    }

    for (i, user) in shown.iter().enumerate() {
        let is_last = i == shown.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let cont_prefix = if is_last { "   " } else { "│  " };

        println!("{} {} ({} connections)", prefix, user.username, user.connections.len());
        for connection in &user.connections {
            println!("{}  {}", cont_prefix, connection);
        }
    }
}
