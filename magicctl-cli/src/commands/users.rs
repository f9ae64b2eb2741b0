//! `magicctl users` - browse and manage backend users

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use inquire::Confirm;
use magicctl_core::{
    DialogOutcome, Entry, ListView, MagicConfig, NoticeLevel, RemoteGateway, RowState, User,
};
use serde_json::json;

use super::{report, users_view, OutputFormat};
use crate::magic::{MagicClient, UsersGateway};
use crate::ui;

/// Highest page `users list` accepts
const MAX_PAGE: u64 = 1_000_000;

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommands,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List one page of users
    List(ListArgs),
    /// Show the roles of a user
    Roles(RolesArgs),
    /// Delete a user
    Delete(DeleteArgs),
    /// Take a role away from a user
    RemoveRole(RemoveRoleArgs),
    /// Interactive filtered list (type to filter, Enter to expand)
    Browse,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only users whose name contains this text
    #[arg(long, short)]
    pub filter: Option<String>,

    /// Page to show (1-based)
    #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=MAX_PAGE))]
    pub page: u64,

    /// Users per page (default from config)
    #[arg(long, short, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: Option<u64>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, conflicts_with = "output")]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct RolesArgs {
    pub username: String,

    /// Shorthand for --output json
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    pub username: String,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct RemoveRoleArgs {
    pub username: String,
    pub role: String,
}

pub async fn run_users(args: UsersArgs, config: &MagicConfig) -> Result<()> {
    match args.command {
        UsersCommands::List(args) => run_list(args, config).await,
        UsersCommands::Roles(args) => run_roles(args, config).await,
        UsersCommands::Delete(args) => run_delete(args, config).await,
        UsersCommands::RemoveRole(args) => run_remove_role(args, config).await,
        UsersCommands::Browse => crate::tui::run_browse(config).await,
    }
}

async fn run_list(args: ListArgs, config: &MagicConfig) -> Result<()> {
    let output = args.output.resolve(args.json);
    let mut view = users_view(config, args.limit.map(|l| l as usize))?;

    view.open_at(args.filter.unwrap_or_default(), (args.page - 1) as usize)?;
    let pb = ui::spinner("Loading users...");
    view.settle().await;
    ui::finish(pb);

    if report(view.drain_notices()) && view.entries().is_empty() {
        bail!("Failed to load users from {}", config.backend.endpoint);
    }

    match output {
        OutputFormat::Json => {
            let users: Vec<_> = view
                .entries()
                .iter()
                .map(|e| json!({ "username": e.row.username, "roles": e.detail }))
                .collect();
            let body = json!({
                "filter": view.filter().text,
                "page": view.filter().page_index() + 1,
                "pages": view.page_count(),
                "count": view.count(),
                "users": users,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Quiet => {
            for entry in view.entries() {
                println!("{}", entry.row.username);
            }
        }
        OutputFormat::Human => print_page(&view),
    }

    Ok(())
}

fn print_page(view: &ListView<UsersGateway>) {
    let filter = view.filter();
    let scope = if filter.text.is_empty() {
        "users".to_string()
    } else {
        format!("users matching '{}'", filter.text)
    };
    let total = view
        .count()
        .map(|c| format!("{} total", c))
        .unwrap_or_else(|| "count unavailable".to_string());

    println!(
        "┌─ {} :: {} (page {}/{})",
        scope,
        total,
        filter.page_index() + 1,
        view.page_count().max(1)
    );
    println!("│");

    let entries = view.entries();
    if entries.is_empty() {
        println!("│  (no users)");
        return;
    }

    for (i, entry) in entries.iter().enumerate() {
        let is_last = i == entries.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let cont_prefix = if is_last { "   " } else { "│  " };

        println!("{} {}", prefix, entry.row.username);
        if view.row_state(entry.id()) == RowState::Expanded {
            println!("{}roles: {}", cont_prefix, roles_line(entry));
        }
    }
}

fn roles_line(entry: &Entry<User, Vec<String>>) -> String {
    match &entry.detail {
        Some(roles) if roles.is_empty() => "(none)".to_string(),
        Some(roles) => roles.join(", "),
        None => "(unavailable)".to_string(),
    }
}

async fn run_roles(args: RolesArgs, config: &MagicConfig) -> Result<()> {
    let gateway = UsersGateway::new(MagicClient::new(&config.backend)?);

    let pb = ui::spinner(format!("Fetching roles for {}...", args.username));
    let roles = gateway.detail(&args.username).await;
    ui::finish(pb);
    let roles = roles?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&roles)?);
    } else if roles.is_empty() {
        println!("{} has no roles", args.username);
    } else {
        for role in roles {
            println!("{}", role);
        }
    }
    Ok(())
}

/// Page through the matches for `username` until the exact user is on screen
async fn find_user<G>(view: &mut ListView<G>, username: &str) -> Result<()>
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    view.open_at(username, 0)?;
    loop {
        view.settle().await;
        if report(view.drain_notices()) && view.entries().is_empty() {
            bail!("Failed to look up user '{}'", username);
        }
        if view.entries().iter().any(|e| e.id() == username) {
            return Ok(());
        }

        let offset = view.filter().offset;
        view.next_page();
        if view.filter().offset == offset {
            return Err(anyhow!("User '{}' not found", username));
        }
    }
}

/// Load the page that shows `username`, failing if no page does
async fn locate(config: &MagicConfig, username: &str) -> Result<ListView<UsersGateway>> {
    let mut view = users_view(config, None)?;
    let pb = ui::spinner(format!("Looking up {}...", username));
    let found = find_user(&mut view, username).await;
    ui::finish(pb);
    found.map(|()| view)
}

/// Delete `username` once the confirmation outcome is known.
/// Returns false if the dialog was cancelled.
async fn remove_user<G>(
    view: &mut ListView<G>,
    username: &str,
    outcome: DialogOutcome<()>,
) -> Result<bool>
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    if !view.confirm_remove(username, outcome) {
        return Ok(false);
    }
    view.settle().await;

    for notice in view.drain_notices() {
        println!("{}", notice);
        if notice.level == NoticeLevel::Error {
            bail!("Failed to delete user '{}'", username);
        }
    }
    Ok(true)
}

async fn run_delete(args: DeleteArgs, config: &MagicConfig) -> Result<()> {
    let mut view = locate(config, &args.username).await?;

    let outcome = if args.yes {
        DialogOutcome::Committed(())
    } else {
        let confirmed = Confirm::new(&format!("Delete user '{}'?", args.username))
            .with_default(false)
            .prompt()?;
        if confirmed {
            DialogOutcome::Committed(())
        } else {
            DialogOutcome::Cancelled
        }
    };

    let pb = ui::spinner(format!("Deleting {}...", args.username));
    let removed = remove_user(&mut view, &args.username, outcome).await;
    ui::finish(pb);

    if !removed? {
        println!("Cancelled");
    }
    Ok(())
}

async fn run_remove_role(args: RemoveRoleArgs, config: &MagicConfig) -> Result<()> {
    let mut view = locate(config, &args.username).await?;

    if view.row_state(&args.username) == RowState::Collapsed {
        view.toggle(&args.username);
        view.settle().await;
    }

    let has_role = view
        .entries()
        .iter()
        .find(|e| e.id() == args.username)
        .and_then(|e| e.detail.as_ref())
        .map(|roles| roles.contains(&args.role));
    if has_role == Some(false) {
        bail!("User '{}' does not have the '{}' role", args.username, args.role);
    }

    view.gateway().remove_role(&args.username, &args.role).await?;

    let role = args.role.clone();
    view.update_detail(&args.username, |roles| roles.retain(|r| *r != role));
    view.announce(format!("Role '{}' removed from '{}'", args.role, args.username));
    report(view.drain_notices());

    if let Some(entry) = view.entries().iter().find(|e| e.id() == args.username) {
        println!("{} roles: {}", args.username, roles_line(entry));
    }
    Ok(())
}
