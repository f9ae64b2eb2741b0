//! Command implementations for magicctl CLI

pub mod sockets;
pub mod users;

use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use magicctl_core::{ListSettings, ListView, MagicConfig, Notice, NoticeLevel};

use crate::magic::{MagicClient, UsersGateway};

pub use sockets::run_sockets;
pub use users::run_users;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
    /// Quiet mode - names only
    Quiet,
}

impl OutputFormat {
    /// Fold the `--json` shorthand into the selected format
    pub fn resolve(self, json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            self
        }
    }
}

/// A users list wired to the configured backend
pub fn users_view(config: &MagicConfig, page_size: Option<usize>) -> Result<ListView<UsersGateway>> {
    let gateway = Arc::new(UsersGateway::new(MagicClient::new(&config.backend)?));
    let mut settings = ListSettings::from(&config.list);
    if let Some(size) = page_size {
        settings.page_size = size;
    }
    Ok(ListView::new(gateway, settings)?)
}

/// Print queued notices to stderr. Returns true if any was an error.
pub fn report(notices: Vec<Notice>) -> bool {
    let mut failed = false;
    for notice in notices {
        failed |= notice.level == NoticeLevel::Error;
        eprintln!("{}", notice);
    }
    failed
}
