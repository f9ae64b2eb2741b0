use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use magicctl_core::MagicConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a default config file
    Init(InitArgs),
    /// Print the effective config (file plus flags and environment)
    Show,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

/// Backend overrides shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Magic backend URL
    #[arg(long, global = true, env = "MAGICCTL_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the backend
    #[arg(long, global = true, env = "MAGICCTL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

/// Load the config file and layer command-line/environment overrides on top
pub fn resolve(args: &BackendArgs) -> Result<MagicConfig> {
    let mut config = MagicConfig::load()?;
    apply_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut MagicConfig, args: &BackendArgs) {
    if let Some(endpoint) = &args.endpoint {
        config.backend.endpoint = endpoint.clone();
    }
    if let Some(token) = &args.token {
        config.backend.token = Some(token.clone()).filter(|t| !t.is_empty());
    }
    if args.insecure {
        config.backend.insecure = true;
    }
}

pub fn run_config(args: ConfigArgs, backend: &BackendArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Show => run_show(backend),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = MagicConfig::config_path();

    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    MagicConfig::default().save_to(&config_path)?;

    println!("✅ Created config at: {:?}", config_path);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", config_path);
    println!("  2. Point backend.endpoint at your Magic instance");
    println!("  3. Set backend.token (\"${{MAGIC_TOKEN}}\" reads it from the environment)");

    Ok(())
}

fn run_show(backend: &BackendArgs) -> Result<()> {
    let mut config = resolve(backend)?;
    if config.backend.token.is_some() {
        config.backend.token = Some("********".to_string());
    }

    let toml_str =
        toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
    println!("{}", toml_str);

    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", MagicConfig::config_path().display());
    Ok(())
}
