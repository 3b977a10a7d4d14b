//! Clap derive structures for the `neptune` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// neptune -- read and drive a Neptune Apex aquarium controller
#[derive(Debug, Parser)]
#[command(
    name = "neptune",
    version,
    about = "Read probes and switch outlets on a Neptune Apex controller",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "NEPTUNE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NEPTUNE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show configured probes and outlets
    #[command(alias = "st")]
    Status,

    /// Switch an outlet
    Outlet(OutletArgs),

    /// Start or cancel a feed cycle
    Feed(FeedArgs),

    /// Poll every configured device until interrupted
    Watch,

    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct OutletArgs {
    /// Outlet name as configured
    pub name: String,

    /// New outlet state
    #[arg(value_enum)]
    pub state: OutletAction,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutletAction {
    On,
    Off,
    /// Return control to the controller's program
    Auto,
}

#[derive(Debug, Args)]
pub struct FeedArgs {
    /// Feed cycle to start
    #[arg(
        value_enum,
        ignore_case = true,
        required_unless_present = "cancel",
        conflicts_with = "cancel"
    )]
    pub mode: Option<FeedLetter>,

    /// Cancel the running feed cycle
    #[arg(long)]
    pub cancel: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FeedLetter {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (password masked)
    Show,
    /// Print the config file path
    Path,
}
