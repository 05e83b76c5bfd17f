//! Clap derive structures for the `switchos` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// switchos -- telemetry for MikroTik SwitchOS switches
#[derive(Debug, Parser)]
#[command(
    name = "switchos",
    version,
    about = "Read MikroTik SwitchOS telemetry from the command line",
    long_about = "Polls a SwitchOS switch's web interface and reports CPU temperature,\n\
        power supply readings, total power draw, and per-port PoE output.",
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
    /// Switch profile to use
    #[arg(long, short = 'p', env = "SWITCHOS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Switch address (overrides profile)
    #[arg(long, short = 's', env = "SWITCHOS_SWITCH", global = true)]
    pub switch: Option<String>,

    /// Web interface user (overrides profile)
    #[arg(long, short = 'u', env = "SWITCHOS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Web interface password
    #[arg(long, env = "SWITCHOS_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SWITCHOS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SWITCHOS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one snapshot and print device, system, and port data
    #[command(alias = "snap")]
    Snapshot,

    /// Fetch once and print every sensor value
    #[command(alias = "ls")]
    Sensors(SensorsArgs),

    /// Poll continuously and print sensor values after every refresh
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SENSORS / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SensorsArgs {
    /// Include sensors the device does not support
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Only sensors whose key contains this text (e.g. "poe", "psu1")
    #[arg(long, short = 'k')]
    pub key: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval (e.g. "10s", "1m"); overrides profile
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Stop after this many refresh cycles
    #[arg(long, short = 'n')]
    pub count: Option<u64>,

    /// Only sensors whose key contains this text
    #[arg(long, short = 'k')]
    pub key: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile from the global flags
    ///
    /// Uses --switch and --username. The password is stored in the system
    /// keyring when given with --password.
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Save the password to the config file instead of the keyring
        #[arg(long)]
        plaintext: bool,
    },

    /// Display current configuration (passwords masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
