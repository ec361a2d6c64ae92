//! Clap derive structures for the `hubmesh` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hubmesh_core::MemberKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hubmesh -- provision hub-and-spoke overlay networks
#[derive(Debug, Parser)]
#[command(
    name = "hubmesh",
    version,
    about = "Provision hub-and-spoke overlay networks",
    long_about = "Allocates overlay addresses, manages hubs and members, and renders\n\
        one interface document per entity. Generated documents are versioned\n\
        by content hash in a local store.",
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
    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "HUBMESH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides store.path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output format (overrides defaults.output)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

/// Member connectivity policy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Reaches the hub and every other member
    Peer,
    /// Reaches the hub and peers only
    Route,
}

impl From<KindArg> for MemberKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Peer => Self::Peer,
            KindArg::Route => Self::Route,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage overlay networks
    #[command(alias = "net", alias = "n")]
    Network(NetworkArgs),

    /// Manage the hub of a network
    Hub(HubArgs),

    /// Manage peer and route members
    #[command(alias = "m")]
    Member(MemberArgs),

    /// Render, save and inspect generated documents
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Inspect effective settings
    Settings(SettingsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Networks ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NetworkArgs {
    #[command(subcommand)]
    pub command: NetworkCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Create a network over an IPv4 CIDR
    Create {
        /// Network name
        name: String,
        /// Overlay address range, e.g. 10.0.0.0/24
        cidr: String,
    },

    /// List networks
    #[command(alias = "ls")]
    List,

    /// Show a network and its address usage
    Show {
        /// Network name
        name: String,
    },

    /// Delete a network with its hub, members and history
    #[command(alias = "rm")]
    Delete {
        /// Network name
        name: String,
    },
}

// ── Hub ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HubArgs {
    #[command(subcommand)]
    pub command: HubCommand,
}

#[derive(Debug, Subcommand)]
pub enum HubCommand {
    /// Create the hub of a network
    Create {
        /// Network name
        network: String,
        /// Hub name
        name: String,
        /// Address members dial to reach the hub
        #[arg(long, short = 'a')]
        public_address: String,
        /// Listen port
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Show the hub of a network
    Show {
        /// Network name
        network: String,
    },

    /// Change the hub's public address or port
    Update {
        /// Network name
        network: String,
        #[arg(long, short = 'a')]
        public_address: Option<String>,
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Delete the hub (members are kept)
    #[command(alias = "rm")]
    Delete {
        /// Network name
        network: String,
    },
}

// ── Members ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MemberArgs {
    #[command(subcommand)]
    pub command: MemberCommand,
}

#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// Add a member to a network
    Create {
        /// Network name
        network: String,
        /// Member name
        name: String,
        /// Connectivity policy
        #[arg(long, short = 'k', value_enum, default_value = "peer")]
        kind: KindArg,
        /// Reachable address (required for peers)
        #[arg(long, short = 'a', default_value = "")]
        public_address: String,
        /// Listen port
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// List members of a network
    #[command(alias = "ls")]
    List {
        /// Network name
        network: String,
    },

    /// Show one member
    Show {
        /// Network name
        network: String,
        /// Member name
        name: String,
    },

    /// Change a member's kind, public address or port
    Update {
        /// Network name
        network: String,
        /// Member name
        name: String,
        #[arg(long, short = 'k', value_enum)]
        kind: Option<KindArg>,
        #[arg(long, short = 'a')]
        public_address: Option<String>,
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Remove a member and free its address
    #[command(alias = "rm")]
    Delete {
        /// Network name
        network: String,
        /// Member name
        name: String,
    },
}

// ── Generated documents ──────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Render documents from the current state
    Generate {
        /// Network name
        network: String,
        /// Print only this entity's document
        #[arg(long)]
        entity: Option<String>,
    },

    /// Save the current documents as a new version if they changed
    Save {
        /// Network name
        network: String,
    },

    /// List saved versions, oldest first
    History {
        /// Network name
        network: String,
    },

    /// Print a saved version (latest by default)
    Show {
        /// Network name
        network: String,
        #[arg(long)]
        version: Option<u32>,
        /// Print only this entity's document
        #[arg(long)]
        entity: Option<String>,
    },

    /// Print a content hash (current state, or a saved version)
    Hash {
        /// Network name
        network: String,
        #[arg(long)]
        version: Option<u32>,
    },
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print effective settings as TOML
    Show,
    /// Print the settings file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
