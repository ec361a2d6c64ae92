//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod hubs;
pub mod members;
pub mod networks;
pub mod settings;

use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;

use hubmesh_config::Config;
use hubmesh_core::{ConfigGenerator, Store, TopologyManager};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything a store-backed command needs.
pub struct Context {
    pub manager: TopologyManager,
    pub generator: ConfigGenerator,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Context {
    /// Open the store named by settings (or `--db`) and wire the services.
    pub fn open(settings: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let mut store_config = settings.store_config();
        if let Some(ref db) = global.db {
            store_config.path.clone_from(db);
        }
        let store = Arc::new(Store::open(&store_config)?);
        debug!(path = %store_config.path.display(), "store opened");

        Ok(Self {
            manager: TopologyManager::new(Arc::clone(&store), settings.topology_config()),
            generator: ConfigGenerator::new(store),
            format: output_format(settings, global)?,
            quiet: global.quiet,
        })
    }
}

/// `--output` wins over `defaults.output`.
fn output_format(settings: &Config, global: &GlobalOpts) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    OutputFormat::from_str(&settings.defaults.output, true).map_err(|reason| {
        CliError::Validation {
            field: "defaults.output".into(),
            reason,
        }
    })
}

/// Dispatch a store-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Network(args) => networks::handle(ctx, args),
        Command::Hub(args) => hubs::handle(ctx, args),
        Command::Member(args) => members::handle(ctx, args),
        Command::Config(args) => config_cmd::handle(ctx, args),
        // Settings and Completions never open the store
        Command::Settings(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command does not use the store".into(),
        }),
    }
}
