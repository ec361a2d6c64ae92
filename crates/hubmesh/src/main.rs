mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hubmesh_config::Config;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::commands::Context;
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "hubmesh", &mut std::io::stdout());
            Ok(())
        }

        Command::Settings(args) => {
            let settings = load_settings(&cli.global)?;
            commands::settings::handle(args, &settings, &cli.global)
        }

        cmd => {
            let settings = load_settings(&cli.global)?;
            let ctx = Context::open(&settings, &cli.global)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &ctx)
        }
    }
}

/// Settings file (`--config` or the platform default) merged with
/// `HUBMESH_*` environment overrides.
fn load_settings(global: &GlobalOpts) -> Result<Config, CliError> {
    let settings = match global.config {
        Some(ref path) => hubmesh_config::load_config_from(path)?,
        None => hubmesh_config::load_config()?,
    };
    Ok(settings)
}
