//! Settings inspection. Never opens the store.

use hubmesh_config::Config;

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

pub fn handle(args: SettingsArgs, settings: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::Show => {
            let mut effective = settings.clone();
            if let Some(ref db) = global.db {
                effective.store.path = Some(db.clone());
            }
            output::print_output(effective.to_toml()?.trim_end(), global.quiet);
        }
        SettingsCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(hubmesh_config::config_path);
            output::print_output(&path.display().to_string(), global.quiet);
        }
    }
    Ok(())
}
