//! Settings resolution: `--config`, else the per-user config file, else defaults.

use std::path::{Path, PathBuf};

use medir_core::Settings;

use crate::CliError;

/// `<config dir>/medir/config.toml`, e.g. `~/.config/medir/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("medir").join("config.toml"))
}

/// The file that will be read, if any. An explicit path is returned even when
/// it does not exist, so that loading it reports the error.
pub fn config_source(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|p| p.is_file()),
    }
}

pub fn resolve(explicit: Option<&Path>) -> Result<Settings, CliError> {
    match config_source(explicit) {
        Some(path) => {
            let settings = Settings::load(&path).map_err(|e| {
                CliError::config(e).with_hint(format!("settings file: {}", path.display()))
            })?;
            log::info!("settings loaded from {}", path.display());
            Ok(settings)
        }
        None => {
            log::debug!("no settings file, using defaults");
            Ok(Settings::default())
        }
    }
}

pub fn cmd_config(explicit: Option<&Path>, path_only: bool) -> Result<(), CliError> {
    if path_only {
        match config_source(explicit).or_else(default_config_path) {
            Some(path) => println!("{}", path.display()),
            None => return Err(CliError::internal("no config directory on this platform")),
        }
        return Ok(());
    }

    let settings = resolve(explicit)?;
    let toml_str = settings
        .to_toml()
        .map_err(|e| CliError::internal(e.to_string()))?;
    match config_source(explicit) {
        Some(path) => eprintln!("# from {}", path.display()),
        None => eprintln!("# defaults (no settings file)"),
    }
    print!("{toml_str}");
    Ok(())
}
