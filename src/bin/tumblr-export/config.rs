use std::env;
use std::path::{Path, PathBuf};

use tumblr_export::config::{read_config, Config};

use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    [exe_dir, env::current_dir().ok(), dirs::config_dir()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

/// Reads the configuration from `cfg_path`, or from the first default location holding one.
/// No file found is not an error: posts read from a json file need no credentials.
pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Option<Config>, String> {
    let Some(config_path) = cfg_path.or_else(get_config_path) else {
        return Ok(None);
    };

    println!("Reading config from {}", config_path.display());
    let config = read_config(&config_path).map_err(|e| e.to_string())?;

    match config.log {
        Some(ref log) => match log.location {
            Some(ref location) => println!("Log enabled. Files will be written in {}", location.display()),
            None => println!("Log file disabled. Using stdout"),
        },
        None => println!("Log file disabled. Using stdout"),
    }

    Ok(Some(config))
}
