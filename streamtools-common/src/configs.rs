use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::PathBuf;

/// User settings stored in `settings.json`, next to the executable.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configs {
    #[serde(default)]
    pub verbose_mode: bool,
    #[serde(default)]
    pub working_directory: String,
}

fn settings_file() -> Result<PathBuf, Error> {
    let mut path = env::current_exe()?;
    path.pop();
    path.push("settings.json");
    Ok(path)
}

/// Reads the settings file, creating it with default values if it does not exist yet.
pub fn get_configs() -> Result<Configs, Error> {
    let path = settings_file()?;
    if !path.exists() {
        let configs = Configs::default();
        // a read-only install directory is not an error
        let _ = save_configs(&configs);
        return Ok(configs);
    }
    let contents = fs::read_to_string(&path)?;
    parse_configs(&contents)
}

pub fn save_configs(configs: &Configs) -> Result<(), Error> {
    let path = settings_file()?;
    let contents = serde_json::to_string_pretty(configs)
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;
    fs::write(path, contents)
}

pub fn parse_configs(contents: &str) -> Result<Configs, Error> {
    serde_json::from_str(contents).map_err(|e| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Error reading settings.json: {}", e),
        )
    })
}
