use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Api {
    pub consumer_key: Option<String>,
    /// OAuth2 bearer token, needed for drafts, queue and private posts
    pub oauth_token: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Clone, Default)]
pub struct Defaults {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub api: Api,
    pub log: Option<Log>,
    #[serde(default)]
    pub defaults: Defaults,
}

impl Config {
    pub fn consumer_key(&self) -> Option<&str> {
        self.api.consumer_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    let Some(str_path) = path.to_str() else {
        return path;
    };
    if !str_path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match exe_dir {
        Some(exe_dir) => PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())),
        None => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    if let Some(ref mut log) = cfg.log {
        log.location = log.location.take().map(parse_path);
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let cfg = parse_config(r#"
[api]
consumer_key = "key"
consumer_secret = "secret"

[log]
level = "Debug"
log_to_console = true
location = "/var/log/export.log"

[defaults]
strict = true
"#).unwrap();
        assert_eq!(cfg.consumer_key(), Some("key"));
        assert!(cfg.api.oauth_token.is_none());
        let log = cfg.log.unwrap();
        assert_eq!(log.level, LogLevel::Debug);
        assert_eq!(log.location, Some(PathBuf::from("/var/log/export.log")));
        assert!(cfg.defaults.strict);
    }

    #[test]
    fn test_unused_keys_are_ignored() {
        // configs written for OAuth1 clients carry a consumer_secret
        let cfg = parse_config("[api]\nconsumer_key = \"key\"\nconsumer_secret = \"secret\"\n").unwrap();
        assert_eq!(cfg.consumer_key(), Some("key"));
    }

    #[test]
    fn test_minimal_config() {
        let cfg = parse_config("[api]\nconsumer_key = \"  \"\n").unwrap();
        assert_eq!(cfg.consumer_key(), None);
        assert!(cfg.log.is_none());
        assert!(!cfg.defaults.strict);
    }

    #[test]
    fn test_exe_dir_is_expanded() {
        let cfg = parse_config(r#"
[api]
[log]
level = "Info"
log_to_console = false
location = "${exe_dir}/log/export.log"
"#).unwrap();
        let location = cfg.log.unwrap().location.unwrap();
        assert!(!location.to_string_lossy().contains("${exe_dir}"));
        assert!(location.ends_with("log/export.log"));
    }

    #[test]
    fn test_invalid_config() {
        let err = parse_config("[api\n").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
