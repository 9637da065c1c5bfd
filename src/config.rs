use duration_string::DurationString;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// A custom error for describing the error cases of loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file is missing or cannot be read.
    #[error("configuration file located at {0} not found ({1})")]
    NotFound(String, std::io::Error),
    /// The configuration file is not valid JSON or doesn't have the expected shape.
    #[error("configuration file located at {0} is malformed ({1})")]
    Malformed(String, serde_json::Error),
}

/// A single hook, pointing to a local working copy.
///
/// Other keys next to `path` are ignored, so older configuration files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HookConfig {
    pub path: PathBuf,
}

/// The address the HTTP server listens on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The configuration of the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The hooks keyed by their id.
    pub hooks: BTreeMap<String, HookConfig>,
    /// The server bind options. Older configurations call this `express`.
    #[serde(alias = "express")]
    pub server: ServerConfig,
    /// Kill pulls running longer than this (e.g. "10m").
    #[serde(default)]
    pub timeout: Option<DurationString>,
}

impl Config {
    /// Read the configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigError::NotFound(display.clone(), err))?;
        Self::parse(&contents).map_err(|err| ConfigError::Malformed(display, err))
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// The maximum time a pull may take, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.clone().map(Duration::from)
    }

    /// The hooks as pairs of id and path.
    pub fn hook_paths(&self) -> impl Iterator<Item = (String, PathBuf)> + '_ {
        self.hooks
            .iter()
            .map(|(id, hook)| (id.clone(), hook.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn it_should_parse_a_configuration() -> Result<(), Box<dyn Error>> {
        let config = Config::parse(
            r#"{
                "hooks": {
                    "deploy": { "path": "/srv/app" },
                    "docs": { "path": "/srv/docs" }
                },
                "server": { "host": "0.0.0.0", "port": 8080 },
                "timeout": "10m"
            }"#,
        )?;

        assert_eq!(2, config.hooks.len());
        assert_eq!(PathBuf::from("/srv/app"), config.hooks["deploy"].path);
        assert_eq!("0.0.0.0:8080", config.server.address());
        assert_eq!(Some(Duration::from_secs(600)), config.timeout());

        let ids: Vec<String> = config.hook_paths().map(|(id, _)| id).collect();
        assert_eq!(vec!["deploy", "docs"], ids);

        Ok(())
    }

    #[test]
    fn it_should_accept_the_express_key() -> Result<(), Box<dyn Error>> {
        let config = Config::parse(
            r#"{
                "hooks": {},
                "express": { "host": "127.0.0.1", "port": 3000 }
            }"#,
        )?;

        assert_eq!("127.0.0.1:3000", config.server.address());
        assert!(config.timeout().is_none());

        Ok(())
    }

    #[test]
    fn it_should_fail_without_hooks() {
        let result = Config::parse(r#"{ "server": { "host": "0.0.0.0", "port": 8080 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn it_should_ignore_unknown_hook_keys() -> Result<(), Box<dyn Error>> {
        let config = Config::parse(
            r#"{
                "hooks": { "deploy": { "path": "/srv/app", "branch": "main" } },
                "server": { "host": "0.0.0.0", "port": 8080 }
            }"#,
        )?;

        assert_eq!(
            HookConfig {
                path: PathBuf::from("/srv/app")
            },
            config.hooks["deploy"]
        );

        Ok(())
    }

    #[test]
    fn it_should_fail_without_a_hook_path() {
        let result = Config::parse(
            r#"{
                "hooks": { "deploy": { "branch": "main" } },
                "server": { "host": "0.0.0.0", "port": 8080 }
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn it_should_fail_on_malformed_json() {
        let result = Config::parse(r#"{ "hooks": "#);
        assert!(result.is_err());
    }

    #[test]
    fn it_should_fail_if_the_file_is_missing() {
        let error = Config::load(Path::new("/path/to/nowhere.json")).err().unwrap();

        assert!(
            matches!(error, ConfigError::NotFound(_, _)),
            "{error:?} should be NotFound"
        );
    }
}
