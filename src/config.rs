use crate::collectors::SourcePaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
    #[serde(default = "default_sys_root")]
    pub sys_root: PathBuf,
    /// Filesystem reported as `homeFree`. Falls back to `$HOME`, then `/`.
    #[serde(default)]
    pub home_dir: Option<PathBuf>,
    #[serde(default)]
    pub backend: Backend,
}

/// Where disk usage and process counts come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// `df` and `ps`.
    #[default]
    External,
    /// `sysinfo`, no child processes.
    Native,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            proc_root: default_proc_root(),
            sys_root: default_sys_root(),
            home_dir: None,
            backend: Backend::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation("listen is required".to_string()));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(format!(
                "listen '{}' must be a host:port socket address",
                self.listen
            )));
        }
        if self.proc_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "proc_root must not be empty".to_string(),
            ));
        }
        if self.sys_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "sys_root must not be empty".to_string(),
            ));
        }
        if matches!(&self.home_dir, Some(p) if p.as_os_str().is_empty()) {
            return Err(ConfigError::Validation(
                "home_dir must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths {
            proc_root: self.proc_root.clone(),
            sys_root: self.sys_root.clone(),
            home_dir: self.home_dir.clone().unwrap_or_else(default_home_dir),
        }
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_sys_root() -> PathBuf {
    PathBuf::from("/sys")
}

fn default_home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}
