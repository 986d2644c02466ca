use std::env;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_USER: &str = "local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Workspace opened at startup; `workspace.select` can switch later.
    pub workspace: Option<PathBuf>,
    pub user_id: String,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            user_id: DEFAULT_USER.to_string(),
            log_filter: "rollbookd=info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            workspace: non_empty("ROLLBOOK_WORKSPACE").map(PathBuf::from),
            user_id: non_empty("ROLLBOOK_USER")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.user_id),
            log_filter: non_empty("ROLLBOOK_LOG").unwrap_or(defaults.log_filter),
            log_json: non_empty("ROLLBOOK_LOG_FORMAT").is_some_and(|v| v == "json"),
        }
    }
}

/// Logs go to stderr: stdout carries the IPC responses.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("rollbookd=info"));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}
