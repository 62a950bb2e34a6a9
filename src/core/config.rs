//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use super::transport::TransportConfig;
use crate::domains::tools::ResponseOrdering;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Tool dispatch configuration.
    pub dispatch: DispatchConfig,

    /// Task backend configuration.
    pub backend: BackendConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Tool dispatch configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Whether concurrent calls may complete out of arrival order.
    pub ordering: ResponseOrdering,
}

/// Which task backend the tools drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local store.
    Memory,
    /// The Things3 application, through AppleScript.
    Things,
}

impl BackendKind {
    /// Things3 on macOS, the in-memory store elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Things
        } else {
            Self::Memory
        }
    }

    /// Parse a backend name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "things" | "things3" => Some(Self::Things),
            _ => None,
        }
    }
}

/// Task backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Path of the `osascript` executable used by the Things3 backend.
    pub osascript_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::platform_default(),
            osascript_path: "osascript".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "things-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            dispatch: DispatchConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration backed by the in-memory store, for tests and embedding.
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.backend.kind = BackendKind::Memory;
        config
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Ok(ordering) = std::env::var("MCP_RESPONSE_ORDERING") {
            config.dispatch.ordering = ResponseOrdering::parse(&ordering);
            info!("Response ordering: {:?}", config.dispatch.ordering);
        }

        if let Ok(backend) = std::env::var("MCP_TASK_BACKEND") {
            match BackendKind::parse(&backend) {
                Some(kind) => config.backend.kind = kind,
                None => warn!(
                    "Unknown MCP_TASK_BACKEND '{}', using {:?}",
                    backend, config.backend.kind
                ),
            }
        }

        if let Ok(path) = std::env::var("MCP_OSASCRIPT_PATH") {
            config.backend.osascript_path = path;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_backend_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TASK_BACKEND", "memory");
        }
        let config = Config::from_env();
        assert_eq!(config.backend.kind, BackendKind::Memory);
        unsafe {
            std::env::remove_var("MCP_TASK_BACKEND");
        }
    }

    #[test]
    fn test_unknown_backend_keeps_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TASK_BACKEND", "todoist");
        }
        let config = Config::from_env();
        assert_eq!(config.backend.kind, BackendKind::platform_default());
        unsafe {
            std::env::remove_var("MCP_TASK_BACKEND");
        }
    }

    #[test]
    fn test_ordering_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_RESPONSE_ORDERING", "sequential");
        }
        let config = Config::from_env();
        assert_eq!(config.dispatch.ordering, ResponseOrdering::Sequential);
        unsafe {
            std::env::remove_var("MCP_RESPONSE_ORDERING");
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dispatch.ordering, ResponseOrdering::Concurrent);
        assert_eq!(config.backend.osascript_path, "osascript");
        assert_eq!(Config::in_memory().backend.kind, BackendKind::Memory);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(BackendKind::parse("Things3"), Some(BackendKind::Things));
        assert_eq!(BackendKind::parse(" memory "), Some(BackendKind::Memory));
        assert_eq!(BackendKind::parse("other"), None);
    }
}
