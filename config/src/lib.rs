//! rfsh configuration
//!
//! YAML-based configuration for the remote filesystem shell.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/rfsh/rfsh.yaml` (system-wide)
//! 3. `~/.config/rfsh/rfsh.yaml` (user)
//! 4. `./rfsh.yaml` (project-local)
//! 5. `RFSH_CONFIG=/path/to/config.yaml` (explicit)
//! 6. Environment variables (highest priority)
//!
//! # Example Configuration
//!
//! ```yaml
//! shell:
//!   server: "http://nas.local:9099"
//!   export: "/export/home"
//!   prompt: "{user}@{host}:{export}:{cwd}> "
//!
//! logging:
//!   level: debug
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{history_path, ConfigLoader};
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<RfshConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<RfshConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RfshConfig::default();
        assert_eq!(config.shell.server, "http://localhost:9099");
        assert_eq!(config.shell.export, "/");
        assert!(config.shell.history.enabled);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = r#"
shell:
  server: "http://fileserver:8080"
"#;
        let config: RfshConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.shell.server, "http://fileserver:8080");
        assert_eq!(config.shell.export, "/"); // default
    }

    #[test]
    fn load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rfsh.yaml");
        std::fs::write(&path, "shell:\n  export: /export/x\n").unwrap();
        let config = load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.shell.export, "/export/x");
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
shell:
  server: "http://127.0.0.1:9000"
  export: "/export/data"
  prompt: "{user}:{cwd}$ "
  history:
    file: "~/.my_history"
    max_entries: 500

logging:
  level: debug
"#;
        let config: RfshConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.shell.export, "/export/data");
        assert_eq!(config.shell.prompt, "{user}:{cwd}$ ");
        assert_eq!(config.shell.history.max_entries, 500);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
