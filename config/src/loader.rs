use crate::{ConfigError, RfshConfig};
use regex::Regex;
use std::path::PathBuf;

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/rfsh/rfsh.yaml"));
        }
        search_paths.push(PathBuf::from("./rfsh.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/rfsh/rfsh.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(path));
        self
    }

    pub fn load(&self) -> Result<RfshConfig, ConfigError> {
        let mut config = RfshConfig::default();

        if let Ok(env_path) = std::env::var("RFSH_CONFIG") {
            let content =
                std::fs::read_to_string(&env_path).map_err(|e| ConfigError::ReadFile {
                    path: PathBuf::from(&env_path),
                    source: e,
                })?;
            config = self.parse_yaml(&content)?;
        } else if let Some(ref explicit) = self.explicit_file {
            let content = std::fs::read_to_string(explicit).map_err(|e| ConfigError::ReadFile {
                path: explicit.clone(),
                source: e,
            })?;
            config = self.parse_yaml(&content)?;
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    if let Ok(content) = std::fs::read_to_string(path) {
                        tracing::debug!(path = %path.display(), "merging config file");
                        config = self.merge_yaml(&config, &content)?;
                    }
                }
            }
        }

        self.apply_env_overrides(&mut config);
        Ok(config)
    }

    fn parse_yaml(&self, content: &str) -> Result<RfshConfig, ConfigError> {
        let expanded = self.expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml(&self, base: &RfshConfig, content: &str) -> Result<RfshConfig, ConfigError> {
        let expanded = self.expand_env_vars(content);
        let overlay: RfshConfig = serde_yaml::from_str(&expanded)?;
        Ok(self.merge_configs(base, &overlay))
    }

    fn merge_configs(&self, base: &RfshConfig, overlay: &RfshConfig) -> RfshConfig {
        let defaults = RfshConfig::default();
        let mut result = base.clone();

        if overlay.shell.server != defaults.shell.server {
            result.shell.server = overlay.shell.server.clone();
        }
        if overlay.shell.export != defaults.shell.export {
            result.shell.export = overlay.shell.export.clone();
        }
        if !overlay.shell.token.is_empty() {
            result.shell.token = overlay.shell.token.clone();
        }
        if overlay.shell.prompt != defaults.shell.prompt {
            result.shell.prompt = overlay.shell.prompt.clone();
        }
        if overlay.shell.history.file != defaults.shell.history.file
            || overlay.shell.history.max_entries != defaults.shell.history.max_entries
            || overlay.shell.history.enabled != defaults.shell.history.enabled
        {
            result.shell.history = overlay.shell.history.clone();
        }
        if overlay.logging.level != defaults.logging.level {
            result.logging.level = overlay.logging.level;
        }
        if !overlay.logging.filter.is_empty() {
            result.logging.filter = overlay.logging.filter.clone();
        }

        result
    }

    fn expand_env_vars(&self, content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string()
    }

    fn apply_env_overrides(&self, config: &mut RfshConfig) {
        if let Ok(server) = std::env::var("RFSH_SERVER") {
            config.shell.server = server;
        }
        if let Ok(export) = std::env::var("RFSH_EXPORT") {
            config.shell.export = export;
        }
        if let Ok(token) = std::env::var("RFSH_TOKEN") {
            config.shell.token = token;
        }
        if let Ok(level) = std::env::var("RFSH_LOG_LEVEL") {
            if let Ok(l) = serde_yaml::from_str(&level) {
                config.logging.level = l;
            }
        }
    }
}

/// History file location with `~` expanded.
pub fn history_path(config: &RfshConfig) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&config.shell.history.file).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_vars_works() {
        std::env::set_var("RFSH_TEST_VAR_123", "hello");
        let loader = ConfigLoader::new();
        let result = loader.expand_env_vars("value: ${RFSH_TEST_VAR_123}");
        assert_eq!(result, "value: hello");
        std::env::remove_var("RFSH_TEST_VAR_123");
    }

    #[test]
    fn missing_env_var_becomes_empty() {
        let loader = ConfigLoader::new();
        let result = loader.expand_env_vars("value: ${NONEXISTENT_VAR_XYZ}");
        assert_eq!(result, "value: ");
    }

    #[test]
    fn env_overrides_config() {
        std::env::set_var("RFSH_SERVER", "http://override:1234");
        let mut config = RfshConfig::default();
        let loader = ConfigLoader::new();
        loader.apply_env_overrides(&mut config);
        assert_eq!(config.shell.server, "http://override:1234");
        std::env::remove_var("RFSH_SERVER");
    }

    #[test]
    fn history_path_expands_tilde() {
        let config = RfshConfig::default();
        let path = history_path(&config);
        assert!(path.to_string_lossy().ends_with(".rfsh_history"));
        assert!(!path.to_string_lossy().starts_with('~'));
    }
}
