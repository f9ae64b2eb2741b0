use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::DEFAULT_DEBOUNCE;
use crate::model::DEFAULT_PAGE_SIZE;

/// Configuration for magicctl, read from ~/.magicctl/config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagicConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    /// Bearer token forwarded on every request (supports ${VAR})
    pub token: Option<String>,
    /// Skip TLS certificate verification
    pub insecure: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5555".to_string(),
            token: None,
            insecure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: usize,
    pub debounce_ms: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl ListConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl MagicConfig {
    /// Load config from ~/.magicctl/config.toml, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;

        let mut config: Self =
            toml::from_str(&content).context("Failed to parse config file (invalid TOML)")?;

        config.expand_variables();
        config.validate()?;

        Ok(config)
    }

    /// Get config file path: ~/.magicctl/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".magicctl/config.toml")
    }

    /// Expand ${VAR} references from the environment
    fn expand_variables(&mut self) {
        self.backend.endpoint = expand_string(&self.backend.endpoint);
        if let Some(ref token) = self.backend.token {
            let expanded = expand_string(token);
            self.backend.token = if expanded.is_empty() {
                None
            } else {
                Some(expanded)
            };
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.list.page_size == 0 {
            anyhow::bail!("list.page_size must be greater than zero");
        }
        if self.backend.endpoint.trim().is_empty() {
            anyhow::bail!("backend.endpoint must not be empty");
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, toml_str).context(format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}

/// Replace every ${NAME} with the environment variable NAME (empty if unset)
fn expand_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                result.push_str(&env::var(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = MagicConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, MagicConfig::default());
        assert_eq!(config.list.page_size, 5);
        assert_eq!(config.list.debounce(), Duration::from_millis(400));
    }

    #[test]
    fn test_token_expansion() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[backend]
endpoint = "https://magic.example.com"
token = "${MAGICCTL_TEST_TOKEN_XYZ}"

[list]
page_size = 10
debounce_ms = 250
"#,
        )
        .unwrap();

        env::set_var("MAGICCTL_TEST_TOKEN_XYZ", "secret");
        let config = MagicConfig::load_from(&path).unwrap();
        env::remove_var("MAGICCTL_TEST_TOKEN_XYZ");

        assert_eq!(config.backend.endpoint, "https://magic.example.com");
        assert_eq!(config.backend.token.as_deref(), Some("secret"));
        assert_eq!(config.list.page_size, 10);
    }

    #[test]
    fn test_unset_token_variable_means_no_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[backend]\nendpoint = \"http://x\"\ntoken = \"${MAGICCTL_SURELY_UNSET_VAR}\"\n",
        )
        .unwrap();

        let config = MagicConfig::load_from(&path).unwrap();
        assert_eq!(config.backend.token, None);
    }

    #[test]
    fn test_partial_sections_fill_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[backend]\ntoken = \"literal-token\"\n\n[list]\npage_size = 10\n",
        )
        .unwrap();

        let config = MagicConfig::load_from(&path).unwrap();
        assert_eq!(config.backend.endpoint, "http://localhost:5555");
        assert_eq!(config.backend.token.as_deref(), Some("literal-token"));
        assert!(!config.backend.insecure);
        assert_eq!(config.list.page_size, 10);
        assert_eq!(config.list.debounce(), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[list]\npage_size = 0\ndebounce_ms = 400\n").unwrap();
        assert!(MagicConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = MagicConfig::default();
        config.backend.endpoint = "http://magic:4444".into();
        config.save_to(&path).unwrap();

        assert_eq!(MagicConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_expand_string_unterminated() {
        assert_eq!(expand_string("abc${def"), "abc${def");
        assert_eq!(expand_string("plain"), "plain");
    }
}
