//! Configuration for ctxpack
//!
//! Values are merged with figment in this order, later sources winning:
//!
//! 1. built-in defaults
//! 2. a config file (`ctxpack.config.{yaml,yml,toml,json}` in the source root,
//!    or an explicitly given path)
//! 3. environment variables prefixed with `CTXPACK_`, nested with `__`
//!    (for example `CTXPACK_OUTPUT__STYLE=xml`)

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::output::OutputStyle;

/// Config file names probed in the source root, in order
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "ctxpack.config.yaml",
    "ctxpack.config.yml",
    "ctxpack.config.toml",
    "ctxpack.config.json",
];

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CTXPACK_";

/// Fatal configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported token encoding: {0}")]
    UnknownEncoding(String),

    #[error("Unknown security rule set: {0}")]
    UnknownRuleSet(String),

    #[error("Failed to load configuration")]
    Load(#[from] Box<figment::Error>),

    #[error("Failed to render configuration")]
    Render(#[from] serde_yaml::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Merged configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub token_count: TokenCountConfig,
    pub security: SecurityConfig,
    pub performance: PerformanceConfig,
}

/// Artifact settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the artifact is written (informational for the engine)
    pub file_path: String,
    /// Style identifier; unrecognized values render as plain
    pub style: String,
    /// Free text placed near the top of the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    /// Number of files listed in the "top files" report
    pub top_files_length: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_path: "ctxpack-output.txt".to_owned(),
            style: "plain".to_owned(),
            header_text: None,
            top_files_length: 5,
        }
    }
}

impl OutputConfig {
    /// Resolve the style identifier to a rendering strategy
    pub fn output_style(&self) -> OutputStyle {
        OutputStyle::from_identifier(&self.style)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenCountConfig {
    /// BPE encoding identifier, e.g. `o200k_base`
    pub encoding: String,
}

impl Default for TokenCountConfig {
    fn default() -> Self {
        Self { encoding: "o200k_base".to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub enable_security_check: bool,
    /// Rule set identifier: `recommend` or `strict`
    pub rule_set: String,
    /// Substrings that suppress a match when found in it
    pub allowlist: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_security_check: true,
            rule_set: "recommend".to_owned(),
            allowlist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker threads for per-file work; `None` uses the global rayon pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Config {
    /// Load configuration for a source root
    ///
    /// When `explicit` is given, only that file is read and it must exist.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let file = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Box::new(figment::Error::from(format!(
                        "config file not found: {}",
                        path.display()
                    )))
                    .into());
                }
                Some(path.to_path_buf())
            },
            None => Self::find_config_file(root),
        };

        if let Some(path) = file {
            log::debug!("Loading config from {}", path.display());
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(&path)),
                Some("json") => figment.merge(Json::file(&path)),
                _ => figment.merge(Yaml::file(&path)),
            };
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// First config file present in `root`, if any
    pub fn find_config_file(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Default configuration rendered as YAML, for `ctxpack init`
    pub fn default_yaml() -> Result<String, ConfigError> {
        let body = serde_yaml::to_string(&Config::default())?;
        Ok(format!("{DEFAULT_YAML_HEADER}{body}"))
    }
}

const DEFAULT_YAML_HEADER: &str = "\
# ctxpack configuration
#
# output.style: xml | plain | markdown
# output.header_text: free text placed near the top of the artifact
# token_count.encoding: o200k_base | cl100k_base | p50k_base | p50k_edit | r50k_base
# security.rule_set: recommend | strict
# performance.threads: worker threads (default: all cores)
";

#[cfg(test)]
#[allow(clippy::str_to_string)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.style, "plain");
        assert_eq!(config.output.top_files_length, 5);
        assert_eq!(config.token_count.encoding, "o200k_base");
        assert!(config.security.enable_security_check);
        assert_eq!(config.security.rule_set, "recommend");
        assert_eq!(config.performance.threads, None);
    }

    #[test]
    fn test_load_yaml_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ctxpack.config.yaml",
                "output:\n  style: xml\ntoken_count:\n  encoding: cl100k_base\n",
            )?;
            jail.set_env("CTXPACK_OUTPUT__FILE_PATH", "packed.xml");

            let config = Config::load(jail.directory(), None).expect("load");
            assert_eq!(config.output.style, "xml");
            assert_eq!(config.output.file_path, "packed.xml");
            assert_eq!(config.token_count.encoding, "cl100k_base");
            // untouched sections keep their defaults
            assert_eq!(config.security.rule_set, "recommend");
            Ok(())
        });
    }

    #[test]
    fn test_load_explicit_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[security]\nenable_security_check = false\n")?;
            let path = jail.directory().join("custom.toml");

            let config = Config::load(jail.directory(), Some(&path)).expect("load");
            assert!(!config.security.enable_security_check);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = Config::load(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        // the figment detail lives in the source, not the message
        assert_eq!(err.to_string(), "Failed to load configuration");
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(source.contains("nope.yaml"));
    }

    #[test]
    fn test_default_yaml_parses_back() {
        Jail::expect_with(|jail| {
            let yaml = Config::default_yaml().expect("render");
            assert!(yaml.starts_with("# ctxpack configuration"));
            assert!(yaml.contains("performance: {}"));
            jail.create_file("ctxpack.config.yaml", &yaml)?;
            let config = Config::load(jail.directory(), None).expect("load");
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_rendered_yaml_keeps_set_options() {
        Jail::expect_with(|jail| {
            let mut config = Config::default();
            config.performance.threads = Some(3);
            config.output.header_text = Some("Read me first".to_owned());
            jail.create_file("ctxpack.config.yaml", &serde_yaml::to_string(&config).unwrap())?;

            let loaded = Config::load(jail.directory(), None).expect("load");
            assert_eq!(loaded, config);
            Ok(())
        });
    }
}
