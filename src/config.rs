use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use crate::environment::Environment;

pub const CONFIG_ENV_VAR: &str = "TINY_SHELL_CONFIG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub log_level: String,
    pub env_vars: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

impl Config {
    /// Seed the shell context with the configured variables.
    pub fn apply_to(&self, env: &mut Environment) {
        for (k, v) in &self.env_vars {
            env.assign(k, v);
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "$ ".to_string(),
            log_level: "warn".to_string(),
            env_vars: BTreeMap::new(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let src = fs::read_to_string(path)?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse(format!("Line {}: No '=' found: {}", lineno + 1, line)));
            };
            let key = key.trim();

            match key {
                // Kept verbatim so a prompt can end in whitespace.
                "prompt" => config.prompt = value.to_string(),
                "log_level" => config.log_level = value.trim().to_string(),
                k if k.starts_with("env.") => {
                    let var = k.trim_start_matches("env.");
                    if var.is_empty() {
                        return Err(ConfigError::Parse(format!("Line {}: Empty variable name", lineno + 1)));
                    }
                    config.env_vars.insert(var.to_string(), value.to_string());
                }
                _ => return Err(ConfigError::Parse(format!("Line {}: Unknown key: {}", lineno + 1, key))),
            }
        }

        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}
