use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::{env, fs};
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
    #[error("Error loading config: {0}")]
    ConfigError(String),
}

/// Sections of the bridge config that can be loaded on their own from a TOML file.
pub trait BridgeConfigSection: DeserializeOwned {
    /// Table name of the section inside a full config file, e.g. `fee`.
    const SECTION: &'static str;

    fn load_section_from_file_sync(file_name: impl AsRef<Path>) -> Result<Self, LoadConfigError> {
        let table: toml::Table = load_from_file_sync(file_name)?;
        let section = table
            .get(Self::SECTION)
            .cloned()
            .ok_or_else(|| LoadConfigError::ConfigError(format!("missing [{}] section", Self::SECTION)))?;
        Ok(section.try_into()?)
    }
}

pub async fn load_from_file<T: DeserializeOwned>(file_name: impl AsRef<Path>) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    parse_config(&contents)
}

pub fn load_from_file_sync<T: DeserializeOwned>(file_name: impl AsRef<Path>) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = fs::read_to_string(file_name)?;
    parse_config(&contents)
}

/// Parse a TOML document after expanding `${VAR}` references from the environment.
pub fn parse_config<T: DeserializeOwned>(raw_config: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(raw_config)?;
    let config: T = toml::from_str(&contents)?;
    Ok(config)
}

fn expand_vars(raw_config: &str) -> Result<String, LoadConfigError> {
    let re = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}")?;
    let expanded = re.replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
        Ok(val) => val,
        Err(_) => caps[0].to_string(),
    });
    Ok(expanded.to_string())
}
