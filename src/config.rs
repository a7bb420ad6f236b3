use crate::error::{Error, Result};
use ethers::types::Address;
use reqwest::Url;
use serde::Deserialize;
use std::env;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_EXPLORER_URL: &str = "https://api.ftmscan.com/api";
pub const DEFAULT_PORT: u16 = 3000;
pub const API_KEY_VAR: &str = "FTM_SCAN_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(skip)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractsConfig {
    pub spa_circulating_supply: ContractEntry,
    pub spa_staking: ContractEntry,
    pub s_spa: ContractEntry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractEntry {
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_explorer_url")]
    pub url: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            url: default_explorer_url(),
        }
    }
}

fn default_explorer_url() -> String {
    DEFAULT_EXPLORER_URL.to_string()
}

impl Config {
    /// Reads the file named by `CONFIG_PATH` and the explorer key from the
    /// environment, then validates the result.
    pub fn load() -> Result<Self> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let api_key = env::var(API_KEY_VAR).unwrap_or_default();
        Self::from_path(path, api_key)
    }

    pub fn from_path(path: impl AsRef<Path>, api_key: String) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {}", path.display(), e)))?;
        Self::from_json_str(&content, api_key)
    }

    pub fn from_json_str(content: &str, api_key: String) -> Result<Self> {
        let mut config: Config = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("parse config: {e}")))?;
        config.api_key = api_key;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_http_url("provider.host", &self.provider.host)?;
        check_http_url("explorer.url", &self.explorer.url)?;

        let zero = [
            ("spaCirculatingSupply", self.contracts.spa_circulating_supply.address),
            ("spaStaking", self.contracts.spa_staking.address),
            ("sSpa", self.contracts.s_spa.address),
        ]
        .into_iter()
        .filter(|(_, address)| address.is_zero())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if !zero.is_empty() {
            return Err(Error::Config(format!(
                "contracts with zero address: {}",
                zero.join(", ")
            )));
        }

        if self.api_key.trim().is_empty() {
            return Err(Error::Config(format!(
                "{API_KEY_VAR} is not set; refusing to start without an explorer api key"
            )));
        }

        Ok(())
    }
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| Error::Config(format!("{field}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!("{field}: unsupported scheme {other}"))),
    }
}

/// Listening port from `PORT`, falling back to 3000.
pub fn port() -> Result<u16> {
    match env::var("PORT") {
        Ok(value) => value
            .parse()
            .map_err(|_| Error::Config(format!("PORT is not a valid port: {value}"))),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "provider": { "host": "https://rpc.ftm.tools" },
        "contracts": {
            "spaCirculatingSupply": { "address": "0x1111111111111111111111111111111111111111" },
            "spaStaking": { "address": "0x2222222222222222222222222222222222222222" },
            "sSpa": { "address": "0x3333333333333333333333333333333333333333" }
        }
    }"#;

    #[test]
    fn parses_original_layout_with_default_explorer() {
        let config = Config::from_json_str(SAMPLE, "key".into()).unwrap();
        assert_eq!(config.provider.host, "https://rpc.ftm.tools");
        assert_eq!(config.explorer.url, DEFAULT_EXPLORER_URL);
        assert_eq!(
            format!("0x{:x}", config.contracts.s_spa.address),
            "0x3333333333333333333333333333333333333333"
        );
        assert_eq!(config.api_key, "key");
    }

    #[test]
    fn rejects_missing_api_key() {
        let err = Config::from_json_str(SAMPLE, " ".into()).unwrap_err();
        assert!(err.to_string().contains(API_KEY_VAR));
        assert!(err.to_string().contains("refusing to start"));
    }

    #[test]
    fn rejects_zero_address() {
        let content = SAMPLE.replace(
            "0x2222222222222222222222222222222222222222",
            "0x0000000000000000000000000000000000000000",
        );
        let err = Config::from_json_str(&content, "key".into()).unwrap_err();
        assert!(err.to_string().contains("spaStaking"));
    }

    #[test]
    fn rejects_non_http_provider() {
        let content = SAMPLE.replace("https://rpc.ftm.tools", "ws://rpc.ftm.tools");
        let err = Config::from_json_str(&content, "key".into()).unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
