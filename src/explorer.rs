//! Block-explorer client used to retrieve verified contract ABIs.

use crate::config::Config;
use crate::error::{Error, Result};
use ethers::abi::Abi;
use ethers::types::Address;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response envelope shared by Etherscan-family explorers.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: String,
}

impl Envelope {
    /// `status == "1"` carries the ABI as a JSON-encoded string in `result`.
    pub fn into_abi(self) -> Result<Abi> {
        if self.status != "1" {
            return Err(Error::Upstream(self.message));
        }
        Ok(serde_json::from_str(&self.result)?)
    }
}

#[derive(Clone, Debug)]
pub struct AbiFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AbiFetcher {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.explorer.url.clone(), config.api_key.clone())
    }

    pub async fn fetch_abi(&self, address: Address) -> Result<Abi> {
        let address = format!("0x{:x}", address);
        debug!(%address, url = %self.base_url, "fetching contract abi");

        let envelope: Envelope = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "contract"),
                ("action", "getabi"),
                ("address", address.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .header("Content-Accept", "application/json")
            .send()
            .await?
            .json()
            .await?;

        envelope.into_abi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_status_keeps_upstream_message() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"status":"0","message":"Contract source code not verified","result":""}"#,
        )
        .unwrap();
        match envelope.into_abi() {
            Err(Error::Upstream(message)) => {
                assert_eq!(message, "Contract source code not verified")
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn success_parses_result_string() {
        let envelope = Envelope {
            status: "1".into(),
            message: "OK".into(),
            result: r#"[{"type":"function","name":"circulatingSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"}]"#.into(),
        };
        let abi = envelope.into_abi().unwrap();
        let function = abi.function("circulatingSupply").unwrap();
        assert!(function.inputs.is_empty());
        assert_eq!(function.outputs.len(), 1);
    }

    #[test]
    fn malformed_result_is_parse_error() {
        let envelope = Envelope {
            status: "1".into(),
            message: "OK".into(),
            result: "[{not json".into(),
        };
        assert_eq!(envelope.into_abi().unwrap_err().kind(), "parse");
    }
}
