use std::time::Duration;

use async_trait::async_trait;
use ethers::{types::U256, utils::parse_units};
use reqwest::Client;
use serde::Deserialize;

pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";

#[derive(Debug, thiserror::Error)]
pub enum GasPriceError {
    #[error("Gas price request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gas oracle returned an error: {0}")]
    Api(String),

    #[error("Gas oracle returned unparsable price {0:?}")]
    Parse(String),
}

/// Source of the current "fast" gas price.
#[async_trait]
pub trait GasPriceFeed: Send + Sync {
    async fn fast_gas_price(&self) -> Result<U256, GasPriceError>;
}

/// Etherscan gas tracker.
pub struct EtherscanGasFeed {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GasOracle {
    #[serde(rename = "FastGasPrice")]
    fast_gas_price: String,
}

impl EtherscanGasFeed {
    pub fn new(api_key: String) -> Result<Self, GasPriceError> {
        Self::with_base_url(api_key, ETHERSCAN_API_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, GasPriceError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            api_key,
            base_url: base_url.to_owned(),
            client,
        })
    }
}

#[async_trait]
impl GasPriceFeed for EtherscanGasFeed {
    async fn fast_gas_price(&self) -> Result<U256, GasPriceError> {
        let response: EtherscanResponse = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "gastracker"),
                ("action", "gasoracle"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "1" {
            return Err(GasPriceError::Api(format!(
                "{}: {}",
                response.message, response.result
            )));
        }

        let oracle: GasOracle = serde_json::from_value(response.result)
            .map_err(|err| GasPriceError::Api(err.to_string()))?;

        let gwei = oracle.fast_gas_price.trim();
        parse_units(gwei, "gwei")
            .map(U256::from)
            .map_err(|_| GasPriceError::Parse(gwei.to_owned()))
    }
}
