use serde::{Deserialize, Serialize};

use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    /// Required when `upstream.history` is `explorer`
    pub explorer: Option<ExplorerConfig>,
    pub scoring: Option<ScoringConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// JSON-RPC base URLs in priority order
    pub rpc_endpoints: Vec<String>,

    /// Per-call timeout, e.g. "5s" or "1500ms"
    pub timeout: String,

    pub history: HistoryMode,

    /// Symbol shown for native volume in summaries
    pub native_symbol: String,

    pub stablecoin: Option<StablecoinConfig>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            rpc_endpoints: vec![
                "https://mainnet.base.org".to_string(),
                "https://base-rpc.publicnode.com".to_string(),
                "https://base.llamarpc.com".to_string(),
            ],
            timeout: "5s".to_string(),
            history: HistoryMode::Estimated,
            native_symbol: "ETH".to_string(),
            stablecoin: Some(StablecoinConfig::default()),
        }
    }
}

/// How `days_active` and volumes are derived for this deployment.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Count-based estimates from JSON-RPC facts only
    #[default]
    Estimated,
    /// Real transaction history from the explorer API
    Explorer,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StablecoinConfig {
    pub contract: String,
    pub decimals: u32,
    pub symbol: String,
}

impl Default for StablecoinConfig {
    fn default() -> Self {
        // USDC on Base
        Self {
            contract: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
            decimals: 6,
            symbol: "USDC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Etherscan-compatible API base URLs in priority order
    pub endpoints: Vec<String>,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Rows requested per page; explorers cap this at 10,000
    pub page_size: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["https://api.basescan.org/api".to_string()],
            api_key_env: "EXPLORER_API_KEY".to_string(),
            page_size: crate::chain::explorer::DEFAULT_PAGE_SIZE,
        }
    }
}
