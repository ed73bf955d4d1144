mod schema;

pub use schema::{
    Config, ExplorerConfig, HistoryMode, ServerConfig, StablecoinConfig, UpstreamConfig,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::address::Address;
use crate::chain::explorer::DEFAULT_PAGE_SIZE;
use crate::chain::{ChainFetcher, Endpoint, ExplorerClient, RpcClient, Stablecoin};
use crate::scoring::validate_scoring;

const ENV_BIND: &str = "WALLET_CHECK_BIND";
const ENV_RPC_URLS: &str = "WALLET_CHECK_RPC_URLS";
const ENV_EXPLORER_URLS: &str = "WALLET_CHECK_EXPLORER_URLS";

/// Get the config directory path (~/.config/wallet-check/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("wallet-check"))
}

/// Get the default config file path (~/.config/wallet-check/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file, then apply environment overrides.
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   and falls back to built-in defaults when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            read_config(&path)?
        }
        None => match get_config_path() {
            Some(path) if path.exists() => read_config(&path)?,
            _ => Config::default(),
        },
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

fn read_config(path: &PathBuf) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", path.display()))
}

pub fn parse_config(yaml: &str) -> Result<Config> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_saphyr::from_str(yaml)?)
}

/// Overlay deployment settings from the environment. `lookup` is injected so
/// tests do not touch the process environment.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bind) = lookup(ENV_BIND).filter(|v| !v.trim().is_empty()) {
        config.server.bind = bind.trim().to_string();
    }
    if let Some(urls) = lookup(ENV_RPC_URLS).map(|v| split_list(&v)).filter(|v| !v.is_empty()) {
        config.upstream.rpc_endpoints = urls;
    }
    if let Some(urls) = lookup(ENV_EXPLORER_URLS)
        .map(|v| split_list(&v))
        .filter(|v| !v.is_empty())
    {
        config.explorer.get_or_insert_with(ExplorerConfig::default).endpoints = urls;
    }
    config
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse the upstream timeout.
pub fn upstream_timeout(config: &Config) -> Result<Duration> {
    humantime::parse_duration(config.upstream.timeout.trim())
        .with_context(|| format!("invalid upstream.timeout '{}'", config.upstream.timeout))
}

/// Validate the whole configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
        errors.push(format!("server.bind: invalid socket address '{}'", config.server.bind));
    }

    if config.upstream.rpc_endpoints.is_empty() {
        errors.push("upstream.rpc_endpoints: at least one endpoint is required".to_string());
    }
    for (i, url) in config.upstream.rpc_endpoints.iter().enumerate() {
        if let Err(e) = Endpoint::parse(url) {
            errors.push(format!("upstream.rpc_endpoints[{}]: {}", i, e));
        }
    }

    match humantime::parse_duration(config.upstream.timeout.trim()) {
        Ok(d) if d.is_zero() => {
            errors.push("upstream.timeout: must be greater than zero".to_string())
        }
        Ok(_) => {}
        Err(e) => errors.push(format!(
            "upstream.timeout: invalid format '{}' - {}",
            config.upstream.timeout, e
        )),
    }

    if config.upstream.native_symbol.trim().is_empty() {
        errors.push("upstream.native_symbol: must not be empty".to_string());
    }

    if let Some(ref stablecoin) = config.upstream.stablecoin {
        if Address::parse(&stablecoin.contract).is_err() {
            errors.push(format!(
                "upstream.stablecoin.contract: invalid address '{}'",
                stablecoin.contract
            ));
        }
        if stablecoin.decimals > 36 {
            errors.push("upstream.stablecoin.decimals: must be at most 36".to_string());
        }
        if stablecoin.symbol.trim().is_empty() {
            errors.push("upstream.stablecoin.symbol: must not be empty".to_string());
        }
    }

    match (&config.upstream.history, &config.explorer) {
        (HistoryMode::Explorer, None) => {
            errors.push("explorer: required when upstream.history is 'explorer'".to_string());
        }
        (HistoryMode::Explorer, Some(explorer)) => {
            if explorer.endpoints.is_empty() {
                errors.push("explorer.endpoints: at least one endpoint is required".to_string());
            }
            for (i, url) in explorer.endpoints.iter().enumerate() {
                if let Err(e) = Endpoint::parse(url) {
                    errors.push(format!("explorer.endpoints[{}]: {}", i, e));
                }
            }
            if explorer.page_size == 0 || explorer.page_size > DEFAULT_PAGE_SIZE {
                errors.push(format!(
                    "explorer.page_size: must be between 1 and {}",
                    DEFAULT_PAGE_SIZE
                ));
            }
        }
        (HistoryMode::Estimated, _) => {}
    }

    if let Some(ref scoring) = config.scoring {
        if let Err(scoring_errors) = validate_scoring(scoring) {
            errors.extend(scoring_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Build the chain fetcher for a validated config.
///
/// The explorer client is only constructed in explorer history mode; an
/// `explorer` section in estimated mode is ignored.
pub fn build_fetcher<F>(config: &Config, lookup_env: F) -> Result<ChainFetcher>
where
    F: Fn(&str) -> Option<String>,
{
    let timeout = upstream_timeout(config)?;

    let rpc_endpoints = parse_endpoints(&config.upstream.rpc_endpoints)?;
    let rpc = RpcClient::new(rpc_endpoints, timeout).context("Failed to create RPC client")?;

    let explorer = match (&config.upstream.history, &config.explorer) {
        (HistoryMode::Explorer, Some(explorer)) => {
            let endpoints = parse_endpoints(&explorer.endpoints)?;
            let api_key = lookup_env(&explorer.api_key_env).filter(|k| !k.trim().is_empty());
            if api_key.is_none() {
                tracing::warn!(
                    env = %explorer.api_key_env,
                    "explorer API key not set, requests will be unauthenticated"
                );
            }
            let client = ExplorerClient::new(endpoints, api_key, timeout)
                .context("Failed to create explorer client")?;
            Some(client.with_page_size(explorer.page_size))
        }
        (HistoryMode::Explorer, None) => {
            anyhow::bail!("explorer history mode needs an explorer section")
        }
        (HistoryMode::Estimated, _) => None,
    };

    let stablecoin = match &config.upstream.stablecoin {
        Some(s) => Some(Stablecoin {
            contract: Address::parse(&s.contract)
                .map_err(|e| anyhow::anyhow!("upstream.stablecoin.contract: {}", e))?,
            decimals: s.decimals,
        }),
        None => None,
    };

    Ok(ChainFetcher::new(rpc, explorer, stablecoin))
}

fn parse_endpoints(urls: &[String]) -> Result<Vec<Endpoint>> {
    urls.iter()
        .map(|url| Endpoint::parse(url).map_err(|e| anyhow::anyhow!("endpoint {}: {}", url, e)))
        .collect()
}
