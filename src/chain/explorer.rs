use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::failover::{first_success, Endpoint};
use super::types::{TokenTransfer, Transaction};
use crate::address::Address;
use crate::error::{EndpointError, FetchError};

const WEI_PER_ETH: f64 = 1e18;

/// Explorer message for an address without any activity. Returned with
/// `status: "0"` but it is not a failure.
const NO_TRANSACTIONS: &str = "No transactions found";

/// Largest page Etherscan-compatible APIs serve for `txlist`/`tokentx`.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Pages fetched per query before the history is cut off with a warning.
pub const MAX_PAGES: usize = 20;

/// Client for an Etherscan-compatible `module=account` API.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: reqwest::Client,
    endpoints: Vec<Endpoint>,
    api_key: Option<String>,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// Raw explorer row that knows which block it came from.
trait ExplorerRow: DeserializeOwned {
    fn block_number(&self) -> &str;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    block_number: String,
    hash: String,
    time_stamp: String,
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    #[serde(default)]
    is_error: String,
    #[serde(default)]
    contract_address: String,
}

impl ExplorerRow for RawTransaction {
    fn block_number(&self) -> &str {
        &self.block_number
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenTransfer {
    block_number: String,
    hash: String,
    time_stamp: String,
    value: String,
    token_decimal: String,
}

impl ExplorerRow for RawTokenTransfer {
    fn block_number(&self) -> &str {
        &self.block_number
    }
}

impl ExplorerClient {
    pub fn new(
        endpoints: Vec<Endpoint>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wallet-check/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoints,
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Rows requested per page (`offset`). Values below 1 are treated as 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Full native transaction list, oldest first.
    pub async fn transactions(&self, address: &Address) -> Result<Vec<Transaction>, FetchError> {
        let filters = [("action", "txlist"), ("address", address.as_str())];
        self.account_query("txlist", &filters, parse_transaction)
            .await
    }

    /// Transfers of a single token contract in or out of `address`.
    pub async fn token_transfers(
        &self,
        address: &Address,
        token: &Address,
    ) -> Result<Vec<TokenTransfer>, FetchError> {
        let filters = [
            ("action", "tokentx"),
            ("contractaddress", token.as_str()),
            ("address", address.as_str()),
        ];
        self.account_query("tokentx", &filters, parse_token_transfer)
            .await
    }

    /// Run one account query to completion, page by page.
    ///
    /// Pages are walked by block rather than page number because explorers
    /// refuse `page * offset` beyond their row limit. A full page may stop
    /// part-way through its last block, so that block is dropped and becomes
    /// the start of the next page. Each page fails over on its own.
    async fn account_query<R, T>(
        &self,
        operation: &str,
        filters: &[(&str, &str)],
        parse: fn(R) -> Result<T, EndpointError>,
    ) -> Result<Vec<T>, FetchError>
    where
        R: ExplorerRow,
    {
        let mut rows = Vec::new();
        let mut start_block = 0u64;

        for page in 1..=MAX_PAGES {
            let batch = first_success(operation, &self.endpoints, |endpoint| {
                self.fetch_page(endpoint, filters, start_block, parse)
            })
            .await?;

            if batch.len() < self.page_size {
                rows.extend(batch.into_iter().map(|(_, row)| row));
                return Ok(rows);
            }

            let last_block = batch.last().map(|(block, _)| *block).unwrap_or(start_block);
            let (complete, tail): (Vec<_>, Vec<_>) =
                batch.into_iter().partition(|(block, _)| *block < last_block);

            if complete.is_empty() {
                warn!(
                    operation,
                    block = last_block,
                    page_size = self.page_size,
                    "single block fills a whole page, remaining rows in it are skipped"
                );
                rows.extend(tail.into_iter().map(|(_, row)| row));
                start_block = last_block + 1;
            } else {
                rows.extend(complete.into_iter().map(|(_, row)| row));
                start_block = last_block;
            }
            debug!(
                operation,
                page,
                rows = rows.len(),
                next_block = start_block,
                "explorer page full"
            );
        }

        warn!(
            operation,
            pages = MAX_PAGES,
            rows = rows.len(),
            "explorer history truncated at page limit"
        );
        Ok(rows)
    }

    async fn fetch_page<R, T>(
        &self,
        endpoint: &Endpoint,
        filters: &[(&str, &str)],
        start_block: u64,
        parse: fn(R) -> Result<T, EndpointError>,
    ) -> Result<Vec<(u64, T)>, EndpointError>
    where
        R: ExplorerRow,
    {
        let start_block = start_block.to_string();
        let offset = self.page_size.to_string();
        let mut request = self
            .http
            .get(&endpoint.url)
            .query(&[("module", "account")])
            .query(filters)
            .query(&[
                ("startblock", start_block.as_str()),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", offset.as_str()),
                ("sort", "asc"),
            ]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let resp = request.send().await.map_err(EndpointError::transport)?;
        if !resp.status().is_success() {
            return Err(EndpointError::Status(resp.status().as_u16()));
        }

        let body = resp.bytes().await.map_err(EndpointError::transport)?;
        let envelope: Envelope =
            serde_json::from_slice(&body).map_err(|e| EndpointError::Decode(e.to_string()))?;

        // Rows that fail to parse fail the endpoint, not the request.
        decode_envelope::<R>(envelope)?
            .into_iter()
            .map(|raw| -> Result<(u64, T), EndpointError> {
                let block = parse_block(raw.block_number())?;
                Ok((block, parse(raw)?))
            })
            .collect()
    }
}

fn decode_envelope<T: DeserializeOwned>(envelope: Envelope) -> Result<Vec<T>, EndpointError> {
    if envelope.status != "1" {
        if envelope.message.starts_with(NO_TRANSACTIONS) {
            return Ok(Vec::new());
        }
        // `result` holds a reason string such as "Invalid API Key" or a rate
        // limit notice. Neither echoes the key itself.
        let reason = envelope
            .result
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| envelope.message.clone());
        return Err(EndpointError::Explorer(reason));
    }

    serde_json::from_value(envelope.result).map_err(|e| EndpointError::Decode(e.to_string()))
}

fn parse_block(raw: &str) -> Result<u64, EndpointError> {
    raw.trim()
        .parse()
        .map_err(|_| EndpointError::Decode(format!("invalid blockNumber '{}'", raw)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, EndpointError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| EndpointError::Decode(format!("invalid timestamp '{}'", raw)))
}

/// Decimal integer string into f64, scaled down by `10^decimals`.
fn parse_scaled(raw: &str, decimals: u32) -> Result<f64, EndpointError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(EndpointError::Decode(format!("invalid amount '{}'", raw)));
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| EndpointError::Decode(format!("invalid amount '{}'", raw)))?;
    Ok(value / 10f64.powi(decimals as i32))
}

fn parse_transaction(raw: RawTransaction) -> Result<Transaction, EndpointError> {
    Ok(Transaction {
        timestamp: parse_timestamp(&raw.time_stamp)?,
        value: parse_scaled(&raw.value, 0)? / WEI_PER_ETH,
        to: Some(raw.to).filter(|to| !to.is_empty()),
        contract_created: Some(raw.contract_address).filter(|c| !c.is_empty()),
        failed: raw.is_error == "1",
        from: raw.from,
        hash: raw.hash,
    })
}

fn parse_token_transfer(raw: RawTokenTransfer) -> Result<TokenTransfer, EndpointError> {
    let decimals: u32 = raw.token_decimal.trim().parse().map_err(|_| {
        EndpointError::Decode(format!("invalid tokenDecimal '{}'", raw.token_decimal))
    })?;
    Ok(TokenTransfer {
        timestamp: parse_timestamp(&raw.time_stamp)?,
        value: parse_scaled(&raw.value, decimals)?,
        hash: raw.hash,
    })
}
