use std::time::Duration;

use serde_json::{json, Value};

use super::failover::{first_success, Endpoint};
use crate::address::Address;
use crate::error::{EndpointError, FetchError};

/// `balanceOf(address)` selector
const BALANCE_OF_SELECTOR: &str = "70a08231";

/// JSON-RPC client over an ordered list of redundant endpoints.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoints: Vec<Endpoint>,
}

impl RpcClient {
    pub fn new(endpoints: Vec<Endpoint>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wallet-check/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoints })
    }

    /// Call `method` with failover, decoding the `result` field with `decode`.
    ///
    /// A result that fails to decode counts as a failure of that endpoint.
    pub async fn call<T, D>(&self, method: &str, params: Value, decode: D) -> Result<T, FetchError>
    where
        D: Fn(&Value) -> Result<T, EndpointError>,
    {
        first_success(method, &self.endpoints, |endpoint| {
            let params = params.clone();
            let decode = &decode;
            async move {
                let result = self.call_endpoint(endpoint, method, params).await?;
                decode(&result)
            }
        })
        .await
    }

    async fn call_endpoint(
        &self,
        endpoint: &Endpoint,
        method: &str,
        params: Value,
    ) -> Result<Value, EndpointError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1u64,
            "method": method,
            "params": params,
        });

        let resp = self
            .http
            .post(&endpoint.url)
            .json(&payload)
            .send()
            .await
            .map_err(EndpointError::transport)?;

        if !resp.status().is_success() {
            return Err(EndpointError::Status(resp.status().as_u16()));
        }

        let body = resp.bytes().await.map_err(EndpointError::transport)?;
        let body: Value =
            serde_json::from_slice(&body).map_err(|e| EndpointError::Decode(e.to_string()))?;

        if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
            return Err(EndpointError::Rpc {
                code: err.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        match body.get("result") {
            Some(result) if !result.is_null() => Ok(result.clone()),
            _ => Err(EndpointError::Decode("response has no result".to_string())),
        }
    }

    pub async fn transaction_count(&self, address: &Address) -> Result<u64, FetchError> {
        self.call(
            "eth_getTransactionCount",
            json!([address.as_str(), "latest"]),
            quantity_u64,
        )
        .await
    }

    /// Native balance in wei.
    pub async fn balance(&self, address: &Address) -> Result<f64, FetchError> {
        self.call("eth_getBalance", json!([address.as_str(), "latest"]), quantity_f64)
            .await
    }

    /// Raw ERC-20 `balanceOf` result (not scaled by decimals).
    pub async fn token_balance(
        &self,
        token: &Address,
        holder: &Address,
    ) -> Result<f64, FetchError> {
        self.call(
            "eth_call",
            json!([
                { "to": token.as_str(), "data": balance_of_calldata(holder) },
                "latest"
            ]),
            quantity_f64,
        )
        .await
    }

    /// Whether any bytecode is deployed at `address`.
    pub async fn has_code(&self, address: &Address) -> Result<bool, FetchError> {
        self.call("eth_getCode", json!([address.as_str(), "latest"]), code_present)
            .await
    }
}

/// ABI-encoded `balanceOf(holder)` call data.
pub fn balance_of_calldata(holder: &Address) -> String {
    format!(
        "0x{}{}{}",
        BALANCE_OF_SELECTOR,
        "0".repeat(24),
        holder.hex_digits().to_ascii_lowercase()
    )
}

fn as_hex_str(value: &Value) -> Result<&str, EndpointError> {
    let s = value
        .as_str()
        .ok_or_else(|| EndpointError::Decode(format!("expected hex string, got {}", value)))?;
    if !s.starts_with("0x") {
        return Err(EndpointError::Decode(format!("missing 0x prefix: {}", s)));
    }
    Ok(s)
}

/// `eth_getCode` result: `"0x"` and `""` both mean no code.
pub fn code_present(value: &Value) -> Result<bool, EndpointError> {
    if value.as_str() == Some("") {
        return Ok(false);
    }
    let code = as_hex_str(value)?;
    Ok(code.len() > 2)
}

/// Decode a hex quantity of any width into an f64. `"0x"` decodes to zero.
pub fn quantity_f64(value: &Value) -> Result<f64, EndpointError> {
    let s = as_hex_str(value)?;
    s[2..].chars().try_fold(0f64, |acc, c| {
        c.to_digit(16)
            .map(|d| acc * 16.0 + d as f64)
            .ok_or_else(|| EndpointError::Decode(format!("invalid hex quantity: {}", s)))
    })
}

pub fn quantity_u64(value: &Value) -> Result<u64, EndpointError> {
    let s = as_hex_str(value)?;
    let digits = s[2..].trim_start_matches('0');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EndpointError::Decode(format!("invalid hex quantity: {}", s)));
    }
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| EndpointError::Decode(format!("invalid quantity {}: {}", s, e)))
}
