use chrono::{DateTime, Utc};

/// On-chain facts for one address, gathered fresh on every request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivitySnapshot {
    pub tx_count: u64,
    /// Native balance in whole units (wei / 1e18)
    pub native_balance: f64,
    /// Stablecoin balance in whole token units
    pub stablecoin_balance: f64,
    pub has_code: bool,
    /// Present only when the deployment reads explorer history
    pub history: Option<History>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct History {
    pub transactions: Vec<Transaction>,
    pub token_transfers: Vec<TokenTransfer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: Option<String>, // None for contract creation
    pub value: f64,         // Native units
    pub contract_created: Option<String>,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransfer {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64, // Token units, already scaled by decimals
}

impl History {
    /// Earliest and latest native transaction timestamps.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.transactions.iter().map(|tx| tx.timestamp).min()?;
        let last = self.transactions.iter().map(|tx| tx.timestamp).max()?;
        Some((first, last))
    }
}

impl Transaction {
    /// Whether `address` deployed a contract with this transaction.
    pub fn is_deployment_by(&self, address: &str) -> bool {
        !self.failed
            && self.to.is_none()
            && self.contract_created.is_some()
            && self.from.eq_ignore_ascii_case(address)
    }
}
