use serde::{Deserialize, Serialize};

/// Versioned weight table.
///
/// Every coefficient that turns an [`ActivitySnapshot`](crate::chain::ActivitySnapshot)
/// into points and tokens lives here, so changing the formula means changing
/// (and re-versioning) this table rather than the engine.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   version: v1
///   per_transaction: 1.2
///   per_native_volume: 15
///   per_active_day: 2
///   per_contract: 100
///   stablecoin_buckets:
///     - { range: ">50", points: 50 }
///   tokens_per_point: 25000
///   max_allocation: 25000000
///   estimate:
///     native_volume_per_tx: 0.015
///     txs_per_active_day: 1.5
///     max_days_active: 365
///     stablecoin_volume_multiplier: 2.5
///     stablecoin_tx_share: 0.3
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Label reported in logs so score changes can be traced to a table
    pub version: String,

    /// Points per transaction sent
    pub per_transaction: f64,

    /// Points per whole unit of native volume
    pub per_native_volume: f64,

    /// Points per active day
    pub per_active_day: f64,

    /// Flat points per deployed contract
    pub per_contract: f64,

    /// Bonus buckets keyed on stablecoin balance. First match wins.
    pub stablecoin_buckets: Vec<BalanceBucket>,

    /// Allocation slope
    pub tokens_per_point: f64,

    /// Per-user allocation cap
    pub max_allocation: u64,

    /// Heuristics used when no transaction history is available
    pub estimate: EstimateConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            per_transaction: 1.2,
            per_native_volume: 15.0,
            per_active_day: 2.0,
            per_contract: 100.0,
            stablecoin_buckets: vec![BalanceBucket {
                range: ">50".to_string(),
                points: 50.0,
            }],
            tokens_per_point: 25_000.0,
            max_allocation: 25_000_000,
            estimate: EstimateConfig::default(),
        }
    }
}

/// Stablecoin balance bucket.
///
/// Range format: "<N", "<=N", ">N", ">=N", "N-M" (inclusive range), "N"
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BalanceBucket {
    pub range: String,
    pub points: f64,
}

/// Count-based estimates for deployments without explorer history.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EstimateConfig {
    /// Assumed native volume per transaction
    pub native_volume_per_tx: f64,

    /// Assumed transactions per active day
    pub txs_per_active_day: f64,

    /// Upper bound on estimated days active
    pub max_days_active: u64,

    /// Stablecoin volume as a multiple of the current balance
    pub stablecoin_volume_multiplier: f64,

    /// Share of transactions assumed to be stablecoin transfers
    pub stablecoin_tx_share: f64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            native_volume_per_tx: 0.015,
            txs_per_active_day: 1.5,
            max_days_active: 365,
            stablecoin_volume_multiplier: 2.5,
            stablecoin_tx_share: 0.3,
        }
    }
}
