use super::config::ScoringConfig;
use super::factors::RangeOp;
use crate::address::Address;
use crate::chain::{ActivitySnapshot, History};

/// Where `days_active` came from. A deployment produces one or the other,
/// never a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysActiveSource {
    /// First-to-last transaction timestamps
    History,
    /// Derived from transaction count
    Estimated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityStats {
    pub total_transactions: u64,
    /// Native transfers seen in history, or the nonce when estimating
    pub native_transactions: u64,
    pub stablecoin_transfers: u64,
    pub native_volume: f64,
    pub stablecoin_volume: f64,
    pub contracts_deployed: u64,
    pub days_active: u64,
    pub current_balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorContribution {
    pub label: String,       // e.g. "Transactions", "Active days"
    pub description: String, // e.g. "100 x 1.2"
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub stats: ActivityStats,
    pub points: f64,
    pub tokens: u64,
    pub days_source: DaysActiveSource,
    pub factors: Vec<FactorContribution>,
}

/// Derive stats from a snapshot and score them against the weight table.
///
/// Pure: the same snapshot and table always give the same result.
pub fn calculate_score(
    address: &Address,
    snapshot: &ActivitySnapshot,
    config: &ScoringConfig,
) -> ScoreResult {
    let (stats, days_source) = match &snapshot.history {
        Some(history) => (
            stats_from_history(address, snapshot, history),
            DaysActiveSource::History,
        ),
        None => (estimate_stats(snapshot, config), DaysActiveSource::Estimated),
    };

    let mut factors = Vec::new();

    factors.push(FactorContribution {
        label: "Transactions".to_string(),
        description: format!("{} x {}", stats.total_transactions, config.per_transaction),
        points: stats.total_transactions as f64 * config.per_transaction,
    });

    factors.push(FactorContribution {
        label: "Volume".to_string(),
        description: format!("{:.4} x {}", stats.native_volume, config.per_native_volume),
        points: stats.native_volume * config.per_native_volume,
    });

    if let Some((range, bonus)) = match_bucket(snapshot.stablecoin_balance, config) {
        factors.push(FactorContribution {
            label: "Stablecoin".to_string(),
            description: format!(
                "balance {:.2} matched '{}' -> +{}",
                snapshot.stablecoin_balance, range, bonus
            ),
            points: bonus,
        });
    }

    let days_note = match days_source {
        DaysActiveSource::History => "from history",
        DaysActiveSource::Estimated => "estimated",
    };
    factors.push(FactorContribution {
        label: "Active days".to_string(),
        description: format!("{} ({}) x {}", stats.days_active, days_note, config.per_active_day),
        points: stats.days_active as f64 * config.per_active_day,
    });

    factors.push(FactorContribution {
        label: "Contracts".to_string(),
        description: format!("{} x {}", stats.contracts_deployed, config.per_contract),
        points: stats.contracts_deployed as f64 * config.per_contract,
    });

    let points = factors.iter().map(|f| f.points).sum::<f64>().max(0.0);

    ScoreResult {
        stats,
        points,
        tokens: allocation(points, config),
        days_source,
        factors,
    }
}

/// Capped linear allocation: `min(floor(points * tokens_per_point), max_allocation)`.
pub fn allocation(points: f64, config: &ScoringConfig) -> u64 {
    let raw = (points * config.tokens_per_point).floor();
    if raw <= 0.0 {
        return 0;
    }
    (raw as u64).min(config.max_allocation)
}

fn stats_from_history(
    address: &Address,
    snapshot: &ActivitySnapshot,
    history: &History,
) -> ActivityStats {
    let days_active = history
        .time_span()
        .map(|(first, last)| (last - first).num_days().max(0) as u64)
        .unwrap_or(0);

    let native_volume = history
        .transactions
        .iter()
        .filter(|tx| !tx.failed)
        .map(|tx| tx.value)
        .sum();

    let stablecoin_volume = history.token_transfers.iter().map(|t| t.value).sum();

    let contracts_deployed = history
        .transactions
        .iter()
        .filter(|tx| tx.is_deployment_by(address.as_str()))
        .count() as u64;

    ActivityStats {
        total_transactions: snapshot.tx_count,
        native_transactions: history.transactions.len() as u64,
        stablecoin_transfers: history.token_transfers.len() as u64,
        native_volume,
        stablecoin_volume,
        contracts_deployed,
        days_active,
        current_balance: snapshot.native_balance,
    }
}

fn estimate_stats(snapshot: &ActivitySnapshot, config: &ScoringConfig) -> ActivityStats {
    let estimate = &config.estimate;
    let tx_count = snapshot.tx_count;

    let days_active = if tx_count == 0 || estimate.txs_per_active_day <= 0.0 {
        0
    } else {
        let days = (tx_count as f64 / estimate.txs_per_active_day).ceil() as u64;
        days.min(estimate.max_days_active)
    };

    ActivityStats {
        total_transactions: tx_count,
        native_transactions: tx_count,
        stablecoin_transfers: (tx_count as f64 * estimate.stablecoin_tx_share).floor() as u64,
        native_volume: tx_count as f64 * estimate.native_volume_per_tx,
        stablecoin_volume: snapshot.stablecoin_balance * estimate.stablecoin_volume_multiplier,
        contracts_deployed: u64::from(snapshot.has_code),
        days_active,
        current_balance: snapshot.native_balance,
    }
}

fn match_bucket<'a>(balance: f64, config: &'a ScoringConfig) -> Option<(&'a str, f64)> {
    config.stablecoin_buckets.iter().find_map(|bucket| {
        let range = RangeOp::parse(&bucket.range).ok()?;
        range
            .matches(balance)
            .then_some((bucket.range.as_str(), bucket.points))
    })
}
