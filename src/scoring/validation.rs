use super::config::ScoringConfig;
use super::factors::RangeOp;

/// Validate the weight table at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.version.trim().is_empty() {
        errors.push("scoring.version: must not be empty".to_string());
    }

    let coefficients = [
        ("per_transaction", config.per_transaction),
        ("per_native_volume", config.per_native_volume),
        ("per_active_day", config.per_active_day),
        ("per_contract", config.per_contract),
        ("estimate.native_volume_per_tx", config.estimate.native_volume_per_tx),
        (
            "estimate.stablecoin_volume_multiplier",
            config.estimate.stablecoin_volume_multiplier,
        ),
        ("estimate.stablecoin_tx_share", config.estimate.stablecoin_tx_share),
    ];
    for (name, value) in coefficients {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("scoring.{}: must be a non-negative number", name));
        }
    }

    if !config.tokens_per_point.is_finite() || config.tokens_per_point <= 0.0 {
        errors.push("scoring.tokens_per_point: must be greater than zero".to_string());
    }

    let txs_per_day = config.estimate.txs_per_active_day;
    if !txs_per_day.is_finite() || txs_per_day <= 0.0 {
        errors.push("scoring.estimate.txs_per_active_day: must be greater than zero".to_string());
    }

    for (i, bucket) in config.stablecoin_buckets.iter().enumerate() {
        if let Err(e) = RangeOp::parse(&bucket.range) {
            errors.push(format!(
                "scoring.stablecoin_buckets[{}].range: invalid '{}' - {}",
                i, bucket.range, e
            ));
        }
        if !bucket.points.is_finite() || bucket.points < 0.0 {
            errors.push(format!(
                "scoring.stablecoin_buckets[{}].points: must be a non-negative number",
                i
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
