use std::io::IsTerminal;

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::address::Address;
use crate::scoring::{DaysActiveSource, ScoreResult};

/// Currency symbols used in summaries and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub native: String,
    pub stablecoin: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            native: "ETH".to_string(),
            stablecoin: "USDC".to_string(),
        }
    }
}

/// 200 body of `GET /check-wallet`. Field order is the wire order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckWalletResponse {
    pub address: String,
    pub stats: StatsBody,
    pub allocation: AllocationBody,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsBody {
    pub total_transactions: u64,
    pub eth_transactions: u64,
    pub usdc_transactions: u64,
    pub eth_volume: String,
    pub usdc_volume: String,
    pub contracts_deployed: u64,
    pub days_active: u64,
    pub current_balance: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AllocationBody {
    pub tokens: String,
    pub points: String,
}

pub fn build_response(
    address: &Address,
    result: &ScoreResult,
    labels: &Labels,
) -> CheckWalletResponse {
    let stats = &result.stats;
    CheckWalletResponse {
        address: address.to_string(),
        stats: StatsBody {
            total_transactions: stats.total_transactions,
            eth_transactions: stats.native_transactions,
            usdc_transactions: stats.stablecoin_transfers,
            eth_volume: format!("{:.4}", stats.native_volume),
            usdc_volume: format!("{:.2}", stats.stablecoin_volume),
            contracts_deployed: stats.contracts_deployed,
            days_active: stats.days_active,
            current_balance: format!("{:.4}", stats.current_balance),
        },
        allocation: AllocationBody {
            tokens: format_tokens(result.tokens),
            points: format!("{:.2}", result.points),
        },
        summary: summary_line(result, labels),
    }
}

/// One-line human summary, e.g.
/// "100 transactions • 1.50 ETH • 0.00 USDC • 0 contracts • 67 days active"
pub fn summary_line(result: &ScoreResult, labels: &Labels) -> String {
    let stats = &result.stats;
    format!(
        "{} transactions • {:.2} {} • {:.2} {} • {} contracts • {} days active",
        stats.total_transactions,
        stats.native_volume,
        labels.native,
        stats.stablecoin_volume,
        labels.stablecoin,
        stats.contracts_deployed,
        stats.days_active
    )
}

/// Token amount with en-US digit grouping ("6,912,500").
pub fn format_tokens(tokens: u64) -> String {
    group_thousands(tokens)
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Multi-line terminal report for the `check` command.
pub fn format_report(
    address: &Address,
    result: &ScoreResult,
    labels: &Labels,
    scoring_version: &str,
    use_colors: bool,
) -> String {
    let stats = &result.stats;
    let days_note = match result.days_source {
        DaysActiveSource::History => "from history",
        DaysActiveSource::Estimated => "estimated",
    };

    let mut lines = Vec::new();
    if use_colors {
        lines.push(format!("{}", address.as_str().bold()));
    } else {
        lines.push(address.to_string());
    }
    lines.push(format!("  Transactions: {}", stats.total_transactions));
    lines.push(format!("  Volume: {:.4} {}", stats.native_volume, labels.native));
    lines.push(format!("  {} volume: {:.2}", labels.stablecoin, stats.stablecoin_volume));
    lines.push(format!("  Contracts: {}", stats.contracts_deployed));
    lines.push(format!("  Days active: {} ({})", stats.days_active, days_note));
    lines.push(format!("  Balance: {:.4} {}", stats.current_balance, labels.native));
    lines.push(format!("  Score breakdown (weights {}):", scoring_version));
    for factor in &result.factors {
        let points = format!("{:>10.2}", factor.points);
        if use_colors {
            lines.push(format!(
                "    {} {:<12} {}",
                points.cyan(),
                factor.label,
                factor.description.dimmed()
            ));
        } else {
            lines.push(format!("    {} {:<12} {}", points, factor.label, factor.description));
        }
    }

    let points = format!("{:.2}", result.points);
    let tokens = format_tokens(result.tokens);
    if use_colors {
        lines.push(format!("  Points: {}", points.bold()));
        lines.push(format!("  Allocation: {} tokens", tokens.green().bold()));
    } else {
        lines.push(format!("  Points: {}", points));
        lines.push(format!("  Allocation: {} tokens", tokens));
    }

    lines.join("\n")
}
