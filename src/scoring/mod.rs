pub mod config;
pub mod factors;
pub mod engine;
pub mod validation;

pub use config::*;
pub use factors::RangeOp;
pub use engine::{
    allocation, calculate_score, ActivityStats, DaysActiveSource, FactorContribution, ScoreResult,
};
pub use validation::validate_scoring;
