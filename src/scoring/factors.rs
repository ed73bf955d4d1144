use anyhow::{bail, Result};

/// Numeric range used by balance buckets.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeOp {
    LessThan(f64),
    LessEqual(f64),
    GreaterThan(f64),
    GreaterEqual(f64),
    Equal(f64),
    Between(f64, f64), // Inclusive range: N-M
}

impl RangeOp {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let op = if let Some(val) = s.strip_prefix(">=") {
            RangeOp::GreaterEqual(parse_bound(val)?)
        } else if let Some(val) = s.strip_prefix("<=") {
            RangeOp::LessEqual(parse_bound(val)?)
        } else if let Some(val) = s.strip_prefix('>') {
            RangeOp::GreaterThan(parse_bound(val)?)
        } else if let Some(val) = s.strip_prefix('<') {
            RangeOp::LessThan(parse_bound(val)?)
        } else if s.contains('-') && !s.starts_with('-') {
            // Range format: "100-500"
            let parts: Vec<&str> = s.split('-').collect();
            if parts.len() != 2 {
                bail!("Invalid range format: {}", s)
            }
            let low = parse_bound(parts[0])?;
            let high = parse_bound(parts[1])?;
            if low > high {
                bail!("Range lower bound exceeds upper bound: {}", s)
            }
            RangeOp::Between(low, high)
        } else {
            RangeOp::Equal(parse_bound(s)?)
        };
        Ok(op)
    }

    pub fn matches(&self, value: f64) -> bool {
        match self {
            RangeOp::LessThan(n) => value < *n,
            RangeOp::LessEqual(n) => value <= *n,
            RangeOp::GreaterThan(n) => value > *n,
            RangeOp::GreaterEqual(n) => value >= *n,
            RangeOp::Equal(n) => value == *n,
            RangeOp::Between(low, high) => value >= *low && value <= *high,
        }
    }
}

fn parse_bound(s: &str) -> Result<f64> {
    let value: f64 = s.trim().parse()?;
    if !value.is_finite() || value < 0.0 {
        bail!("Range bound must be a non-negative number: {}", s.trim())
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_less_than() {
        let range = RangeOp::parse("<100").unwrap();
        assert!(range.matches(50.0));
        assert!(!range.matches(100.0));
        assert!(!range.matches(150.0));
    }

    #[test]
    fn test_parse_range_less_equal() {
        let range = RangeOp::parse("<=100").unwrap();
        assert!(range.matches(100.0));
        assert!(!range.matches(100.01));
    }

    #[test]
    fn test_parse_range_greater_than() {
        let range = RangeOp::parse(">50").unwrap();
        assert!(!range.matches(50.0));
        assert!(range.matches(50.000001));
        assert!(range.matches(1_000.0));
    }

    #[test]
    fn test_parse_range_greater_equal() {
        let range = RangeOp::parse(">= 50").unwrap();
        assert!(!range.matches(49.99));
        assert!(range.matches(50.0));
    }

    #[test]
    fn test_parse_range_equal() {
        let range = RangeOp::parse("0").unwrap();
        assert!(range.matches(0.0));
        assert!(!range.matches(0.01));
    }

    #[test]
    fn test_parse_range_between() {
        let range = RangeOp::parse("10.5-500").unwrap();
        assert!(!range.matches(10.0));
        assert!(range.matches(10.5));
        assert!(range.matches(500.0));
        assert!(!range.matches(500.5));
    }

    #[test]
    fn test_parse_range_invalid() {
        assert!(RangeOp::parse("abc").is_err());
        assert!(RangeOp::parse(">").is_err());
        assert!(RangeOp::parse("1-2-3").is_err());
        assert!(RangeOp::parse("500-100").is_err());
        assert!(RangeOp::parse("-5").is_err());
        assert!(RangeOp::parse(">NaN").is_err());
    }
}
