//! Percent-reduction computation for seizure-day counts
//!
//! Stage 1 reports counts as free-form strings that are either numeric
//! or the "I don't know" sentinel. They are lifted into a sum type here
//! so the unknown case never leaks into float arithmetic.

use std::fmt;

use crate::model::entities::UNKNOWN;

/// A seizure-day count: a number or an acknowledged unknown
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeizureCount {
    Known(f64),
    Unknown,
}

impl SeizureCount {
    /// Parse a stage-1 value string
    ///
    /// The sentinel is matched case-insensitively. Anything that is
    /// neither the sentinel nor numeric is treated as unknown, not as
    /// an error.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(UNKNOWN) {
            return SeizureCount::Unknown;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => SeizureCount::Known(n),
            _ => SeizureCount::Unknown,
        }
    }
}

impl fmt::Display for SeizureCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeizureCount::Known(n) => write!(f, "{}", n),
            SeizureCount::Unknown => write!(f, "{}", UNKNOWN),
        }
    }
}

/// Percent reduction between baseline and post-treatment counts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentReduction {
    Known(f64),
    Unknown,
}

impl fmt::Display for PercentReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentReduction::Known(n) => write!(f, "{:.1}%", n),
            PercentReduction::Unknown => write!(f, "{}", UNKNOWN),
        }
    }
}

/// Compute `(baseline - post) / baseline * 100`
///
/// Unknown operands propagate. A zero baseline with a zero post count is
/// a true 0% change; a zero baseline with a nonzero post count has no
/// defined reduction and is reported as unknown.
pub fn percent_reduction(baseline: SeizureCount, post: SeizureCount) -> PercentReduction {
    let (SeizureCount::Known(b), SeizureCount::Known(p)) = (baseline, post) else {
        return PercentReduction::Unknown;
    };

    if b > 0.0 {
        PercentReduction::Known((b - p) / b * 100.0)
    } else if b == 0.0 && p == 0.0 {
        PercentReduction::Known(0.0)
    } else {
        PercentReduction::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(baseline: &str, post: &str) -> PercentReduction {
        percent_reduction(SeizureCount::parse(baseline), SeizureCount::parse(post))
    }

    #[test]
    fn full_reduction() {
        assert_eq!(reduce("50", "0"), PercentReduction::Known(100.0));
    }

    #[test]
    fn zero_baseline_zero_post() {
        assert_eq!(reduce("0", "0"), PercentReduction::Known(0.0));
    }

    #[test]
    fn zero_baseline_nonzero_post_is_undefined() {
        assert_eq!(reduce("0", "4"), PercentReduction::Unknown);
    }

    #[test]
    fn sentinel_propagates() {
        assert_eq!(reduce("I don't know", "10"), PercentReduction::Unknown);
        assert_eq!(reduce("96", "I don't know"), PercentReduction::Unknown);
    }

    #[test]
    fn sentinel_is_case_insensitive() {
        assert_eq!(reduce("i don't know", "10"), PercentReduction::Unknown);
        assert_eq!(reduce("I DON'T KNOW", "10"), PercentReduction::Unknown);
    }

    #[test]
    fn non_numeric_degrades_to_unknown() {
        assert_eq!(reduce("abc", "10"), PercentReduction::Unknown);
        assert_eq!(reduce("96", "a few"), PercentReduction::Unknown);
    }

    #[test]
    fn seizure_increase_is_negative() {
        let PercentReduction::Known(value) = reduce("96", "200") else {
            panic!("expected known reduction");
        };
        assert!((value - (-108.333)).abs() < 0.01);
    }

    #[test]
    fn partial_reduction() {
        assert_eq!(reduce("96", "48"), PercentReduction::Known(50.0));
    }

    #[test]
    fn count_parse_handles_whitespace_and_floats() {
        assert_eq!(SeizureCount::parse(" 12.5 "), SeizureCount::Known(12.5));
        assert_eq!(SeizureCount::parse(""), SeizureCount::Unknown);
    }

    #[test]
    fn display_renders_sentinel() {
        assert_eq!(SeizureCount::Unknown.to_string(), "I don't know");
        assert_eq!(PercentReduction::Known(50.0).to_string(), "50.0%");
        assert_eq!(PercentReduction::Unknown.to_string(), "I don't know");
    }
}
