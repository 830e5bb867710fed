use serde::{Deserialize, Serialize};

/// Display and alerting tier for stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockUrgency {
    Low,
    Medium,
    High,
}

impl StockUrgency {
    pub const fn label(self) -> &'static str {
        match self {
            StockUrgency::Low => "low",
            StockUrgency::Medium => "medium",
            StockUrgency::High => "high",
        }
    }
}

/// Aggregate blood-type summaries: 20 units or fewer is high, 50 or fewer is medium.
pub fn classify_by_absolute_count(units: u32) -> StockUrgency {
    if units <= 20 {
        StockUrgency::High
    } else if units <= 50 {
        StockUrgency::Medium
    } else {
        StockUrgency::Low
    }
}

/// Per-lot views and low-stock alerts: below 20% of capacity is high, below 50% is medium.
///
/// A lot without capacity is reported as high.
pub fn classify_by_capacity_fraction(units: u32, max_units: u32) -> StockUrgency {
    if max_units == 0 {
        return StockUrgency::High;
    }

    let units = f64::from(units);
    let capacity = f64::from(max_units);
    if units < capacity * 0.2 {
        StockUrgency::High
    } else if units < capacity * 0.5 {
        StockUrgency::Medium
    } else {
        StockUrgency::Low
    }
}

/// Per-lot expiry: a week or less is high, two weeks or less is medium.
pub fn classify_by_days_to_expiry(days_until_expiration: i64) -> StockUrgency {
    if days_until_expiration <= 7 {
        StockUrgency::High
    } else if days_until_expiration <= 14 {
        StockUrgency::Medium
    } else {
        StockUrgency::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_thresholds_are_inclusive() {
        assert_eq!(classify_by_absolute_count(0), StockUrgency::High);
        assert_eq!(classify_by_absolute_count(20), StockUrgency::High);
        assert_eq!(classify_by_absolute_count(21), StockUrgency::Medium);
        assert_eq!(classify_by_absolute_count(50), StockUrgency::Medium);
        assert_eq!(classify_by_absolute_count(51), StockUrgency::Low);
    }

    #[test]
    fn fraction_thresholds_are_exclusive() {
        assert_eq!(classify_by_capacity_fraction(19, 100), StockUrgency::High);
        assert_eq!(classify_by_capacity_fraction(20, 100), StockUrgency::Medium);
        assert_eq!(classify_by_capacity_fraction(49, 100), StockUrgency::Medium);
        assert_eq!(classify_by_capacity_fraction(50, 100), StockUrgency::Low);
        assert_eq!(classify_by_capacity_fraction(3, 10), StockUrgency::Medium);
    }

    #[test]
    fn zero_capacity_is_high() {
        assert_eq!(classify_by_capacity_fraction(0, 0), StockUrgency::High);
        assert_eq!(classify_by_capacity_fraction(40, 0), StockUrgency::High);
    }

    #[test]
    fn rules_disagree_on_the_same_count() {
        assert_eq!(classify_by_absolute_count(20), StockUrgency::High);
        assert_eq!(classify_by_capacity_fraction(20, 100), StockUrgency::Medium);
    }

    #[test]
    fn expiry_thresholds() {
        assert_eq!(classify_by_days_to_expiry(-1), StockUrgency::High);
        assert_eq!(classify_by_days_to_expiry(7), StockUrgency::High);
        assert_eq!(classify_by_days_to_expiry(8), StockUrgency::Medium);
        assert_eq!(classify_by_days_to_expiry(14), StockUrgency::Medium);
        assert_eq!(classify_by_days_to_expiry(15), StockUrgency::Low);
    }
}
