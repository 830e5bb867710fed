use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ceil_days;

/// Urgency tier declared on a blood request.
///
/// Parsing never fails and is case-sensitive: anything other than the exact
/// lowercase labels becomes [`RequestUrgency::Unrecognized`], which scores zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum RequestUrgency {
    Low,
    #[default]
    Medium,
    High,
    Emergency,
    Unrecognized,
}

impl RequestUrgency {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "emergency" => Self::Emergency,
            _ => Self::Unrecognized,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RequestUrgency::Low => "low",
            RequestUrgency::Medium => "medium",
            RequestUrgency::High => "high",
            RequestUrgency::Emergency => "emergency",
            RequestUrgency::Unrecognized => "unrecognized",
        }
    }

    pub const fn base_score(self) -> u32 {
        match self {
            RequestUrgency::Emergency => 100,
            RequestUrgency::High => 75,
            RequestUrgency::Medium => 50,
            RequestUrgency::Low => 25,
            RequestUrgency::Unrecognized => 0,
        }
    }

    /// High and emergency requests surface in the urgent view.
    pub const fn is_urgent(self) -> bool {
        matches!(self, RequestUrgency::High | RequestUrgency::Emergency)
    }
}

impl From<String> for RequestUrgency {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<RequestUrgency> for &'static str {
    fn from(value: RequestUrgency) -> Self {
        value.label()
    }
}

/// Days remaining until `required_by`, rounded up. Negative once the deadline has passed.
pub fn days_until(required_by: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ceil_days(now, required_by)
}

/// Bonus for an approaching deadline. Overdue requests land in the first bucket.
pub fn time_bonus(days_until_required: i64) -> u32 {
    if days_until_required <= 1 {
        50
    } else if days_until_required <= 3 {
        30
    } else if days_until_required <= 7 {
        15
    } else {
        0
    }
}

/// Sort key for blood requests; higher is fulfilled first.
pub fn calculate_priority(
    urgency: RequestUrgency,
    required_by: DateTime<Utc>,
    now: DateTime<Utc>,
) -> u32 {
    urgency.base_score() + time_bonus(days_until(required_by, now))
}
