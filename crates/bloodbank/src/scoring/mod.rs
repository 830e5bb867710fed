//! Pure scoring rules shared by the request, donor, inventory and dashboard workflows.
//!
//! Every function here is total: unrecognized urgencies, missing dates and empty
//! capacities all map to a defined value instead of an error. Callers always pass
//! `now` explicitly so results are reproducible.

mod eligibility;
mod priority;
mod stock_level;

pub use eligibility::{can_donate, days_since, next_eligible_date, DONATION_INTERVAL_DAYS};
pub use priority::{calculate_priority, days_until, time_bonus, RequestUrgency};
pub use stock_level::{
    classify_by_absolute_count, classify_by_capacity_fraction, classify_by_days_to_expiry,
    StockUrgency,
};

use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days from `from` to `to`, rounded up.
pub(crate) fn ceil_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let millis = (to - from).num_milliseconds();
    let whole = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}

/// Whole days from `from` to `to`, rounded down.
pub(crate) fn floor_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}
