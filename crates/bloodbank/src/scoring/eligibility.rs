use chrono::{DateTime, Duration, Utc};

use super::floor_days;

/// Minimum number of whole days between two whole-blood donations.
pub const DONATION_INTERVAL_DAYS: i64 = 56;

/// Whole days elapsed since `last_donation`, rounded down.
pub fn days_since(last_donation: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    floor_days(last_donation, now)
}

/// Time-based donation rule. A donor who never donated is always eligible.
///
/// This does not consult the administrative eligibility flag; callers combine both.
pub fn can_donate(last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_donation {
        None => true,
        Some(last) => days_since(last, now) >= DONATION_INTERVAL_DAYS,
    }
}

/// Earliest instant at which the time-based rule passes again.
pub fn next_eligible_date(
    last_donation: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match last_donation {
        None => now,
        Some(last) => last + Duration::days(DONATION_INTERVAL_DAYS),
    }
}
