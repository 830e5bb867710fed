use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{classify_by_capacity_fraction, classify_by_days_to_expiry, StockUrgency};
use crate::workflows::domain::{
    deserialize_optional_timestamp, deserialize_timestamp, Address, BloodType, UserId,
};

/// Identifier wrapper for stock lots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[default]
    Available,
    Reserved,
    Expired,
    Used,
}

impl StockStatus {
    pub const fn label(self) -> &'static str {
        match self {
            StockStatus::Available => "available",
            StockStatus::Reserved => "reserved",
            StockStatus::Expired => "expired",
            StockStatus::Used => "used",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockSource {
    #[default]
    Donation,
    Purchase,
    Transfer,
}

impl StockSource {
    pub const fn label(self) -> &'static str {
        match self {
            StockSource::Donation => "donation",
            StockSource::Purchase => "purchase",
            StockSource::Transfer => "transfer",
        }
    }
}

/// Payload for a new stock lot. `hospital` is only honoured for admin callers;
/// hospital callers always own the lots they add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLotSubmission {
    pub blood_type: BloodType,
    pub units: u32,
    pub max_units: u32,
    #[serde(default)]
    pub hospital: Option<UserId>,
    #[serde(default)]
    pub location: Address,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expiration_date: DateTime<Utc>,
    #[serde(default)]
    pub source: StockSource,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLotUpdate {
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub units: Option<u32>,
    #[serde(default)]
    pub max_units: Option<u32>,
    #[serde(default)]
    pub location: Option<Address>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<StockStatus>,
    #[serde(default)]
    pub source: Option<StockSource>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub units: u32,
}

/// Persisted stock lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLotRecord {
    pub id: StockId,
    pub blood_type: BloodType,
    pub units: u32,
    pub max_units: u32,
    pub hospital: UserId,
    pub location: Address,
    pub expiration_date: DateTime<Utc>,
    pub status: StockStatus,
    pub source: StockSource,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockLotRecord {
    /// Days until expiration, rounded up; negative once expired.
    pub fn days_until_expiration(&self, now: DateTime<Utc>) -> i64 {
        crate::scoring::days_until(self.expiration_date, now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration_date
    }

    pub fn is_available(&self) -> bool {
        self.status == StockStatus::Available
    }

    pub fn capacity_urgency(&self) -> StockUrgency {
        classify_by_capacity_fraction(self.units, self.max_units)
    }

    pub fn expiry_urgency(&self, now: DateTime<Utc>) -> StockUrgency {
        classify_by_days_to_expiry(self.days_until_expiration(now))
    }

    pub fn view(&self, now: DateTime<Utc>) -> StockLotView {
        StockLotView {
            id: self.id.clone(),
            blood_type: self.blood_type,
            units: self.units,
            max_units: self.max_units,
            hospital: self.hospital.clone(),
            location: self.location.clone(),
            expiration_date: self.expiration_date,
            days_until_expiration: self.days_until_expiration(now),
            is_expired: self.is_expired(now),
            capacity_urgency: self.capacity_urgency(),
            expiry_urgency: self.expiry_urgency(now),
            status: self.status,
            source: self.source,
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Stock lot with derived fields evaluated at `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLotView {
    pub id: StockId,
    pub blood_type: BloodType,
    pub units: u32,
    pub max_units: u32,
    pub hospital: UserId,
    pub location: Address,
    pub expiration_date: DateTime<Utc>,
    pub days_until_expiration: i64,
    pub is_expired: bool,
    pub capacity_urgency: StockUrgency,
    pub expiry_urgency: StockUrgency,
    pub status: StockStatus,
    pub source: StockSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Available stock of one blood type, classified by the absolute-count rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodTypeSummary {
    pub blood_type: BloodType,
    pub total_units: u32,
    pub max_units: u32,
    pub hospitals: Vec<UserId>,
    pub urgency: StockUrgency,
    /// `None` when no lot of this type declares a capacity.
    pub percentage: Option<u64>,
}
