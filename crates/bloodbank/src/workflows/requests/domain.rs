use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{calculate_priority, RequestUrgency};
use crate::workflows::domain::{
    deserialize_optional_timestamp, deserialize_timestamp, Address, BloodType, UserId,
};

/// Identifier wrapper for blood requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Lifecycle of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Fulfilled,
    Cancelled,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Requests still waiting on units.
    pub const fn is_open(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }
}

/// Attending physician for the patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Units delivered against a request, optionally attributed to a donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub donor_id: Option<String>,
    pub units: u32,
    pub date: DateTime<Utc>,
}

/// Payload accepted when a requester files a new request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequestSubmission {
    pub patient_name: String,
    pub blood_type: BloodType,
    pub units: u32,
    #[serde(default)]
    pub urgency: RequestUrgency,
    #[serde(default)]
    pub hospital: Address,
    #[serde(default)]
    pub doctor: DoctorContact,
    pub reason: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub required_by: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequestUpdate {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub units: Option<u32>,
    #[serde(default)]
    pub urgency: Option<RequestUrgency>,
    #[serde(default)]
    pub hospital: Option<Address>,
    #[serde(default)]
    pub doctor: Option<DoctorContact>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub required_by: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Administrative status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: RequestStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fulfillment entry posted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentEntry {
    #[serde(default)]
    pub donor_id: Option<String>,
    pub units: u32,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
}

/// Persisted request. Priority is never stored; see [`BloodRequestRecord::priority`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequestRecord {
    pub id: RequestId,
    pub requester: UserId,
    pub patient_name: String,
    pub blood_type: BloodType,
    pub units: u32,
    pub urgency: RequestUrgency,
    pub hospital: Address,
    pub doctor: DoctorContact,
    pub reason: String,
    pub required_by: DateTime<Utc>,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub fulfilled_by: Vec<Fulfillment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BloodRequestRecord {
    pub fn priority(&self, now: DateTime<Utc>) -> u32 {
        calculate_priority(self.urgency, self.required_by, now)
    }

    pub fn is_urgent(&self) -> bool {
        self.urgency.is_urgent()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.required_by && self.status != RequestStatus::Fulfilled
    }

    pub fn units_fulfilled(&self) -> u32 {
        self.fulfilled_by
            .iter()
            .map(|entry| entry.units)
            .fold(0u32, u32::saturating_add)
    }

    pub fn view(&self, now: DateTime<Utc>) -> BloodRequestView {
        BloodRequestView {
            id: self.id.clone(),
            requester: self.requester.clone(),
            patient_name: self.patient_name.clone(),
            blood_type: self.blood_type,
            units: self.units,
            units_fulfilled: self.units_fulfilled(),
            urgency: self.urgency,
            priority: self.priority(now),
            is_urgent: self.is_urgent(),
            is_overdue: self.is_overdue(now),
            hospital: self.hospital.clone(),
            doctor: self.doctor.clone(),
            reason: self.reason.clone(),
            required_by: self.required_by,
            status: self.status,
            notes: self.notes.clone(),
            fulfilled_by: self.fulfilled_by.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Request as exposed to API consumers, with derived fields evaluated at `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequestView {
    pub id: RequestId,
    pub requester: UserId,
    pub patient_name: String,
    pub blood_type: BloodType,
    pub units: u32,
    pub units_fulfilled: u32,
    pub urgency: RequestUrgency,
    pub priority: u32,
    pub is_urgent: bool,
    pub is_overdue: bool,
    pub hospital: Address,
    pub doctor: DoctorContact,
    pub reason: String,
    pub required_by: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub fulfilled_by: Vec<Fulfillment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
