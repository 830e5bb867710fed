use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{can_donate, next_eligible_date};
use crate::workflows::domain::{deserialize_optional_timestamp, BloodType, UserId};

/// Identifier wrapper for donor profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonorId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// How the donor can be reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalCondition {
    pub condition: String,
    #[serde(default)]
    pub diagnosed_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Payload accepted when a user registers as a donor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRegistration {
    pub contact: ContactDetails,
    pub blood_type: BloodType,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: f64,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub last_donation: Option<DateTime<Utc>>,
    #[serde(default)]
    pub medical_history: Vec<MedicalCondition>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub preferred_donation_center: Option<String>,
}

/// Self-service profile update. Ownership and administrative eligibility are
/// not part of this payload, so any such fields sent by a client are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonorProfileUpdate {
    #[serde(default)]
    pub contact: Option<ContactDetails>,
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub medical_history: Option<Vec<MedicalCondition>>,
    #[serde(default)]
    pub medications: Option<Vec<Medication>>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub preferred_donation_center: Option<String>,
}

/// Administrative eligibility decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityChange {
    pub is_eligible: bool,
    #[serde(default)]
    pub eligibility_notes: Option<String>,
}

/// Persisted donor profile. Donation availability is derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    pub id: DonorId,
    pub owner: UserId,
    pub contact: ContactDetails,
    pub blood_type: BloodType,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub last_donation: Option<DateTime<Utc>>,
    pub medical_history: Vec<MedicalCondition>,
    pub medications: Vec<Medication>,
    pub emergency_contact: Option<EmergencyContact>,
    pub is_eligible: bool,
    pub eligibility_notes: Option<String>,
    pub preferred_donation_center: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DonorRecord {
    pub fn age(&self, now: DateTime<Utc>) -> u32 {
        age_on(self.date_of_birth, now.date_naive())
    }

    /// Time-based rule only.
    pub fn can_donate(&self, now: DateTime<Utc>) -> bool {
        can_donate(self.last_donation, now)
    }

    /// Administrative flag and time-based rule together.
    pub fn available_for_donation(&self, now: DateTime<Utc>) -> bool {
        self.is_eligible && self.can_donate(now)
    }

    pub fn next_eligible_date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_eligible_date(self.last_donation, now)
    }

    /// Case-insensitive substring match on name, email or blood type.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.contact.name.to_lowercase().contains(&needle)
            || self.contact.email.to_lowercase().contains(&needle)
            || self.blood_type.label().to_lowercase().contains(&needle)
    }

    pub fn view(&self, now: DateTime<Utc>) -> DonorView {
        DonorView {
            id: self.id.clone(),
            owner: self.owner.clone(),
            contact: self.contact.clone(),
            blood_type: self.blood_type,
            date_of_birth: self.date_of_birth,
            age: self.age(now),
            gender: self.gender,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            last_donation: self.last_donation,
            can_donate: self.can_donate(now),
            next_eligible_date: self.next_eligible_date(now),
            medical_history: self.medical_history.clone(),
            medications: self.medications.clone(),
            emergency_contact: self.emergency_contact.clone(),
            is_eligible: self.is_eligible,
            eligibility_notes: self.eligibility_notes.clone(),
            preferred_donation_center: self.preferred_donation_center.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Reduced projection offered to public matching endpoints.
    pub fn as_match(&self) -> DonorMatch {
        DonorMatch {
            id: self.id.clone(),
            name: self.contact.name.clone(),
            city: self.contact.city.clone(),
            state: self.contact.state.clone(),
            blood_type: self.blood_type,
            last_donation: self.last_donation,
            preferred_donation_center: self.preferred_donation_center.clone(),
        }
    }
}

/// Whole years between `date_of_birth` and `today`; zero for future birth dates.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

/// Donor as exposed to the owner and administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorView {
    pub id: DonorId,
    pub owner: UserId,
    pub contact: ContactDetails,
    pub blood_type: BloodType,
    pub date_of_birth: NaiveDate,
    pub age: u32,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub last_donation: Option<DateTime<Utc>>,
    pub can_donate: bool,
    pub next_eligible_date: DateTime<Utc>,
    pub medical_history: Vec<MedicalCondition>,
    pub medications: Vec<Medication>,
    pub emergency_contact: Option<EmergencyContact>,
    pub is_eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility_notes: Option<String>,
    pub preferred_donation_center: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorMatch {
    pub id: DonorId,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub blood_type: BloodType,
    pub last_donation: Option<DateTime<Utc>>,
    pub preferred_donation_center: Option<String>,
}

/// Outcome of a recorded donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationReceipt {
    pub donor: DonorView,
    pub next_eligible_date: DateTime<Utc>,
}

/// Headline donor counts for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DonorCounts {
    pub total: usize,
    pub eligible: usize,
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodTypeDonorStats {
    pub blood_type: BloodType,
    pub count: usize,
    pub eligible_count: usize,
    pub average_age: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorStatistics {
    pub total_donors: usize,
    pub eligible_donors: usize,
    pub by_blood_type: Vec<BloodTypeDonorStats>,
}
