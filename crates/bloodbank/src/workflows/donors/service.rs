use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    BloodTypeDonorStats, DonationReceipt, DonorCounts, DonorId, DonorMatch, DonorProfileUpdate,
    DonorRecord, DonorRegistration, DonorStatistics, DonorView, EligibilityChange,
};
use super::repository::DonorRepository;
use crate::auth::Caller;
use crate::workflows::domain::BloodType;
use crate::workflows::store::RepositoryError;

/// Minimum body weight accepted for whole-blood donation.
pub const MINIMUM_WEIGHT_KG: f64 = 45.0;

/// Maximum number of donors returned by a search.
pub const SEARCH_LIMIT: usize = 20;

static DONOR_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_donor_id() -> DonorId {
    let id = DONOR_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DonorId(format!("donor-{id:06}"))
}

/// Donor registration, eligibility and matching.
pub struct DonorService<R> {
    repository: Arc<R>,
}

impl<R> DonorService<R>
where
    R: DonorRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Register the caller's donor profile. Each user owns at most one.
    pub fn register(
        &self,
        caller: &Caller,
        registration: DonorRegistration,
        now: DateTime<Utc>,
    ) -> Result<DonorRecord, DonorServiceError> {
        validate_registration(&registration)?;

        let record = DonorRecord {
            id: next_donor_id(),
            owner: caller.user_id.clone(),
            contact: registration.contact,
            blood_type: registration.blood_type,
            date_of_birth: registration.date_of_birth,
            gender: registration.gender,
            weight_kg: registration.weight_kg,
            height_cm: registration.height_cm,
            last_donation: registration.last_donation,
            medical_history: registration.medical_history,
            medications: registration.medications,
            emergency_contact: registration.emergency_contact,
            is_eligible: true,
            eligibility_notes: None,
            preferred_donation_center: registration.preferred_donation_center,
            created_at: now,
            updated_at: now,
        };

        let stored = match self.repository.insert(record) {
            Err(RepositoryError::Conflict) => {
                warn!(user_id = %caller.user_id, "duplicate donor registration rejected");
                return Err(DonorServiceError::DuplicateProfile);
            }
            other => other?,
        };
        info!(
            donor_id = %stored.id.0,
            blood_type = %stored.blood_type,
            "donor registered"
        );
        Ok(stored)
    }

    /// All donors, newest first.
    pub fn list(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<Vec<DonorView>, DonorServiceError> {
        require_admin(caller)?;
        let mut records = self.repository.list()?;
        sort_newest_first(&mut records);
        Ok(records.iter().map(|record| record.view(now)).collect())
    }

    pub fn get(&self, caller: &Caller, id: &DonorId) -> Result<DonorRecord, DonorServiceError> {
        let record = self.fetch(id)?;
        if !caller.may_access(&record.owner) {
            return Err(DonorServiceError::Forbidden);
        }
        Ok(record)
    }

    pub fn profile(&self, caller: &Caller) -> Result<DonorRecord, DonorServiceError> {
        self.repository
            .find_by_owner(&caller.user_id)?
            .ok_or(DonorServiceError::ProfileNotFound)
    }

    pub fn update_profile(
        &self,
        caller: &Caller,
        update: DonorProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<DonorRecord, DonorServiceError> {
        let mut record = self.profile(caller)?;

        if let Some(contact) = update.contact {
            if contact.name.trim().is_empty() {
                return Err(DonorValidationError::MissingName.into());
            }
            record.contact = contact;
        }
        if let Some(blood_type) = update.blood_type {
            record.blood_type = blood_type;
        }
        if let Some(date_of_birth) = update.date_of_birth {
            record.date_of_birth = date_of_birth;
        }
        if let Some(gender) = update.gender {
            record.gender = gender;
        }
        if let Some(weight_kg) = update.weight_kg {
            check_weight(weight_kg)?;
            record.weight_kg = weight_kg;
        }
        if let Some(height_cm) = update.height_cm {
            check_height(height_cm)?;
            record.height_cm = height_cm;
        }
        if let Some(medical_history) = update.medical_history {
            record.medical_history = medical_history;
        }
        if let Some(medications) = update.medications {
            record.medications = medications;
        }
        if let Some(emergency_contact) = update.emergency_contact {
            record.emergency_contact = Some(emergency_contact);
        }
        if let Some(center) = update.preferred_donation_center {
            record.preferred_donation_center = Some(center);
        }
        record.updated_at = now;

        self.repository.update(record.clone())?;
        info!(donor_id = %record.id.0, "donor profile updated");
        Ok(record)
    }

    pub fn set_eligibility(
        &self,
        caller: &Caller,
        id: &DonorId,
        change: EligibilityChange,
        now: DateTime<Utc>,
    ) -> Result<DonorRecord, DonorServiceError> {
        require_admin(caller)?;
        let mut record = self.fetch(id)?;
        record.is_eligible = change.is_eligible;
        record.eligibility_notes = change.eligibility_notes;
        record.updated_at = now;
        self.repository.update(record.clone())?;

        info!(
            donor_id = %record.id.0,
            is_eligible = record.is_eligible,
            "donor eligibility changed"
        );
        Ok(record)
    }

    /// Administratively eligible donors of one blood type. The cooldown is not applied.
    pub fn by_blood_type(&self, blood_type: BloodType) -> Result<Vec<DonorMatch>, DonorServiceError> {
        let mut records: Vec<DonorRecord> = self
            .repository
            .list()?
            .into_iter()
            .filter(|record| record.blood_type == blood_type && record.is_eligible)
            .collect();
        sort_newest_first(&mut records);
        Ok(records.iter().map(DonorRecord::as_match).collect())
    }

    /// Donors who pass both the administrative flag and the 56-day rule.
    pub fn available_for_donation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DonorMatch>, DonorServiceError> {
        let mut records: Vec<DonorRecord> = self
            .repository
            .list()?
            .into_iter()
            .filter(|record| record.available_for_donation(now))
            .collect();
        sort_newest_first(&mut records);
        Ok(records.iter().map(DonorRecord::as_match).collect())
    }

    /// Record a donation taken now. Both eligibility checks must pass.
    pub fn record_donation(
        &self,
        caller: &Caller,
        id: &DonorId,
        now: DateTime<Utc>,
    ) -> Result<DonationReceipt, DonorServiceError> {
        require_admin(caller)?;
        let mut record = self.fetch(id)?;

        if !record.is_eligible {
            warn!(donor_id = %record.id.0, "donation rejected: donor flagged ineligible");
            return Err(DonorServiceError::NotEligible);
        }
        if !record.can_donate(now) {
            let next_eligible_date = record.next_eligible_date(now);
            warn!(
                donor_id = %record.id.0,
                next_eligible_date = %next_eligible_date,
                "donation rejected: cooldown active"
            );
            return Err(DonorServiceError::CooldownActive { next_eligible_date });
        }

        record.last_donation = Some(now);
        record.updated_at = now;
        self.repository.update(record.clone())?;

        let next_eligible_date = record.next_eligible_date(now);
        info!(
            donor_id = %record.id.0,
            next_eligible_date = %next_eligible_date,
            "donation recorded"
        );
        Ok(DonationReceipt {
            donor: record.view(now),
            next_eligible_date,
        })
    }

    /// Totals plus per-blood-type counts, ordered by blood type label.
    pub fn statistics(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<DonorStatistics, DonorServiceError> {
        require_admin(caller)?;
        let records = self.repository.list()?;

        let mut groups: BTreeMap<&'static str, (BloodType, Vec<&DonorRecord>)> = BTreeMap::new();
        for record in &records {
            groups
                .entry(record.blood_type.label())
                .or_insert_with(|| (record.blood_type, Vec::new()))
                .1
                .push(record);
        }

        let by_blood_type = groups
            .into_values()
            .map(|(blood_type, members)| {
                let total_age: u64 = members
                    .iter()
                    .map(|record| u64::from(record.age(now)))
                    .sum();
                BloodTypeDonorStats {
                    blood_type,
                    count: members.len(),
                    eligible_count: members.iter().filter(|record| record.is_eligible).count(),
                    average_age: total_age as f64 / members.len() as f64,
                }
            })
            .collect();

        Ok(DonorStatistics {
            total_donors: records.len(),
            eligible_donors: records.iter().filter(|record| record.is_eligible).count(),
            by_blood_type,
        })
    }

    /// Total donors, donors flagged eligible, and donors who may donate right now.
    pub fn counts(&self, now: DateTime<Utc>) -> Result<DonorCounts, DonorServiceError> {
        let records = self.repository.list()?;
        Ok(DonorCounts {
            total: records.len(),
            eligible: records.iter().filter(|record| record.is_eligible).count(),
            available: records
                .iter()
                .filter(|record| record.available_for_donation(now))
                .count(),
        })
    }

    /// Case-insensitive substring search on name, email or blood type.
    pub fn search(
        &self,
        caller: &Caller,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<DonorView>, DonorServiceError> {
        require_admin(caller)?;
        let mut records: Vec<DonorRecord> = self
            .repository
            .list()?
            .into_iter()
            .filter(|record| record.matches_query(query))
            .collect();
        sort_newest_first(&mut records);
        records.truncate(SEARCH_LIMIT);
        debug!(query, hits = records.len(), "donor search");
        Ok(records.iter().map(|record| record.view(now)).collect())
    }

    fn fetch(&self, id: &DonorId) -> Result<DonorRecord, DonorServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

fn require_admin(caller: &Caller) -> Result<(), DonorServiceError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(DonorServiceError::AdminRequired)
    }
}

fn sort_newest_first(records: &mut [DonorRecord]) {
    records.sort_by_key(|record| Reverse(record.created_at));
}

fn validate_registration(registration: &DonorRegistration) -> Result<(), DonorValidationError> {
    if registration.contact.name.trim().is_empty() {
        return Err(DonorValidationError::MissingName);
    }
    if registration.contact.email.trim().is_empty() {
        return Err(DonorValidationError::MissingEmail);
    }
    check_weight(registration.weight_kg)?;
    check_height(registration.height_cm)
}

fn check_weight(weight_kg: f64) -> Result<(), DonorValidationError> {
    if weight_kg.is_nan() || weight_kg < MINIMUM_WEIGHT_KG {
        return Err(DonorValidationError::Underweight(weight_kg));
    }
    Ok(())
}

fn check_height(height_cm: f64) -> Result<(), DonorValidationError> {
    if height_cm.is_nan() || height_cm <= 0.0 {
        return Err(DonorValidationError::InvalidHeight(height_cm));
    }
    Ok(())
}

/// Rejected donor payloads.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DonorValidationError {
    #[error("donor name is required")]
    MissingName,
    #[error("donor email is required")]
    MissingEmail,
    #[error("weight {0} kg is below the 45 kg minimum")]
    Underweight(f64),
    #[error("height {0} cm must be positive")]
    InvalidHeight(f64),
}

/// Error raised by the donor service.
#[derive(Debug, thiserror::Error)]
pub enum DonorServiceError {
    #[error(transparent)]
    Validation(#[from] DonorValidationError),
    #[error("access denied")]
    Forbidden,
    #[error("admin access required")]
    AdminRequired,
    #[error("donor profile already exists")]
    DuplicateProfile,
    #[error("donor profile not found")]
    ProfileNotFound,
    #[error("donor is not eligible for donation")]
    NotEligible,
    #[error("donor cannot donate yet (56-day rule); next eligible {next_eligible_date}")]
    CooldownActive { next_eligible_date: DateTime<Utc> },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
