//! Donor registration, administrative eligibility and donation matching.
//!
//! Donation availability combines the administrative `is_eligible` flag with
//! the 56-day cooldown from [`crate::scoring::can_donate`].

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    age_on, BloodTypeDonorStats, ContactDetails, DonationReceipt, DonorCounts, DonorId,
    DonorMatch, DonorProfileUpdate, DonorRecord, DonorRegistration, DonorStatistics, DonorView,
    EligibilityChange, EmergencyContact, Gender, MedicalCondition, Medication,
};
pub use repository::{DonorRepository, MemoryDonorRepository};
pub use router::donor_router;
pub use service::{
    DonorService, DonorServiceError, DonorValidationError, MINIMUM_WEIGHT_KG, SEARCH_LIMIT,
};
