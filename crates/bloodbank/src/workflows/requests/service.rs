use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    BloodRequestRecord, BloodRequestSubmission, BloodRequestUpdate, BloodRequestView, Fulfillment,
    FulfillmentEntry, RequestId, RequestStatus, StatusChange,
};
use super::repository::RequestRepository;
use crate::auth::Caller;
use crate::scoring::RequestUrgency;
use crate::workflows::store::RepositoryError;

/// Maximum number of entries returned by the urgent view.
pub const URGENT_LIST_LIMIT: usize = 10;

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

/// Intake, ranking and fulfillment of blood requests.
pub struct RequestService<R> {
    repository: Arc<R>,
}

impl<R> RequestService<R>
where
    R: RequestRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// File a new request on behalf of `caller`.
    pub fn submit(
        &self,
        caller: &Caller,
        submission: BloodRequestSubmission,
        now: DateTime<Utc>,
    ) -> Result<BloodRequestRecord, RequestServiceError> {
        validate_submission(&submission)?;

        let record = BloodRequestRecord {
            id: next_request_id(),
            requester: caller.user_id.clone(),
            patient_name: submission.patient_name.trim().to_string(),
            blood_type: submission.blood_type,
            units: submission.units,
            urgency: submission.urgency,
            hospital: submission.hospital,
            doctor: submission.doctor,
            reason: submission.reason,
            required_by: submission.required_by,
            status: RequestStatus::Pending,
            notes: submission.notes,
            fulfilled_by: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record)?;
        info!(
            request_id = %stored.id.0,
            blood_type = %stored.blood_type,
            priority = stored.priority(now),
            "blood request submitted"
        );
        Ok(stored)
    }

    /// Requests visible to `caller`, highest priority first, newest first on ties.
    pub fn list(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<Vec<BloodRequestView>, RequestServiceError> {
        let mut views: Vec<BloodRequestView> = self
            .repository
            .list()?
            .into_iter()
            .filter(|record| caller.may_access(&record.requester))
            .map(|record| record.view(now))
            .collect();
        sort_by_priority_then_newest(&mut views);
        Ok(views)
    }

    pub fn get(
        &self,
        caller: &Caller,
        id: &RequestId,
    ) -> Result<BloodRequestRecord, RequestServiceError> {
        let record = self.fetch(id)?;
        if !caller.may_access(&record.requester) {
            return Err(RequestServiceError::Forbidden);
        }
        Ok(record)
    }

    /// Apply a partial update. Priority follows automatically from the new urgency/deadline.
    pub fn update(
        &self,
        caller: &Caller,
        id: &RequestId,
        update: BloodRequestUpdate,
        now: DateTime<Utc>,
    ) -> Result<BloodRequestRecord, RequestServiceError> {
        let mut record = self.get(caller, id)?;

        if let Some(patient_name) = update.patient_name {
            if patient_name.trim().is_empty() {
                return Err(RequestValidationError::MissingPatientName.into());
            }
            record.patient_name = patient_name.trim().to_string();
        }
        if let Some(blood_type) = update.blood_type {
            record.blood_type = blood_type;
        }
        if let Some(units) = update.units {
            if units == 0 {
                return Err(RequestValidationError::ZeroUnits.into());
            }
            record.units = units;
        }
        if let Some(urgency) = update.urgency {
            if urgency == RequestUrgency::Unrecognized {
                return Err(RequestValidationError::UnrecognizedUrgency.into());
            }
            record.urgency = urgency;
        }
        if let Some(hospital) = update.hospital {
            record.hospital = hospital;
        }
        if let Some(doctor) = update.doctor {
            record.doctor = doctor;
        }
        if let Some(reason) = update.reason {
            if reason.trim().is_empty() {
                return Err(RequestValidationError::MissingReason.into());
            }
            record.reason = reason;
        }
        if let Some(required_by) = update.required_by {
            record.required_by = required_by;
        }
        if let Some(notes) = update.notes {
            record.notes = Some(notes);
        }
        record.updated_at = now;

        self.repository.update(record.clone())?;
        info!(
            request_id = %record.id.0,
            priority = record.priority(now),
            "blood request updated"
        );
        Ok(record)
    }

    pub fn set_status(
        &self,
        caller: &Caller,
        id: &RequestId,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> Result<BloodRequestRecord, RequestServiceError> {
        if !caller.is_admin() {
            return Err(RequestServiceError::AdminRequired);
        }

        let mut record = self.fetch(id)?;
        record.status = change.status;
        if let Some(notes) = change.notes {
            record.notes = Some(notes);
        }
        record.updated_at = now;
        self.repository.update(record.clone())?;

        info!(request_id = %record.id.0, status = record.status.label(), "request status changed");
        Ok(record)
    }

    /// Record delivered units. The request is fulfilled once delivered units cover the
    /// requested amount and approved otherwise.
    pub fn fulfill(
        &self,
        caller: &Caller,
        id: &RequestId,
        entry: FulfillmentEntry,
        now: DateTime<Utc>,
    ) -> Result<BloodRequestRecord, RequestServiceError> {
        if !caller.is_admin() {
            return Err(RequestServiceError::AdminRequired);
        }
        if entry.units == 0 {
            return Err(RequestValidationError::ZeroUnits.into());
        }

        let mut record = self.fetch(id)?;
        if record.status == RequestStatus::Fulfilled {
            warn!(request_id = %record.id.0, "fulfillment rejected for completed request");
            return Err(RequestServiceError::AlreadyFulfilled);
        }

        record.fulfilled_by.push(Fulfillment {
            donor_id: entry.donor_id,
            units: entry.units,
            date: entry.date.unwrap_or(now),
        });
        record.status = if record.units_fulfilled() >= record.units {
            RequestStatus::Fulfilled
        } else {
            RequestStatus::Approved
        };
        record.updated_at = now;
        self.repository.update(record.clone())?;

        info!(
            request_id = %record.id.0,
            delivered = record.units_fulfilled(),
            requested = record.units,
            status = record.status.label(),
            "fulfillment recorded"
        );
        Ok(record)
    }

    /// Open high/emergency requests, highest priority first, soonest deadline on ties.
    pub fn urgent(&self, now: DateTime<Utc>) -> Result<Vec<BloodRequestView>, RequestServiceError> {
        let mut views: Vec<BloodRequestView> = self
            .repository
            .list()?
            .into_iter()
            .filter(|record| record.is_urgent() && record.status.is_open())
            .map(|record| record.view(now))
            .collect();
        sort_by_priority_then_deadline(&mut views);
        views.truncate(URGENT_LIST_LIMIT);
        Ok(views)
    }

    pub fn pending_count(&self) -> Result<usize, RequestServiceError> {
        Ok(self
            .repository
            .list()?
            .iter()
            .filter(|record| record.status == RequestStatus::Pending)
            .count())
    }

    /// Only pending requests may be withdrawn.
    pub fn delete(&self, caller: &Caller, id: &RequestId) -> Result<(), RequestServiceError> {
        let record = self.get(caller, id)?;
        if record.status != RequestStatus::Pending {
            return Err(RequestServiceError::NotPending);
        }
        self.repository.delete(id)?;
        info!(request_id = %id.0, "blood request deleted");
        Ok(())
    }

    fn fetch(&self, id: &RequestId) -> Result<BloodRequestRecord, RequestServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

fn validate_submission(submission: &BloodRequestSubmission) -> Result<(), RequestValidationError> {
    if submission.patient_name.trim().is_empty() {
        return Err(RequestValidationError::MissingPatientName);
    }
    if submission.reason.trim().is_empty() {
        return Err(RequestValidationError::MissingReason);
    }
    if submission.units == 0 {
        return Err(RequestValidationError::ZeroUnits);
    }
    if submission.urgency == RequestUrgency::Unrecognized {
        return Err(RequestValidationError::UnrecognizedUrgency);
    }
    Ok(())
}

/// Default listing order.
pub fn sort_by_priority_then_newest(views: &mut [BloodRequestView]) {
    views.sort_by_key(|view| (Reverse(view.priority), Reverse(view.created_at)));
}

/// Urgent view order.
pub fn sort_by_priority_then_deadline(views: &mut [BloodRequestView]) {
    views.sort_by_key(|view| (Reverse(view.priority), view.required_by));
}

/// Rejected request payloads.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("patient name is required")]
    MissingPatientName,
    #[error("reason is required")]
    MissingReason,
    #[error("at least one unit must be requested")]
    ZeroUnits,
    #[error("urgency must be one of low, medium, high, emergency")]
    UnrecognizedUrgency,
}

/// Error raised by the request service.
#[derive(Debug, thiserror::Error)]
pub enum RequestServiceError {
    #[error(transparent)]
    Validation(#[from] RequestValidationError),
    #[error("access denied")]
    Forbidden,
    #[error("admin access required")]
    AdminRequired,
    #[error("request already fulfilled")]
    AlreadyFulfilled,
    #[error("cannot delete non-pending request")]
    NotPending,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
