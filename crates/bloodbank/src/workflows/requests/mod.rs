//! Blood request intake, ranking and fulfillment.
//!
//! Priority is derived on every read from urgency, deadline and the current
//! time, so listings can never sort on a stale score.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BloodRequestRecord, BloodRequestSubmission, BloodRequestUpdate, BloodRequestView,
    DoctorContact, Fulfillment, FulfillmentEntry, RequestId, RequestStatus, StatusChange,
};
pub use repository::{MemoryRequestRepository, RequestRepository};
pub use router::request_router;
pub use service::{
    sort_by_priority_then_deadline, sort_by_priority_then_newest, RequestService,
    RequestServiceError, RequestValidationError, URGENT_LIST_LIMIT,
};
