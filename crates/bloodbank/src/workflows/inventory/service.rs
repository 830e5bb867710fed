use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    BloodTypeSummary, Reservation, StockId, StockLotRecord, StockLotSubmission, StockLotUpdate,
    StockLotView, StockStatus,
};
use super::export::{write_stock_csv, StockExportError};
use super::repository::StockRepository;
use crate::auth::{Caller, Role};
use crate::scoring::{classify_by_absolute_count, StockUrgency};
use crate::workflows::domain::BloodType;
use crate::workflows::store::RepositoryError;

/// Bound on the expiry window so arbitrary path input cannot overflow the clock.
const MAX_EXPIRY_WINDOW_DAYS: i64 = 36_500;

/// Reservations re-read the lot this many times when a concurrent write lands first.
const RESERVE_ATTEMPTS: usize = 3;

static STOCK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_stock_id() -> StockId {
    let id = STOCK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    StockId(format!("stock-{id:06}"))
}

/// Stock lots, summaries, reservations and expiry tracking.
pub struct InventoryService<R> {
    repository: Arc<R>,
}

impl<R> InventoryService<R>
where
    R: StockRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Available lots ordered by blood type label, then soonest expiration.
    pub fn list_available(&self, now: DateTime<Utc>) -> Result<Vec<StockLotView>, InventoryServiceError> {
        let mut lots = self.available_lots()?;
        lots.sort_by(|a, b| {
            a.blood_type
                .label()
                .cmp(b.blood_type.label())
                .then(a.expiration_date.cmp(&b.expiration_date))
        });
        Ok(lots.iter().map(|lot| lot.view(now)).collect())
    }

    pub fn by_blood_type(
        &self,
        blood_type: BloodType,
        now: DateTime<Utc>,
    ) -> Result<Vec<StockLotView>, InventoryServiceError> {
        let mut lots: Vec<StockLotRecord> = self
            .available_lots()?
            .into_iter()
            .filter(|lot| lot.blood_type == blood_type)
            .collect();
        lots.sort_by_key(|lot| lot.expiration_date);
        Ok(lots.iter().map(|lot| lot.view(now)).collect())
    }

    /// Per blood type totals over available lots, ordered by label.
    pub fn summary(&self) -> Result<Vec<BloodTypeSummary>, InventoryServiceError> {
        let mut groups: BTreeMap<&'static str, Vec<StockLotRecord>> = BTreeMap::new();
        for lot in self.available_lots()? {
            groups.entry(lot.blood_type.label()).or_default().push(lot);
        }

        Ok(groups
            .into_values()
            .filter_map(|lots| summarize(&lots))
            .collect())
    }

    /// Add a lot. Hospital callers own what they add; admins must name the hospital.
    pub fn add(
        &self,
        caller: &Caller,
        submission: StockLotSubmission,
        now: DateTime<Utc>,
    ) -> Result<StockLotRecord, InventoryServiceError> {
        require_stock_manager(caller)?;

        let hospital = match caller.role {
            Role::Hospital => caller.user_id.clone(),
            _ => submission
                .hospital
                .ok_or(StockValidationError::MissingHospital)?,
        };

        let record = StockLotRecord {
            id: next_stock_id(),
            blood_type: submission.blood_type,
            units: submission.units,
            max_units: submission.max_units,
            hospital,
            location: submission.location,
            expiration_date: submission.expiration_date,
            status: StockStatus::Available,
            source: submission.source,
            notes: submission.notes,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record)?;
        info!(
            stock_id = %stored.id.0,
            blood_type = %stored.blood_type,
            units = stored.units,
            hospital = %stored.hospital,
            "stock lot added"
        );
        Ok(stored)
    }

    pub fn update(
        &self,
        caller: &Caller,
        id: &StockId,
        update: StockLotUpdate,
        now: DateTime<Utc>,
    ) -> Result<StockLotRecord, InventoryServiceError> {
        require_stock_manager(caller)?;
        let mut record = self.fetch(id)?;

        if let Some(blood_type) = update.blood_type {
            record.blood_type = blood_type;
        }
        if let Some(units) = update.units {
            record.units = units;
        }
        if let Some(max_units) = update.max_units {
            record.max_units = max_units;
        }
        if let Some(location) = update.location {
            record.location = location;
        }
        if let Some(expiration_date) = update.expiration_date {
            record.expiration_date = expiration_date;
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(source) = update.source {
            record.source = source;
        }
        if let Some(notes) = update.notes {
            record.notes = Some(notes);
        }
        record.updated_at = now;

        self.repository.update(record.clone())?;
        info!(stock_id = %record.id.0, status = record.status.label(), "stock lot updated");
        Ok(record)
    }

    /// Deduct units from an available lot. A lot drained to zero becomes reserved.
    /// The write only lands if the lot is unchanged since it was read.
    pub fn reserve(
        &self,
        caller: &Caller,
        id: &StockId,
        reservation: Reservation,
        now: DateTime<Utc>,
    ) -> Result<StockLotRecord, InventoryServiceError> {
        if reservation.units == 0 {
            return Err(StockValidationError::ZeroUnits.into());
        }

        let mut attempt = 1;
        let record = loop {
            let current = self.fetch(id)?;
            let record = deduct_units(&current, reservation.units, now)?;
            match self.repository.update_if_unchanged(&current, record.clone()) {
                Ok(()) => break record,
                Err(RepositoryError::Conflict) if attempt < RESERVE_ATTEMPTS => {
                    debug!(stock_id = %id.0, attempt, "stock lot changed mid-reservation, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        };

        info!(
            stock_id = %record.id.0,
            reserved = reservation.units,
            remaining = record.units,
            reserved_by = %caller.user_id,
            "units reserved"
        );
        Ok(record)
    }

    /// Available lots expiring on or before `now + days`, soonest first.
    pub fn expiring_within(
        &self,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<StockLotView>, InventoryServiceError> {
        let horizon = now + Duration::days(days.clamp(-MAX_EXPIRY_WINDOW_DAYS, MAX_EXPIRY_WINDOW_DAYS));
        let mut lots: Vec<StockLotRecord> = self
            .available_lots()?
            .into_iter()
            .filter(|lot| lot.expiration_date <= horizon)
            .collect();
        lots.sort_by_key(|lot| lot.expiration_date);
        Ok(lots.iter().map(|lot| lot.view(now)).collect())
    }

    /// Available lots whose units fall below 20% of capacity.
    pub fn low_stock(&self, now: DateTime<Utc>) -> Result<Vec<StockLotView>, InventoryServiceError> {
        Ok(self
            .list_available(now)?
            .into_iter()
            .filter(|view| view.capacity_urgency == StockUrgency::High)
            .collect())
    }

    /// Mark every lapsed available lot as expired and return the affected ids.
    pub fn expire_lapsed(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<Vec<StockId>, InventoryServiceError> {
        require_stock_manager(caller)?;

        let mut expired = Vec::new();
        for mut lot in self.available_lots()? {
            if lot.is_expired(now) {
                lot.status = StockStatus::Expired;
                lot.updated_at = now;
                self.repository.update(lot.clone())?;
                expired.push(lot.id);
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "lapsed stock lots expired");
        }
        Ok(expired)
    }

    /// CSV rendering of [`InventoryService::list_available`].
    pub fn export_csv(&self, now: DateTime<Utc>) -> Result<Vec<u8>, InventoryServiceError> {
        let views = self.list_available(now)?;
        let mut buffer = Vec::new();
        write_stock_csv(&views, &mut buffer)?;
        Ok(buffer)
    }

    fn available_lots(&self) -> Result<Vec<StockLotRecord>, InventoryServiceError> {
        Ok(self
            .repository
            .list()?
            .into_iter()
            .filter(StockLotRecord::is_available)
            .collect())
    }

    fn fetch(&self, id: &StockId) -> Result<StockLotRecord, InventoryServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

fn summarize(lots: &[StockLotRecord]) -> Option<BloodTypeSummary> {
    let first = lots.first()?;
    let total_units = lots
        .iter()
        .map(|lot| lot.units)
        .fold(0u32, u32::saturating_add);
    let max_units = lots.iter().map(|lot| lot.max_units).max().unwrap_or(0);
    let hospitals: BTreeSet<_> = lots.iter().map(|lot| lot.hospital.clone()).collect();

    Some(BloodTypeSummary {
        blood_type: first.blood_type,
        total_units,
        max_units,
        hospitals: hospitals.into_iter().collect(),
        urgency: classify_by_absolute_count(total_units),
        percentage: percentage_of(total_units, max_units),
    })
}

/// Rounded share of capacity, half away from zero.
pub fn percentage_of(units: u32, max_units: u32) -> Option<u64> {
    if max_units == 0 {
        return None;
    }
    let share = f64::from(units) / f64::from(max_units) * 100.0;
    Some(share.round() as u64)
}

fn require_stock_manager(caller: &Caller) -> Result<(), InventoryServiceError> {
    if caller.manages_stock() {
        Ok(())
    } else {
        Err(InventoryServiceError::InsufficientPermissions)
    }
}

fn deduct_units(
    current: &StockLotRecord,
    units: u32,
    now: DateTime<Utc>,
) -> Result<StockLotRecord, InventoryServiceError> {
    if !current.is_available() {
        return Err(InventoryServiceError::NotAvailable);
    }
    if current.units < units {
        warn!(
            stock_id = %current.id.0,
            available = current.units,
            requested = units,
            "reservation rejected"
        );
        return Err(InventoryServiceError::InsufficientUnits {
            available: current.units,
            requested: units,
        });
    }

    let mut record = current.clone();
    record.units -= units;
    if record.units == 0 {
        record.status = StockStatus::Reserved;
    }
    record.updated_at = now;
    Ok(record)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StockValidationError {
    #[error("hospital is required when an administrator adds stock")]
    MissingHospital,
    #[error("at least one unit must be reserved")]
    ZeroUnits,
}

/// Error raised by the inventory service.
#[derive(Debug, thiserror::Error)]
pub enum InventoryServiceError {
    #[error(transparent)]
    Validation(#[from] StockValidationError),
    #[error("insufficient permissions")]
    InsufficientPermissions,
    #[error("blood stock is not available")]
    NotAvailable,
    #[error("insufficient units available ({available} available, {requested} requested)")]
    InsufficientUnits { available: u32, requested: u32 },
    #[error(transparent)]
    Export(#[from] StockExportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
