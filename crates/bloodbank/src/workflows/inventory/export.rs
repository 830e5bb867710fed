use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::domain::StockLotView;

#[derive(Debug)]
pub enum StockExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for StockExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockExportError::Io(err) => write!(f, "failed to write stock export: {}", err),
            StockExportError::Csv(err) => write!(f, "failed to encode stock export: {}", err),
        }
    }
}

impl std::error::Error for StockExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StockExportError::Io(err) => Some(err),
            StockExportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StockExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for StockExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Blood Type")]
    blood_type: &'static str,
    #[serde(rename = "Units")]
    units: u32,
    #[serde(rename = "Max Units")]
    max_units: u32,
    #[serde(rename = "Hospital")]
    hospital: &'a str,
    #[serde(rename = "Location")]
    location: &'a str,
    #[serde(rename = "Expiration Date")]
    expiration_date: String,
    #[serde(rename = "Days Until Expiration")]
    days_until_expiration: i64,
    #[serde(rename = "Capacity Urgency")]
    capacity_urgency: &'static str,
    #[serde(rename = "Expiry Urgency")]
    expiry_urgency: &'static str,
    #[serde(rename = "Source")]
    source: &'static str,
}

impl<'a> From<&'a StockLotView> for ExportRow<'a> {
    fn from(view: &'a StockLotView) -> Self {
        Self {
            blood_type: view.blood_type.label(),
            units: view.units,
            max_units: view.max_units,
            hospital: &view.hospital.0,
            location: view.location.name.as_deref().unwrap_or(""),
            expiration_date: view.expiration_date.format("%Y-%m-%d").to_string(),
            days_until_expiration: view.days_until_expiration,
            capacity_urgency: view.capacity_urgency.label(),
            expiry_urgency: view.expiry_urgency.label(),
            source: view.source.label(),
        }
    }
}

/// Write one CSV row per lot, with a header row even when `views` is empty.
pub fn write_stock_csv<W: Write>(views: &[StockLotView], writer: W) -> Result<(), StockExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record([
        "Blood Type",
        "Units",
        "Max Units",
        "Hospital",
        "Location",
        "Expiration Date",
        "Days Until Expiration",
        "Capacity Urgency",
        "Expiry Urgency",
        "Source",
    ])?;
    for view in views {
        csv_writer.serialize(ExportRow::from(view))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_stock_to_path<P: AsRef<Path>>(
    views: &[StockLotView],
    path: P,
) -> Result<(), StockExportError> {
    let file = std::fs::File::create(path)?;
    write_stock_csv(views, file)
}
