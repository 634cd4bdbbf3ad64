//! XLSX dump of a user's reading history: one worksheet per reading kind,
//! one row per reading, no aggregation.

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::db::models::{MeterReading, QualityReading};
use crate::error::{Error, Result};

pub fn export_report(
    quality: &[QualityReading],
    meter: &[MeterReading],
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let quality_sheet = workbook.add_worksheet();
    write_quality_sheet(quality_sheet, quality)?;

    let meter_sheet = workbook.add_worksheet();
    write_meter_sheet(meter_sheet, meter)?;

    workbook
        .save_to_buffer()
        .map_err(|e| Error::Export(e.to_string()))
}

fn write_quality_sheet(sheet: &mut Worksheet, readings: &[QualityReading]) -> Result<()> {
    sheet
        .set_name("Water Quality")
        .map_err(|e| Error::Export(e.to_string()))?;

    let header_format = Format::new().set_bold();
    let headers = ["Timestamp", "Status", "Score", "Alert Level", "Location"];
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| Error::Export(e.to_string()))?;
    }

    for (row_idx, reading) in readings.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet
            .write_string(row, 0, reading.recorded_at.to_rfc3339())
            .map_err(|e| Error::Export(e.to_string()))?;
        sheet
            .write_string(row, 1, reading.safety_status.as_str())
            .map_err(|e| Error::Export(e.to_string()))?;
        sheet
            .write_number(row, 2, reading.safety_score as f64)
            .map_err(|e| Error::Export(e.to_string()))?;
        sheet
            .write_string(row, 3, reading.alert_level.as_str())
            .map_err(|e| Error::Export(e.to_string()))?;
        sheet
            .write_string(row, 4, reading.location.as_deref().unwrap_or(""))
            .map_err(|e| Error::Export(e.to_string()))?;
    }

    sheet
        .set_column_width(0, 26)
        .map_err(|e| Error::Export(e.to_string()))?;
    sheet
        .set_column_width(4, 20)
        .map_err(|e| Error::Export(e.to_string()))?;

    Ok(())
}

fn write_meter_sheet(sheet: &mut Worksheet, readings: &[MeterReading]) -> Result<()> {
    sheet
        .set_name("Meter Readings")
        .map_err(|e| Error::Export(e.to_string()))?;

    let header_format = Format::new().set_bold();
    let headers = ["Timestamp", "Reading (L)", "High Usage", "Location"];
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| Error::Export(e.to_string()))?;
    }

    for (row_idx, reading) in readings.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet
            .write_string(row, 0, reading.recorded_at.to_rfc3339())
            .map_err(|e| Error::Export(e.to_string()))?;
        sheet
            .write_number(row, 1, reading.reading_value as f64)
            .map_err(|e| Error::Export(e.to_string()))?;
        sheet
            .write_string(row, 2, if reading.is_high_usage { "yes" } else { "no" })
            .map_err(|e| Error::Export(e.to_string()))?;
        sheet
            .write_string(row, 3, reading.location.as_deref().unwrap_or(""))
            .map_err(|e| Error::Export(e.to_string()))?;
    }

    sheet
        .set_column_width(0, 26)
        .map_err(|e| Error::Export(e.to_string()))?;
    sheet
        .set_column_width(3, 20)
        .map_err(|e| Error::Export(e.to_string()))?;

    Ok(())
}
