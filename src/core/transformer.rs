use crate::core::normalizer::normalize;
use crate::domain::model::{CleanedRecord, RawRecord, TransformResult};
use crate::utils::error::Result;

/// Column order of the cleaned CSV.
pub const CSV_HEADER: [&str; 5] = ["Country", "Capital", "Population", "Area", "Region"];

/// Cleans every record in input order and renders the survivors as CSV.
///
/// A record that cannot be cleaned is counted and logged, never fatal, so
/// `cleaned_records.len() + skipped_count == raw_records.len()` always holds.
pub fn transform(raw_records: &[RawRecord]) -> Result<TransformResult> {
    let mut cleaned_records = Vec::with_capacity(raw_records.len());
    let mut skipped_count = 0;

    for (index, raw) in raw_records.iter().enumerate() {
        match normalize(raw) {
            Ok(record) => cleaned_records.push(record),
            Err(reason) => {
                skipped_count += 1;
                tracing::warn!(index, %reason, "⚠️ Skipping record");
                tracing::debug!(index, record = %raw, "Skipped record content");
            }
        }
    }

    let csv_output = to_csv(&cleaned_records)?;

    tracing::debug!(
        "Transformed {} records ({} cleaned, {} skipped)",
        raw_records.len(),
        cleaned_records.len(),
        skipped_count
    );

    Ok(TransformResult {
        cleaned_records,
        skipped_count,
        csv_output,
    })
}

/// The header row is always written, even for an empty batch.
pub fn to_csv(records: &[CleanedRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::utils::error::EtlError::IoError(e.into_error()))
}
