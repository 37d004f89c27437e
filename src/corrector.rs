//! Threshold-based outlier correction for timing records.
//!
//! Each field pass walks the sequence left to right. An outlier takes the value of the nearest
//! non-outlier found by scanning backward over the values as they stand in this pass (so a
//! run of consecutive outliers all resolve to the value just before the run), falling back to
//! a forward scan when nothing qualifies behind it. Totals are then recomputed on rows whose
//! components moved.

use crate::model::{CorrectionConfig, CorrectionSummary, Record, TimingField};

fn is_outlier(value: f64, threshold: f64) -> bool {
    value > threshold
}

/// Value of the last record in `before` that is within the threshold.
fn scan_backward(before: &[Record], field: TimingField, threshold: f64) -> Option<f64> {
    before
        .iter()
        .rev()
        .map(|r| field.get(r))
        .find(|v| !is_outlier(*v, threshold))
}

/// Value of the first record in `after` that is within the threshold.
fn scan_forward(after: &[Record], field: TimingField, threshold: f64) -> Option<f64> {
    after
        .iter()
        .map(|r| field.get(r))
        .find(|v| !is_outlier(*v, threshold))
}

/// Replace every outlier of `field` in place and return how many values were replaced.
///
/// Outliers with no qualifying neighbour in either direction are left as they are.
pub fn correct_field(records: &mut [Record], field: TimingField, threshold: f64) -> usize {
    let span = tracing::debug_span!("correct_field", field = field.column_name(), threshold);
    let _guard = span.enter();

    let mut replaced = 0;
    for i in 0..records.len() {
        let value = field.get(&records[i]);
        if !is_outlier(value, threshold) {
            continue;
        }

        // Indices above `i` have not been visited yet in this pass, so the forward scan
        // reads the values as loaded.
        let replacement = scan_backward(&records[..i], field, threshold)
            .or_else(|| scan_forward(&records[i + 1..], field, threshold));

        match replacement {
            Some(v) => {
                tracing::trace!(index = records[i].index, from = value, to = v, "replaced outlier");
                field.set(&mut records[i], v);
                replaced += 1;
            }
            None => {
                tracing::debug!(index = records[i].index, value, "outlier has no valid neighbour");
            }
        }
    }

    tracing::debug!(replaced, "field pass complete");
    replaced
}

/// Recompute `total_time` on every row whose client or server time differs from `original`.
/// Rows with untouched components keep their loaded total. Returns the number of rows recomputed.
pub fn reconcile_totals(records: &mut [Record], original: &[Record]) -> usize {
    let mut recomputed = 0;
    for (record, before) in records.iter_mut().zip(original) {
        if record.client_time != before.client_time || record.server_time != before.server_time {
            record.total_time = record.client_time + record.server_time;
            recomputed += 1;
        }
    }
    recomputed
}

fn count_outliers(records: &[Record], field: TimingField, threshold: f64) -> usize {
    records
        .iter()
        .filter(|r| is_outlier(field.get(r), threshold))
        .count()
}

/// Run the client pass, the server pass and total reconciliation, in that order.
pub fn correct(records: &mut [Record], config: &CorrectionConfig) -> CorrectionSummary {
    let original = records.to_vec();

    let client_corrections =
        correct_field(records, TimingField::ClientTime, config.client_threshold);
    let server_corrections =
        correct_field(records, TimingField::ServerTime, config.server_threshold);
    let rows_modified = reconcile_totals(records, &original);

    let summary = CorrectionSummary {
        rows: records.len(),
        client_corrections,
        server_corrections,
        rows_modified,
        client_unresolved: count_outliers(records, TimingField::ClientTime, config.client_threshold),
        server_unresolved: count_outliers(records, TimingField::ServerTime, config.server_threshold),
    };
    tracing::info!(?summary, "correction finished");
    summary
}
