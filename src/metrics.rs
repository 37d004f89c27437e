use crate::model::{FieldStats, Record, TimingField, TimingStats};

/// Compute metrics (mean, median, 25th percentile, 75th percentile, max) from samples
pub fn compute_metrics(samples: &[f64]) -> Option<FieldStats> {
    if samples.len() < 2 {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    Some(FieldStats {
        mean,
        median: sorted[n / 2],
        p25: sorted[n / 4],
        p75: sorted[3 * n / 4],
        max: sorted[n - 1],
    })
}

/// Per-field metrics over a record sequence.
pub fn compute_timing_stats(records: &[Record]) -> TimingStats {
    let field_stats = |field: TimingField| {
        let values: Vec<f64> = records.iter().map(|r| field.get(r)).collect();
        compute_metrics(&values)
    };
    TimingStats {
        client_time: field_stats(TimingField::ClientTime),
        server_time: field_stats(TimingField::ServerTime),
        total_time: field_stats(TimingField::TotalTime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_samples() {
        assert!(compute_metrics(&[]).is_none());
        assert!(compute_metrics(&[1.0]).is_none());
    }

    #[test]
    fn metrics_over_unsorted_samples() {
        let m = compute_metrics(&[40.0, 10.0, 30.0, 20.0]).unwrap();
        assert_eq!(m.mean, 25.0);
        assert_eq!(m.median, 30.0);
        assert_eq!(m.p25, 20.0);
        assert_eq!(m.p75, 40.0);
        assert_eq!(m.max, 40.0);
    }

    #[test]
    fn timing_stats_per_field() {
        let records = vec![
            Record::new(0, 10.0, 20.0, 30.0),
            Record::new(1, 30.0, 40.0, 70.0),
        ];
        let stats = compute_timing_stats(&records);
        assert_eq!(stats.client_time.unwrap().mean, 20.0);
        assert_eq!(stats.server_time.unwrap().max, 40.0);
        assert_eq!(stats.total_time.unwrap().median, 70.0);
    }
}
