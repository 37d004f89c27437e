use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One row of benchmark output. Columns other than the three timings live in
/// the storage layer and never reach the corrector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub index: usize,
    pub client_time: f64,
    pub server_time: f64,
    pub total_time: f64,
}

impl Record {
    pub fn new(index: usize, client_time: f64, server_time: f64, total_time: f64) -> Self {
        Self {
            index,
            client_time,
            server_time,
            total_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingField {
    ClientTime,
    ServerTime,
    TotalTime,
}

impl TimingField {
    /// Column header as it appears in benchmark CSV files.
    pub fn column_name(self) -> &'static str {
        match self {
            TimingField::ClientTime => "clientTime",
            TimingField::ServerTime => "serverTime",
            TimingField::TotalTime => "totalTime",
        }
    }

    pub fn get(self, record: &Record) -> f64 {
        match self {
            TimingField::ClientTime => record.client_time,
            TimingField::ServerTime => record.server_time,
            TimingField::TotalTime => record.total_time,
        }
    }

    pub fn set(self, record: &mut Record, value: f64) {
        match self {
            TimingField::ClientTime => record.client_time = value,
            TimingField::ServerTime => record.server_time = value,
            TimingField::TotalTime => record.total_time = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionConfig {
    pub client_threshold: f64,
    pub server_threshold: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionSummary {
    pub rows: usize,
    pub client_corrections: usize,
    pub server_corrections: usize,
    pub rows_modified: usize,
    /// Outliers left in place because no neighbour in either direction qualified.
    pub client_unresolved: usize,
    pub server_unresolved: usize,
}

impl CorrectionSummary {
    pub fn has_unresolved(&self) -> bool {
        self.client_unresolved > 0 || self.server_unresolved > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub client_time: Option<FieldStats>,
    pub server_time: Option<FieldStats>,
    pub total_time: Option<FieldStats>,
}

/// Everything the operator sees after a run; also the JSON export shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub timestamp_utc: String,
    pub input: PathBuf,
    /// `None` on a dry run.
    pub output: Option<PathBuf>,
    pub config: CorrectionConfig,
    pub summary: CorrectionSummary,
    pub before: TimingStats,
    pub after: TimingStats,
}
