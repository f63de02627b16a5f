//! Per-muscle records and the per-subject table they accumulate in.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SectionError};

/// One output row: a muscle's volume and maximum cross-sectional area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleRecord {
    /// Display name of the muscle.
    pub muscle: String,
    /// Enclosed volume (cm³).
    pub volume_cm3: f64,
    /// Largest cross-sectional area over all cut levels (mm²).
    pub csa_max_mm2: f64,
}

/// Reduce per-level areas to their maximum and pair it with the volume.
///
/// NaN entries are skipped by the reduction unless every entry is NaN.
pub fn aggregate(muscle: impl Into<String>, volume_cm3: f64, areas: &[f64]) -> Result<MuscleRecord> {
    let csa_max_mm2 = areas
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(SectionError::NoCrossSections)?;

    Ok(MuscleRecord {
        muscle: muscle.into(),
        volume_cm3,
        csa_max_mm2,
    })
}

/// Records for one subject, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectTable {
    subject: String,
    records: Vec<MuscleRecord>,
}

impl SubjectTable {
    /// Empty table for `subject`.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            records: Vec::new(),
        }
    }

    /// Subject identifier.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Append a record.
    pub fn push(&mut self, record: MuscleRecord) {
        self.records.push(record);
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[MuscleRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no muscle has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
