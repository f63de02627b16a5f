//! Error types for muscle measurement.

use thiserror::Error;

/// Errors that can occur while measuring a muscle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectionError {
    /// Mesh has no vertices.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Origin and insertion coincide, so there is no long axis to slice.
    #[error("degenerate axis: origin and insertion are {length:e} mm apart")]
    DegenerateAxis {
        /// Distance between the two extreme points.
        length: f64,
    },

    /// Invalid measurement settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A cutting plane could not be built.
    #[error("invalid cutting plane: {0}")]
    InvalidPlane(String),

    /// No cross-section areas were supplied to the max reduction.
    #[error("no cross-sections to aggregate")]
    NoCrossSections,
}

impl SectionError {
    /// Short name of the error kind, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            SectionError::EmptyMesh | SectionError::DegenerateAxis { .. } => "DegenerateAxisError",
            SectionError::InvalidSettings(_) => "InvalidSettings",
            SectionError::InvalidPlane(_) => "DegenerateSectionWarning",
            SectionError::NoCrossSections => "NoCrossSections",
        }
    }
}

/// Result type for measurement operations.
pub type Result<T> = std::result::Result<T, SectionError>;
