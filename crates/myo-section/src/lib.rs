#![warn(missing_docs)]

//! Muscle volume and maximum cross-sectional area from surface meshes.
//!
//! A muscle mesh is measured in a fixed sequence: the long axis is taken
//! from the vertex extremes along one coordinate, cut levels are spread
//! along it, each level is intersected with the mesh and the largest
//! section area is paired with the enclosed volume.
//!
//! # Example
//!
//! ```ignore
//! use myo_section::{measure, CsaSettings};
//!
//! let mesh = myo_mesh::load_stl("HYA01_vasmed_r.stl")?;
//! let result = measure("vasmed_r", &mesh, &CsaSettings::default())?;
//!
//! println!("CSA max: {:.1} mm²", result.record.csa_max_mm2);
//! println!("Volume: {:.2} cm³", result.record.volume_cm3);
//! ```

pub mod aggregate;
pub mod axis;
pub mod error;
pub mod levels;
pub mod path;
pub mod section;
pub mod volume;

pub use aggregate::{aggregate, MuscleRecord, SubjectTable};
pub use axis::{estimate_axis, AxisPair};
pub use error::{Result, SectionError};
pub use levels::{generate_cut_levels, generate_midbelly_levels, CutLevel};
pub use path::{region_area, Polygon};
pub use section::{CrossSection, MeshPlaneCutter, PlaneCutter};
pub use volume::{compute_volume, VolumeReport, MM3_PER_CM3};

use myo_math::{Axis, Plane, Point3, Tolerance, Vec3};
use myo_mesh::TriangleMesh;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Orientation of the cutting planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaneMode {
    /// Planes orthogonal to the origin→insertion line.
    #[default]
    AlongAxis,
    /// Planes orthogonal to the designated coordinate axis.
    AxisAligned,
}

/// Which levels along the axis are cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutProtocol {
    /// `slice_count` evenly spaced interior levels.
    #[default]
    Full,
    /// The midpoint and one level either side of it.
    Midbelly,
}

/// Measurement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsaSettings {
    /// Number of cut levels for [`CutProtocol::Full`].
    pub slice_count: usize,
    /// Spacing between levels as a fraction of the axis length.
    pub increment: f64,
    /// Coordinate the origin and insertion are extremes of.
    pub axis: Axis,
    /// Orientation of the cutting planes.
    pub plane_mode: PlaneMode,
    /// Level layout.
    pub protocol: CutProtocol,
    /// Linear tolerance (mm) for vertex welding and degenerate-axis checks.
    pub tolerance: f64,
}

impl Default for CsaSettings {
    fn default() -> Self {
        Self {
            slice_count: 17,
            increment: 0.05,
            axis: Axis::Z,
            plane_mode: PlaneMode::AlongAxis,
            protocol: CutProtocol::Full,
            tolerance: Tolerance::DEFAULT.linear,
        }
    }
}

impl CsaSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.increment > 0.0 && self.increment.is_finite()) {
            return Err(SectionError::InvalidSettings(
                "increment must be positive".into(),
            ));
        }
        match self.protocol {
            CutProtocol::Full => {
                if self.slice_count == 0 {
                    return Err(SectionError::InvalidSettings(
                        "slice_count must be at least 1".into(),
                    ));
                }
                if (self.slice_count + 1) as f64 * self.increment >= 1.0 {
                    return Err(SectionError::InvalidSettings(format!(
                        "{} slices at increment {} reach past the insertion",
                        self.slice_count, self.increment
                    )));
                }
            }
            CutProtocol::Midbelly => {
                if self.increment >= 0.5 {
                    return Err(SectionError::InvalidSettings(
                        "midbelly increment must be below 0.5".into(),
                    ));
                }
            }
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(SectionError::InvalidSettings(
                "tolerance must be positive".into(),
            ));
        }
        Ok(())
    }

    fn linear_tolerance(&self) -> Tolerance {
        Tolerance {
            linear: self.tolerance,
        }
    }
}

/// Cut levels for `axis` under the configured protocol.
pub fn cut_levels(axis: &AxisPair, settings: &CsaSettings) -> Vec<CutLevel> {
    match settings.protocol {
        CutProtocol::Full => generate_cut_levels(axis, settings.slice_count, settings.increment),
        CutProtocol::Midbelly => generate_midbelly_levels(axis, settings.increment),
    }
}

/// Section of `mesh` by the plane through `point` with `normal`.
pub fn section_at<C: PlaneCutter + ?Sized>(
    cutter: &C,
    mesh: &TriangleMesh,
    point: Point3,
    normal: Vec3,
) -> Result<CrossSection> {
    let plane = Plane::new(point, normal).ok_or_else(|| {
        SectionError::InvalidPlane(format!("point {point:?}, normal {normal:?}"))
    })?;
    cutter.cut(mesh, &plane)
}

/// Enclosed section area at `point`; any failure yields 0.
pub fn cross_section_area<C: PlaneCutter + ?Sized>(
    cutter: &C,
    mesh: &TriangleMesh,
    point: Point3,
    normal: Vec3,
) -> f64 {
    match section_at(cutter, mesh, point, normal) {
        Ok(section) => section.area,
        Err(e) => {
            debug!(error = %e, "cross-section failed");
            0.0
        }
    }
}

/// Result at one cut level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelMeasurement {
    /// The level that was cut.
    pub level: CutLevel,
    /// Enclosed area (mm²), 0 when the level failed.
    pub area_mm2: f64,
    /// Boundary length of the closed loops (mm).
    pub perimeter_mm: f64,
    /// Number of closed loops found.
    pub loops: usize,
    /// Number of chains that did not close.
    pub open_chains: usize,
}

/// Everything measured for one muscle.
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleMeasurement {
    /// The summary row.
    pub record: MuscleRecord,
    /// Estimated origin and insertion.
    pub axis: AxisPair,
    /// Per-level results in cut order.
    pub levels: Vec<LevelMeasurement>,
    /// Volume and closedness of the mesh.
    pub volume: VolumeReport,
}

impl MuscleMeasurement {
    /// Per-level areas in cut order.
    pub fn areas(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.area_mm2).collect()
    }
}

/// Measure one muscle mesh.
///
/// Fails only on invalid settings or a degenerate axis. A level whose
/// section fails or encloses nothing contributes 0 and is logged; an open
/// surface still gets its best-effort volume.
pub fn measure_muscle<C: PlaneCutter + ?Sized>(
    name: &str,
    mesh: &TriangleMesh,
    settings: &CsaSettings,
    cutter: &C,
) -> Result<MuscleMeasurement> {
    settings.validate()?;

    let axis = estimate_axis(mesh, settings.axis, &settings.linear_tolerance())?;
    let normal = match settings.plane_mode {
        PlaneMode::AlongAxis => axis
            .direction()
            .ok_or(SectionError::DegenerateAxis {
                length: axis.length(),
            })?
            .into_inner(),
        PlaneMode::AxisAligned => settings.axis.unit().into_inner(),
    };

    let levels: Vec<LevelMeasurement> = cut_levels(&axis, settings)
        .into_iter()
        .map(|level| {
            let measured = match section_at(cutter, mesh, level.point, normal) {
                Ok(section) => {
                    if section.open_chains > 0 {
                        warn!(
                            muscle = name,
                            level = level.index,
                            open_chains = section.open_chains,
                            "section has open chains"
                        );
                    } else if section.area == 0.0 {
                        warn!(muscle = name, level = level.index, "section encloses no area");
                    }
                    LevelMeasurement {
                        level,
                        area_mm2: section.area,
                        perimeter_mm: section.perimeter(),
                        loops: section.loops.len(),
                        open_chains: section.open_chains,
                    }
                }
                Err(e) => {
                    warn!(muscle = name, level = level.index, error = %e, "section failed, using area 0");
                    LevelMeasurement {
                        level,
                        area_mm2: 0.0,
                        perimeter_mm: 0.0,
                        loops: 0,
                        open_chains: 0,
                    }
                }
            };
            debug!(
                muscle = name,
                level = level.index,
                fraction = level.fraction,
                area_mm2 = measured.area_mm2,
                loops = measured.loops,
                "level"
            );
            measured
        })
        .collect();

    let volume = compute_volume(mesh, settings.tolerance);
    if !volume.is_closed() {
        warn!(
            muscle = name,
            faces = volume.face_count,
            boundary_edges = volume.boundary_edges,
            non_manifold_edges = volume.non_manifold_edges,
            "surface is not closed, volume is approximate"
        );
    }

    let areas: Vec<f64> = levels.iter().map(|l| l.area_mm2).collect();
    let record = aggregate(name, volume.volume_cm3, &areas)?;

    Ok(MuscleMeasurement {
        record,
        axis,
        levels,
        volume,
    })
}

/// [`measure_muscle`] with the default cutter.
pub fn measure(name: &str, mesh: &TriangleMesh, settings: &CsaSettings) -> Result<MuscleMeasurement> {
    measure_muscle(name, mesh, settings, &MeshPlaneCutter::new(settings.tolerance))
}
