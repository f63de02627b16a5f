//! Subject/muscle traversal.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use myo_mesh::MeshLoader;
use myo_section::{measure_muscle, MeshPlaneCutter, SubjectTable};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::sink::ResultSink;

/// Counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Subjects whose table was written.
    pub subjects: usize,
    /// Subjects that could not be listed or written.
    pub skipped_subjects: usize,
    /// Muscles recorded.
    pub muscles: usize,
    /// Muscles that failed to load or measure.
    pub failed: usize,
    /// Tables written, in subject order.
    pub outputs: Vec<PathBuf>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct SubjectOutcome {
    muscles: usize,
    failed: usize,
}

/// Measure every muscle of every subject under `config.input_root`.
///
/// Invalid settings or an unreadable input root abort the run. A subject
/// whose mesh directory cannot be listed or whose table cannot be written
/// is skipped; a muscle that fails is left out of its subject's table.
pub fn run_batch(config: &Config, loader: &dyn MeshLoader, sink: &dyn ResultSink) -> Result<BatchSummary> {
    config.csa.validate()?;

    let start = Instant::now();
    let subjects = subject_dirs(&config.input_root)?;
    info!(root = %config.input_root.display(), subjects = subjects.len(), "starting batch");

    let mut summary = BatchSummary::default();
    for subject_dir in &subjects {
        let subject = dir_name(subject_dir);
        let subject_start = Instant::now();

        match process_subject(config, loader, sink, &subject, subject_dir) {
            Ok((outcome, path)) => {
                info!(
                    subject = %subject,
                    muscles = outcome.muscles,
                    failed = outcome.failed,
                    elapsed_s = subject_start.elapsed().as_secs_f64(),
                    output = %path.display(),
                    "subject done"
                );
                summary.subjects += 1;
                summary.muscles += outcome.muscles;
                summary.failed += outcome.failed;
                summary.outputs.push(path);
            }
            Err(e) => {
                error!(subject = %subject, error = %format!("{e:#}"), "subject skipped");
                summary.skipped_subjects += 1;
            }
        }
    }

    summary.elapsed = start.elapsed();
    info!(
        subjects = summary.subjects,
        skipped_subjects = summary.skipped_subjects,
        muscles = summary.muscles,
        failed = summary.failed,
        elapsed_s = summary.elapsed.as_secs_f64(),
        "batch done"
    );
    Ok(summary)
}

fn process_subject(
    config: &Config,
    loader: &dyn MeshLoader,
    sink: &dyn ResultSink,
    subject: &str,
    subject_dir: &Path,
) -> Result<(SubjectOutcome, PathBuf)> {
    let mesh_dir = config.subject_mesh_dir(subject_dir);
    let files = mesh_files(config, &mesh_dir)?;
    if files.is_empty() {
        warn!(subject, dir = %mesh_dir.display(), "no mesh files");
    }

    let cutter = MeshPlaneCutter::new(config.csa.tolerance);
    let mut table = SubjectTable::new(subject);
    let mut outcome = SubjectOutcome::default();

    for file in &files {
        let muscle = config.muscle_name(file);
        let muscle_start = Instant::now();

        let mesh = match loader.load(file) {
            Ok(mesh) => mesh,
            Err(e) => {
                error!(subject, muscle = %muscle, kind = "LoadError", error = %e, "muscle skipped");
                outcome.failed += 1;
                continue;
            }
        };

        match measure_muscle(&muscle, &mesh, &config.csa, &cutter) {
            Ok(measurement) => {
                info!(
                    subject,
                    muscle = %muscle,
                    csa_max_mm2 = measurement.record.csa_max_mm2,
                    volume_cm3 = measurement.record.volume_cm3,
                    elapsed_ms = muscle_start.elapsed().as_millis() as u64,
                    "muscle measured"
                );
                table.push(measurement.record);
                outcome.muscles += 1;
            }
            Err(e) => {
                error!(subject, muscle = %muscle, kind = e.kind(), error = %e, "muscle skipped");
                outcome.failed += 1;
            }
        }
    }

    let path = sink.write_table(&table, &config.output_dir(subject_dir))?;
    Ok((outcome, path))
}

/// Immediate subdirectories of `root`, sorted by name.
fn subject_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read input root {}", root.display()))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read input root {}", root.display()))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Regular files in `dir` with the mesh extension, sorted by name.
fn mesh_files(config: &Config, dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read mesh directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read mesh directory {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && config.is_mesh_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CsvSink;
    use approx::assert_relative_eq;
    use myo_mesh::{primitives, write_stl, StlLoader};
    use myo_section::{CsaSettings, PlaneMode};
    use tempfile::tempdir;

    fn config_for(root: &Path) -> Config {
        Config {
            input_root: root.to_path_buf(),
            name_prefix_len: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let mri = root.join("HYA01").join("MRI");
        fs::create_dir_all(&mri).unwrap();
        // written out of order to check sorting
        write_stl(&primitives::cylinder(5.0, 100.0, 32), &mri.join("002_bicep.stl")).unwrap();
        write_stl(
            &primitives::box_mesh([0.0, 0.0, 0.0], [20.0, 30.0, 200.0]),
            &mri.join("001_quad_femoris.stl"),
        )
        .unwrap();
        fs::write(mri.join("003_broken.stl"), b"not an stl").unwrap();
        fs::write(mri.join("notes.txt"), "ignored").unwrap();

        let mut config = config_for(&root);
        config.csa.plane_mode = PlaneMode::AxisAligned;
        let summary = run_batch(&config, &StlLoader, &CsvSink).unwrap();
        assert_eq!(summary.subjects, 1);
        assert_eq!(summary.muscles, 2);
        assert_eq!(summary.failed, 1);

        let csv_path = mri.join("HYA01_muscle_volumes.csv");
        assert_eq!(summary.outputs, vec![csv_path.clone()]);
        let csv = fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ",muscle,volume (cm3),csa_max (mm2)");

        let row: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(row[..2], ["0", "quad_femoris"]);
        assert_relative_eq!(row[2].parse::<f64>().unwrap(), 120.0, max_relative = 1e-6);
        assert_relative_eq!(row[3].parse::<f64>().unwrap(), 600.0, max_relative = 1e-6);

        let row: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(row[..2], ["1", "bicep"]);
    }

    #[test]
    fn test_output_root_and_empty_subject() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let input = root.join("in");
        let out = root.join("out");
        fs::create_dir_all(input.join("A").join("MRI")).unwrap();
        fs::create_dir_all(input.join("B").join("MRI")).unwrap();
        write_stl(
            &primitives::cylinder(3.0, 40.0, 16),
            &input.join("B").join("MRI").join("B_1_soleus.stl"),
        )
        .unwrap();
        // a stray file in the input root is not a subject
        fs::write(input.join("README"), "x").unwrap();

        let config = Config {
            output_root: Some(out.clone()),
            ..config_for(&input)
        };
        let summary = run_batch(&config, &StlLoader, &CsvSink).unwrap();
        assert_eq!(summary.subjects, 2);
        assert_eq!(
            summary.outputs,
            vec![out.join("A_muscle_volumes.csv"), out.join("B_muscle_volumes.csv")]
        );
        assert_eq!(
            fs::read_to_string(out.join("A_muscle_volumes.csv")).unwrap(),
            ",muscle,volume (cm3),csa_max (mm2)\n"
        );
        assert!(fs::read_to_string(out.join("B_muscle_volumes.csv"))
            .unwrap()
            .contains("0,soleus,"));
    }

    #[test]
    fn test_subject_without_mesh_dir_is_skipped() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        fs::create_dir_all(root.join("S1")).unwrap();
        let summary = run_batch(&config_for(&root), &StlLoader, &CsvSink).unwrap();
        assert_eq!(summary.subjects, 0);
        assert_eq!(summary.skipped_subjects, 1);
    }

    #[test]
    fn test_invalid_settings_abort() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let config = Config {
            csa: CsaSettings {
                slice_count: 0,
                ..Default::default()
            },
            ..config_for(&root)
        };
        assert!(run_batch(&config, &StlLoader, &CsvSink).is_err());
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let mri = root.join("S").join("MRI");
        fs::create_dir_all(&mri).unwrap();
        write_stl(
            &primitives::sheared_cylinder(6.0, 90.0, [3.0, 1.0], 24),
            &mri.join("S_001_gastro.stl"),
        )
        .unwrap();

        let config = config_for(&root);
        run_batch(&config, &StlLoader, &CsvSink).unwrap();
        let first = fs::read_to_string(mri.join("S_muscle_volumes.csv")).unwrap();
        run_batch(&config, &StlLoader, &CsvSink).unwrap();
        let second = fs::read_to_string(mri.join("S_muscle_volumes.csv")).unwrap();
        assert_eq!(first, second);
    }
}
