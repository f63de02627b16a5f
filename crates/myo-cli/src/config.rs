//! Run configuration: a TOML file, then command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use myo_section::{CsaSettings, CutProtocol, PlaneMode};
use serde::{Deserialize, Serialize};

/// Everything a batch run needs besides the loader and the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one subdirectory per subject.
    pub input_root: PathBuf,
    /// Where CSV files go; next to the meshes when unset.
    pub output_root: Option<PathBuf>,
    /// Name of the mesh directory inside each subject.
    pub mesh_dir: String,
    /// Mesh file extension, compared case-insensitively.
    pub extension: String,
    /// Characters dropped from the front of a file stem to get the muscle name.
    pub name_prefix_len: usize,
    /// Measurement parameters.
    pub csa: CsaSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("."),
            output_root: None,
            mesh_dir: "MRI".into(),
            extension: "stl".into(),
            name_prefix_len: 6,
            csa: CsaSettings::default(),
        }
    }
}

/// Values given on the command line, each replacing the configured one.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub mesh_dir: Option<String>,
    pub name_prefix_len: Option<usize>,
    pub slice_count: Option<usize>,
    pub increment: Option<f64>,
    pub plane_mode: Option<PlaneMode>,
    pub protocol: Option<CutProtocol>,
}

impl Config {
    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse TOML; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Replace configured values with the ones given on the command line.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.input_root {
            self.input_root = v;
        }
        if let Some(v) = overrides.output_root {
            self.output_root = Some(v);
        }
        if let Some(v) = overrides.mesh_dir {
            self.mesh_dir = v;
        }
        if let Some(v) = overrides.name_prefix_len {
            self.name_prefix_len = v;
        }
        if let Some(v) = overrides.slice_count {
            self.csa.slice_count = v;
        }
        if let Some(v) = overrides.increment {
            self.csa.increment = v;
        }
        if let Some(v) = overrides.plane_mode {
            self.csa.plane_mode = v;
        }
        if let Some(v) = overrides.protocol {
            self.csa.protocol = v;
        }
    }

    /// Muscle name for a mesh file: the stem without its subject prefix.
    ///
    /// A stem no longer than the prefix is kept whole.
    pub fn muscle_name(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem.chars().count() > self.name_prefix_len {
            stem.chars().skip(self.name_prefix_len).collect()
        } else {
            stem
        }
    }

    /// Check if `path` has the configured mesh extension.
    pub fn is_mesh_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Directory holding a subject's meshes.
    pub fn subject_mesh_dir(&self, subject_dir: &Path) -> PathBuf {
        subject_dir.join(&self.mesh_dir)
    }

    /// Directory a subject's CSV is written to.
    pub fn output_dir(&self, subject_dir: &Path) -> PathBuf {
        match &self.output_root {
            Some(root) => root.clone(),
            None => self.subject_mesh_dir(subject_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myo_math::Axis;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mesh_dir, "MRI");
        assert_eq!(config.name_prefix_len, 6);
        assert_eq!(config.csa.slice_count, 17);
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml_str(
            r#"
            input_root = "/data/HYA"
            output_root = "/data/out"
            name_prefix_len = 4

            [csa]
            slice_count = 9
            increment = 0.1
            axis = "y"
            plane_mode = "axis-aligned"
            protocol = "midbelly"
            "#,
        )
        .unwrap();
        assert_eq!(config.input_root, PathBuf::from("/data/HYA"));
        assert_eq!(config.output_root, Some(PathBuf::from("/data/out")));
        assert_eq!(config.name_prefix_len, 4);
        assert_eq!(config.extension, "stl");
        assert_eq!(config.csa.slice_count, 9);
        assert_eq!(config.csa.increment, 0.1);
        assert_eq!(config.csa.axis, Axis::Y);
        assert_eq!(config.csa.plane_mode, PlaneMode::AxisAligned);
        assert_eq!(config.csa.protocol, CutProtocol::Midbelly);
        assert_eq!(config.csa.tolerance, 1e-6);
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        assert!(Config::from_toml_str("[csa]\nplane_mode = \"sideways\"\n").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        config.apply(Overrides {
            output_root: Some(PathBuf::from("out")),
            slice_count: Some(5),
            plane_mode: Some(PlaneMode::AxisAligned),
            ..Default::default()
        });
        assert_eq!(config.output_root, Some(PathBuf::from("out")));
        assert_eq!(config.csa.slice_count, 5);
        assert_eq!(config.csa.plane_mode, PlaneMode::AxisAligned);
        assert_eq!(config.csa.increment, 0.05);
        assert_eq!(config.mesh_dir, "MRI");
    }

    #[test]
    fn test_muscle_name() {
        let config = Config::default();
        assert_eq!(
            config.muscle_name(Path::new("/x/MRI/HYA01_vasmed_r.stl")),
            "vasmed_r"
        );
        assert_eq!(config.muscle_name(Path::new("short.stl")), "short");
        assert_eq!(config.muscle_name(Path::new("HYA01_.stl")), "HYA01_");

        let config = Config {
            name_prefix_len: 4,
            ..Default::default()
        };
        assert_eq!(config.muscle_name(Path::new("001_quad_femoris.stl")), "quad_femoris");
    }

    #[test]
    fn test_mesh_files_and_dirs() {
        let config = Config::default();
        assert!(config.is_mesh_file(Path::new("a.stl")));
        assert!(config.is_mesh_file(Path::new("a.STL")));
        assert!(!config.is_mesh_file(Path::new("a.csv")));
        assert!(!config.is_mesh_file(Path::new("stl")));

        let subject = Path::new("/data/HYA01");
        assert_eq!(config.output_dir(subject), PathBuf::from("/data/HYA01/MRI"));
        let config = Config {
            output_root: Some(PathBuf::from("/out")),
            ..Default::default()
        };
        assert_eq!(config.output_dir(subject), PathBuf::from("/out"));
    }
}
