//! Writing subject tables to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use myo_section::SubjectTable;

const HEADER: &str = ",muscle,volume (cm3),csa_max (mm2)";

/// Destination for finished subject tables.
pub trait ResultSink {
    /// Persist `table` under `dir`, returning the written file.
    fn write_table(&self, table: &SubjectTable, dir: &Path) -> Result<PathBuf>;
}

/// One CSV file per subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSink;

impl CsvSink {
    /// File name used for `subject`.
    pub fn file_name(subject: &str) -> String {
        format!("{subject}_muscle_volumes.csv")
    }

    /// The CSV text for `table`, header included.
    pub fn render(table: &SubjectTable) -> String {
        let mut out = String::with_capacity(64 * (table.len() + 1));
        out.push_str(HEADER);
        out.push('\n');
        for (i, record) in table.records().iter().enumerate() {
            out.push_str(&format!(
                "{},{},{},{}\n",
                i,
                quote(&record.muscle),
                real(record.volume_cm3),
                real(record.csa_max_mm2)
            ));
        }
        out
    }
}

impl ResultSink for CsvSink {
    fn write_table(&self, table: &SubjectTable, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(Self::file_name(table.subject()));
        fs::write(&path, Self::render(table))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Shortest round-trip form, always with a decimal point or exponent.
fn real(value: f64) -> String {
    format!("{value:?}")
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myo_mesh::TriangleMesh;
    use myo_section::{measure, CsaSettings, MuscleRecord};

    fn record(muscle: &str, volume_cm3: f64, csa_max_mm2: f64) -> MuscleRecord {
        MuscleRecord {
            muscle: muscle.into(),
            volume_cm3,
            csa_max_mm2,
        }
    }

    #[test]
    fn test_render() {
        let mut table = SubjectTable::new("HYA01");
        table.push(record("vasmed_r", 412.5, 2043.0));
        table.push(record("recfem_r", 0.1, 1e-7));
        assert_eq!(
            CsvSink::render(&table),
            ",muscle,volume (cm3),csa_max (mm2)\n\
             0,vasmed_r,412.5,2043.0\n\
             1,recfem_r,0.1,1e-7\n"
        );
    }

    #[test]
    fn test_empty_table_is_header_only() {
        let table = SubjectTable::new("HYA02");
        assert_eq!(CsvSink::render(&table), format!("{HEADER}\n"));
    }

    #[test]
    fn test_muscle_missed_by_every_level_writes_zero() {
        // flat caps at both axis ends, so no level crosses a face
        let mesh = TriangleMesh::from_buffers(
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 100.0, 1.0, 0.0, 100.0, 0.0, 1.0, 100.0,
            ],
            vec![0, 1, 2, 3, 4, 5],
        )
        .unwrap();
        let measurement = measure("m", &mesh, &CsaSettings::default()).unwrap();

        let mut table = SubjectTable::new("S");
        table.push(measurement.record);
        let csv = CsvSink::render(&table);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.ends_with(",0.0"), "{row}");
        assert!(!csv.contains("-0.0"));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_table() {
        let dir = tempfile::tempdir().unwrap();

        let mut table = SubjectTable::new("HYA03");
        table.push(record("m", 1.0, 2.0));
        let path = CsvSink.write_table(&table, &dir.path().join("nested")).unwrap();

        assert_eq!(path.file_name().unwrap(), "HYA03_muscle_volumes.csv");
        assert_eq!(fs::read_to_string(&path).unwrap(), CsvSink::render(&table));
    }
}
