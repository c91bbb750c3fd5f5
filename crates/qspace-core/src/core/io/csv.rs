use super::traits::SchemeFile;
use crate::core::models::error::ModelError;
use crate::core::models::scheme::Scheme;
use crate::core::models::table::{DirectionRow, SchemeTable, StrengthRow};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: shell {shell} has strength {found}, but an earlier row set {expected}")]
    ConflictingStrength {
        row: usize,
        shell: usize,
        expected: f64,
        found: f64,
    },

    #[error("Invalid scheme: {0}")]
    Model(#[from] ModelError),
}

/// One CSV record. The strength column may be empty or absent; when given, it
/// must agree across all rows of a shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct CsvRecord {
    x: f64,
    y: f64,
    z: f64,
    shell: usize,
    #[serde(default)]
    strength: Option<f64>,
}

/// The `x,y,z,shell,strength` CSV layout.
pub struct CsvFile;

impl CsvFile {
    /// Parses CSV into the plain numeric table without validating the scheme.
    pub fn read_table(reader: impl Read) -> Result<SchemeTable, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut table = SchemeTable::default();
        for (row, result) in csv_reader.deserialize::<CsvRecord>().enumerate() {
            let record = result?;
            table.directions.push(DirectionRow {
                x: record.x,
                y: record.y,
                z: record.z,
                shell: record.shell,
            });
            let Some(found) = record.strength else {
                continue;
            };
            match table.strength_of(record.shell) {
                Some(expected) if expected != found => {
                    return Err(TableError::ConflictingStrength {
                        row,
                        shell: record.shell,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
                None => table.strengths.push(StrengthRow {
                    shell: record.shell,
                    strength: found,
                }),
            }
        }
        Ok(table)
    }

    pub fn write_table(table: &SchemeTable, writer: impl Write) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &table.directions {
            csv_writer.serialize(CsvRecord {
                x: row.x,
                y: row.y,
                z: row.z,
                shell: row.shell,
                strength: table.strength_of(row.shell),
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl SchemeFile for CsvFile {
    type Error = TableError;

    fn read_from(reader: impl Read) -> Result<Scheme, Self::Error> {
        let table = Self::read_table(reader)?;
        Ok(Scheme::from_table(&table)?)
    }

    fn write_to(scheme: &Scheme, writer: impl Write) -> Result<(), Self::Error> {
        Self::write_table(&scheme.to_table(), writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::direction::Direction;
    use std::fs;
    use tempfile::tempdir;

    fn two_shell_scheme() -> Scheme {
        Scheme::from_groups(
            &[Some(1000.0), Some(2000.0)],
            vec![
                vec![
                    Direction::new(1.0, 0.0, 0.0).unwrap(),
                    Direction::new(0.0, 1.0, 0.0).unwrap(),
                ],
                vec![Direction::new(0.0, 0.0, 1.0).unwrap()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn write_then_read_preserves_scheme() {
        let scheme = two_shell_scheme();
        let mut buffer = Vec::new();
        CsvFile::write_to(&scheme, &mut buffer).unwrap();
        let parsed = CsvFile::read_from(buffer.as_slice()).unwrap();
        assert_eq!(parsed, scheme);
    }

    #[test]
    fn written_csv_has_expected_header_and_rows() {
        let mut buffer = Vec::new();
        CsvFile::write_to(&two_shell_scheme(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("x,y,z,shell,strength"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn read_accepts_empty_and_missing_strength_columns() {
        let empty = "x,y,z,shell,strength\n1,0,0,0,\n0,1,0,0,\n";
        let scheme = CsvFile::read_from(empty.as_bytes()).unwrap();
        assert_eq!(scheme.strengths(), vec![None]);

        let missing = "x,y,z,shell\n1,0,0,0\n0,0,2,1\n";
        let scheme = CsvFile::read_from(missing.as_bytes()).unwrap();
        assert_eq!(scheme.shell_counts(), vec![1, 1]);
    }

    #[test]
    fn read_normalizes_non_unit_rows() {
        let text = "x,y,z,shell,strength\n0,0,5,0,1000\n";
        let scheme = CsvFile::read_from(text.as_bytes()).unwrap();
        let d = scheme.shells()[0].directions()[0];
        assert!((d.z() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn read_rejects_conflicting_strengths_within_a_shell() {
        let text = "x,y,z,shell,strength\n1,0,0,0,1000\n0,1,0,0,2000\n";
        let result = CsvFile::read_from(text.as_bytes());
        assert!(matches!(
            result,
            Err(TableError::ConflictingStrength { row: 1, shell: 0, .. })
        ));
    }

    #[test]
    fn read_rejects_zero_length_rows() {
        let text = "x,y,z,shell\n0,0,0,0\n";
        let result = CsvFile::read_from(text.as_bytes());
        assert!(matches!(
            result,
            Err(TableError::Model(ModelError::ZeroLengthDirection))
        ));
    }

    #[test]
    fn read_fails_for_malformed_csv() {
        let text = "x,y,z,shell\n1,0\n";
        assert!(matches!(
            CsvFile::read_from(text.as_bytes()),
            Err(TableError::Csv(_))
        ));
    }

    #[test]
    fn path_round_trip_uses_file_system() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheme.csv");
        let scheme = two_shell_scheme();
        CsvFile::write_to_path(&scheme, &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        assert_eq!(CsvFile::read_from_path(&path).unwrap(), scheme);
    }
}
