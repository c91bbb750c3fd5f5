pub mod flip;
pub mod generate;
pub mod order;
pub mod partition;
pub mod stats;
pub mod subsample;

use crate::error::{CliError, Result};
use qspace::core::io::csv::{CsvFile, TableError};
use qspace::core::io::traits::SchemeFile;
use qspace::core::models::table::SchemeTable;
use qspace::{Notice, Scheme};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

pub(crate) fn read_scheme(path: &Path) -> Result<Scheme> {
    info!("Loading scheme from {:?}", path);
    CsvFile::read_from_path(path).map_err(|source| CliError::Table {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_scheme(scheme: &Scheme, path: &Path) -> Result<()> {
    info!("Writing scheme to {:?}", path);
    CsvFile::write_to_path(scheme, path).map_err(|source| CliError::Table {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes rows in table order, so directions of different shells may
/// interleave in the file.
pub(crate) fn write_table(table: &SchemeTable, path: &Path) -> Result<()> {
    info!("Writing scheme to {:?}", path);
    File::create(path)
        .map_err(TableError::from)
        .and_then(|file| CsvFile::write_table(table, BufWriter::new(file)))
        .map_err(|source| CliError::Table {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn print_notices(notices: &[Notice]) {
    for notice in notices {
        match notice {
            Notice::SolverFallback { reason } => {
                println!("Note: exact solver unavailable ({reason}); used the heuristic solver.");
            }
            Notice::ExactSizeExceeded { size, limit } => {
                println!(
                    "Note: problem size {size} exceeds the exact limit {limit}; used the heuristic solver."
                );
            }
        }
    }
}
