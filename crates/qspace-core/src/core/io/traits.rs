use crate::core::models::scheme::Scheme;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Common interface for the on-disk representations of a [`Scheme`].
///
/// Implementors only provide the stream-based methods; the path-based
/// variants open the file and delegate.
pub trait SchemeFile {
    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads a scheme from any byte source.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be parsed or the parsed table
    /// does not describe a valid scheme.
    fn read_from(reader: impl Read) -> Result<Scheme, Self::Error>;

    /// Writes a scheme to any byte sink.
    fn write_to(scheme: &Scheme, writer: impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Scheme, Self::Error> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    fn write_to_path<P: AsRef<Path>>(scheme: &Scheme, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(scheme, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
