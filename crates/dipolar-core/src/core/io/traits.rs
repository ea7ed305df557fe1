use crate::core::models::system::ParticleSystem;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Common interface for particle file formats.
pub trait ParticleFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a particle system from a reader.
    fn read_from(reader: impl Read) -> Result<ParticleSystem, Self::Error>;

    /// Writes every particle, including its force and torque accumulators.
    fn write_to(system: &ParticleSystem, writer: impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<ParticleSystem, Self::Error> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    fn write_to_path<P: AsRef<Path>>(system: &ParticleSystem, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(system, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
