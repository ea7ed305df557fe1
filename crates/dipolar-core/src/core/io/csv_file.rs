use super::traits::ParticleFile;
use crate::core::models::particle::Particle;
use crate::core::models::system::ParticleSystem;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParticleFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid particle on row {row}: {message}")]
    InvalidParticle { row: usize, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ParticleRecord {
    x: f64,
    y: f64,
    z: f64,
    dipm: f64,
    ox: f64,
    oy: f64,
    oz: f64,
    #[serde(default)]
    fx: f64,
    #[serde(default)]
    fy: f64,
    #[serde(default)]
    fz: f64,
    #[serde(default)]
    tx: f64,
    #[serde(default)]
    ty: f64,
    #[serde(default)]
    tz: f64,
}

impl From<&Particle> for ParticleRecord {
    fn from(p: &Particle) -> Self {
        Self {
            x: p.position.x,
            y: p.position.y,
            z: p.position.z,
            dipm: p.dipm,
            ox: p.orientation.x,
            oy: p.orientation.y,
            oz: p.orientation.z,
            fx: p.force.x,
            fy: p.force.y,
            fz: p.force.z,
            tx: p.torque.x,
            ty: p.torque.y,
            tz: p.torque.z,
        }
    }
}

/// Comma-separated particle table with a header row.
///
/// Required columns: `x,y,z,dipm,ox,oy,oz`. The accumulator columns
/// `fx,fy,fz,tx,ty,tz` are optional on input and always written on output.
pub struct CsvParticleFile;

impl ParticleFile for CsvParticleFile {
    type Error = ParticleFileError;

    fn read_from(reader: impl Read) -> Result<ParticleSystem, Self::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut system = ParticleSystem::new();
        for (index, result) in csv_reader.deserialize::<ParticleRecord>().enumerate() {
            let record = result?;
            let row = index + 1;

            let values = [record.x, record.y, record.z, record.dipm, record.ox, record.oy, record.oz];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ParticleFileError::InvalidParticle {
                    row,
                    message: "non-finite position, magnitude or orientation".to_string(),
                });
            }
            let orientation = Vector3::new(record.ox, record.oy, record.oz);
            if record.dipm != 0.0 && orientation.norm_squared() == 0.0 {
                return Err(ParticleFileError::InvalidParticle {
                    row,
                    message: "dipolar particle with zero orientation".to_string(),
                });
            }

            let mut particle = Particle::new(
                Point3::new(record.x, record.y, record.z),
                record.dipm,
                orientation,
            );
            particle.force = Vector3::new(record.fx, record.fy, record.fz);
            particle.torque = Vector3::new(record.tx, record.ty, record.tz);
            system.add_particle(particle);
        }
        Ok(system)
    }

    fn write_to(system: &ParticleSystem, writer: impl Write) -> Result<(), Self::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (_, particle) in system.particles_iter() {
            csv_writer.serialize(ParticleRecord::from(particle))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
