use crate::cli::EvaluateArgs;
use crate::config::{self, AppConfig};
use crate::error::{CliError, Result};
use dipolar::{
    core::{
        forcefield::term::PressureStatus,
        io::{csv_file::CsvParticleFile, traits::ParticleFile},
    },
    engine::collaborators::Collaborators,
    workflows::{self, evaluate::EvaluationReport},
};
use tracing::{info, warn};

pub fn run(args: EvaluateArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = config::build_config(&args)?;
    execute(&app_config)
}

fn execute(app_config: &AppConfig) -> Result<()> {
    info!("Loading particles from {:?}", &app_config.input_path);
    let mut system = CsvParticleFile::read_from_path(&app_config.input_path).map_err(|e| {
        CliError::FileParsing {
            path: app_config.input_path.clone(),
            source: e.into(),
        }
    })?;
    system.set_rotation(app_config.rotation);

    if system.is_empty() {
        warn!("Input file contains no particles.");
    }

    println!(
        "Evaluating dipolar interactions of {} particle(s)...",
        system.len()
    );
    info!("Invoking the core evaluation workflow...");

    // Only the built-in methods are reachable from the command line; mesh,
    // external and GPU methods report themselves as unavailable.
    let report = workflows::evaluate::run(
        &mut system,
        &app_config.core_config,
        Collaborators::new(),
    )?;

    print_report(&report);

    if let Some(output_path) = &app_config.output_path {
        CsvParticleFile::write_to_path(&system, output_path).map_err(|e| {
            CliError::FileWriting {
                path: output_path.clone(),
                source: e.into(),
            }
        })?;
        info!("Wrote forces and torques to {:?}", output_path);
        println!("Particle forces and torques saved to: {}", output_path.display());
    }

    Ok(())
}

fn print_report(report: &EvaluationReport) {
    println!("Method: {}", report.method);
    println!("Total dipolar energy: {:.10e}", report.total_energy);
    if report.energies.len() > 1 {
        for (index, term) in report.energies.iter().enumerate() {
            println!("  term {}: {:.10e}", index, term);
        }
    }
    if let Some((contribution, status)) = &report.pressure {
        println!("Virial: {:?}", contribution.virial);
        if *status == PressureStatus::Incomplete {
            println!("Warning: the pressure contribution of this method is incomplete.");
        }
    }
    let f = &report.net_force;
    let t = &report.net_torque;
    let m = &report.total_dipole_moment;
    println!("Net force:  [{:.6e}, {:.6e}, {:.6e}]", f.x, f.y, f.z);
    println!("Net torque: [{:.6e}, {:.6e}, {:.6e}]", t.x, t.y, t.z);
    println!("Total dipole moment: [{:.6e}, {:.6e}, {:.6e}]", m.x, m.y, m.z);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipolar::core::models::geometry::BoxGeometry;
    use dipolar::engine::config::{
        DipolarMethod, DipoleConfiguration, EvaluationConfigBuilder, ReplicaCutoff,
    };
    use dipolar::engine::error::EngineError;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn write_pair(dir: &Path) -> PathBuf {
        let path = dir.join("pair.csv");
        fs::write(
            &path,
            "x,y,z,dipm,ox,oy,oz\n1.0,1.0,1.0,1.0,0.0,0.0,1.0\n2.0,1.0,1.0,1.0,0.0,0.0,1.0\n",
        )
        .unwrap();
        path
    }

    fn app_config(input: PathBuf, output: Option<PathBuf>, method: DipolarMethod) -> AppConfig {
        let core_config = EvaluationConfigBuilder::new()
            .interaction(DipoleConfiguration::new(1.0, method).unwrap())
            .geometry(BoxGeometry::cubic(10.0))
            .build()
            .unwrap();
        AppConfig {
            input_path: input,
            output_path: output,
            rotation: true,
            core_config,
        }
    }

    #[test]
    fn writes_forces_for_a_dipole_pair() {
        let dir = tempdir().unwrap();
        let input = write_pair(dir.path());
        let output = dir.path().join("out.csv");
        let config = app_config(
            input,
            Some(output.clone()),
            DipolarMethod::DirectSum {
                replica_cutoff: ReplicaCutoff::ZERO,
            },
        );

        execute(&config).unwrap();

        let system = CsvParticleFile::read_from_path(&output).unwrap();
        assert_eq!(system.len(), 2);
        // Parallel dipoles side by side repel along the separation axis with 3/r^4.
        let mut fx: Vec<f64> = system.particles_iter().map(|(_, p)| p.force.x).collect();
        fx.sort_by(|a, b| a.total_cmp(b));
        assert!(f64_approx_equal(fx[0], -3.0));
        assert!(f64_approx_equal(fx[1], 3.0));
    }

    #[test]
    fn missing_input_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let config = app_config(dir.path().join("absent.csv"), None, DipolarMethod::None);

        let result = execute(&config);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn unavailable_method_surfaces_engine_error() {
        let dir = tempdir().unwrap();
        let input = write_pair(dir.path());
        let config = app_config(input, None, DipolarMethod::MeshEwald);

        let result = execute(&config);
        assert!(matches!(
            result,
            Err(CliError::DipolarCore(EngineError::Config(_)))
        ));
    }
}
