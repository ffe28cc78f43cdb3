//! optdriver CLI: runs a driver described by a TOML run file on one of the
//! built-in reference models.

use anyhow::Context;
use clap::{Parser, Subcommand};
use optdriver::config::{
    ConfigManager, ConfigSection, DesignVarSpec, DriverKind, ReferenceModel, RunConfig,
};
use optdriver::{ConstrainedGradientDriver, Driver, Genetic, RunReport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optdriver", version, about = "Design optimization drivers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the driver configured in a run file
    Run {
        /// TOML run file; OPTDRIVER__SECTION__KEY variables override it
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print an example run file
    Template,
    /// Print the option manifests of both drivers as JSON
    Manifest,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, json } => {
            let manager = ConfigManager::new();
            manager
                .load_from_file(&file)
                .with_context(|| format!("failed to load run file {}", file.display()))?;
            let report = run(&manager.get())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Template => print!("{}", template().to_toml_string()?),
        Commands::Manifest => {
            let config = RunConfig::default();
            let manifests = vec![config.genetic.to_manifest(), config.gradient.to_manifest()];
            println!("{}", serde_json::to_string_pretty(&manifests)?);
        }
    }
    Ok(())
}

fn run(config: &RunConfig) -> anyhow::Result<RunReport> {
    let mut model = config.run.model.build()?;
    let name = config.driver_name();

    let report = match config.run.driver {
        DriverKind::Genetic => {
            let mut driver = Genetic::from_config(name, config.genetic.clone(), &model)?;
            driver.run(&mut model)?
        }
        DriverKind::Gradient => {
            let mut driver = ConstrainedGradientDriver::with_config(name, config.gradient.clone());
            driver.run(&mut model)?
        }
    };
    Ok(report)
}

fn print_report(report: &RunReport) {
    println!("driver:      {}", report.driver);
    println!("iterations:  {}", report.iterations);
    println!("evaluations: {}", report.evaluations);
    println!("converged:   {}", report.converged);
    println!("feasible:    {}", report.feasible);
    println!("objective:   {}", report.objective);
    for (path, value) in &report.design_values {
        println!("  {} = {}", path, value);
    }
}

/// Genetic run over the mixed sphere function; the gradient section is
/// set up for the constrained paraboloid.
fn template() -> RunConfig {
    let mut config = RunConfig::default();
    config.run.name = "driver".to_string();
    config.run.driver = DriverKind::Genetic;
    config.run.model = ReferenceModel::Sphere;

    config.genetic.objective = "comp.total".to_string();
    config.genetic.seed = Some(123);
    config.genetic.design_vars = vec![
        DesignVarSpec::new("comp.x"),
        DesignVarSpec::new("comp.y"),
        DesignVarSpec::bounded("comp.z", -5.0, 5.0),
    ];

    config.gradient.objective = "paraboloid.f_xy".to_string();
    config.gradient.design_vars = vec!["paraboloid.x".to_string(), "paraboloid.y".to_string()];
    config.gradient.lower_bounds = vec![-50.0, -50.0];
    config.gradient.upper_bounds = vec![50.0, 50.0];
    config.gradient.constraints = vec!["paraboloid.y-paraboloid.x+15.0".to_string()];
    config.gradient.itmax = 30;
    config.gradient.fdch = 1.0e-6;
    config.gradient.fdchm = 1.0e-6;
    config
}
