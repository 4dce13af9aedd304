use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use vn_core::numeric::limit_range;
use vn_sim::{ScenarioError, SimError, run_scenario};
use vn_valve::{Direction, PopCurve, ValveCharacteristic, ValveError};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Valve(#[from] ValveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown valve '{name}' in scenario")]
    UnknownValve { name: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "vn-cli")]
#[command(about = "ValveNet CLI - pressure-sensitive valve scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario file (YAML, or JSON by extension)
        scenario_path: PathBuf,
    },
    /// Run a scenario and print or write a CSV trace
    Run {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Tabulate a valve's characteristic in both travel directions
    Curve {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Valve name
        #[arg(long)]
        valve: String,
        /// Number of sweep points
        #[arg(long, default_value_t = 21)]
        points: usize,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing (RUST_LOG selects the level)
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run {
            scenario_path,
            output,
        } => cmd_run(&scenario_path, output.as_deref()),
        Commands::Curve {
            scenario_path,
            valve,
            points,
        } => cmd_curve(&scenario_path, &valve, points),
    }
}

fn cmd_validate(scenario_path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = vn_sim::load(scenario_path)?;
    println!(
        "✓ Scenario '{}' is valid ({} nodes, {} valves, {} events)",
        scenario.name,
        scenario.nodes.len(),
        scenario.valves.len(),
        scenario.events.len()
    );
    Ok(())
}

fn cmd_run(scenario_path: &Path, output: Option<&Path>) -> CliResult<()> {
    let scenario = vn_sim::load(scenario_path)?;
    let record = run_scenario(&scenario)?;
    let csv = record.to_csv();

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Wrote {} records for {} valves to {}",
            record.t.len(),
            record.valves.len(),
            path.display()
        );
        println!("  Matrix re-factorizations: {}", record.refactor_steps);
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_curve(scenario_path: &Path, valve: &str, points: usize) -> CliResult<()> {
    if points < 2 {
        return Err(CliError::InvalidArg {
            what: "points must be at least 2",
        });
    }
    let scenario = vn_sim::load(scenario_path)?;
    let def = scenario
        .valve(valve)
        .ok_or_else(|| CliError::UnknownValve {
            name: valve.to_string(),
        })?;
    let curve = PopCurve::derive(def.id(), def.config.setpoints())?;
    let sp = curve.setpoints();

    println!("Valve '{}' ({:?})", def.id(), sp.polarity);
    for dir in [Direction::Opening, Direction::Closing] {
        println!(
            "  {:?}: pop slope {:.6}/kPa, nominal slope {:.6}/kPa, transition at {:.4} kPa",
            dir,
            curve.pop_segment(dir).slope(),
            curve.nominal_segment(dir).slope(),
            curve.transition_pressure(dir)
        );
    }

    // Sweep past the outermost thresholds by a tenth of the span
    let lo = sp.full_open.min(sp.reseat);
    let hi = sp.full_open.max(sp.reseat);
    let margin = 0.1 * (hi - lo);
    let (start, end) = (lo - margin, hi + margin);
    let step = (end - start) / (points - 1) as f64;

    let mut csv = String::from("control_pressure_kpa,opening_position,closing_position\n");
    for i in 0..points {
        let p = start + step * i as f64;
        let opening = limit_range(0.0, curve.position(Direction::Opening, p), 1.0);
        let closing = limit_range(0.0, curve.position(Direction::Closing, p), 1.0);
        csv.push_str(&format!("{:.4},{:.6},{:.6}\n", p, opening, closing));
    }
    print!("{}", csv);
    Ok(())
}
