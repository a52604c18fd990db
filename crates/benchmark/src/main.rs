//! Coverage reoptimization runner CLI

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use u_coverage_benchmark::{
    builtin, builtin_scenarios, GridSpec, RunReport, RunnerConfig, Scenario, ScenarioRunner,
    SiteLayout, SyntheticGenerator,
};
use u_coverage_core::ReoptConfig;
use u_coverage_d2::DEFAULT_SNAP_TOLERANCE;

#[derive(Parser)]
#[command(name = "reopt-runner")]
#[command(about = "Chi-metric reoptimization runner for U-Coverage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in scenarios
    List,

    /// Run a built-in scenario
    Run {
        /// Scenario name (see `list`), or "all"
        #[arg(short, long)]
        scenario: String,

        #[command(flatten)]
        args: RunArgs,
    },

    /// Run a scenario from a JSON file
    RunFile {
        /// Path to the JSON scenario file
        file: PathBuf,

        #[command(flatten)]
        args: RunArgs,
    },

    /// Generate and run a seeded jittered grid
    Synthetic {
        /// Columns of cells
        #[arg(long, default_value = "3")]
        cols: usize,

        /// Rows of cells per column
        #[arg(long, default_value = "3")]
        rows: usize,

        /// Field width
        #[arg(long, default_value = "10.0")]
        width: f64,

        /// Field height
        #[arg(long, default_value = "10.0")]
        height: f64,

        /// Coverage radius
        #[arg(long, default_value = "0.5")]
        radius: f64,

        /// Scatter robots over the field instead of a single depot
        #[arg(long)]
        scattered: bool,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Also save the generated scenario (JSON)
        #[arg(long)]
        save_scenario: Option<PathBuf>,

        #[command(flatten)]
        args: RunArgs,
    },

    /// Write a built-in scenario to a JSON file
    Export {
        /// Scenario name
        scenario: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Maximum number of rounds
    #[arg(short, long, default_value = "10")]
    iterations: u32,

    /// Boundary samples per pairwise search
    #[arg(long, default_value = "100")]
    samples: usize,

    /// Worker threads (0 = all cores, 1 = sequential)
    #[arg(short, long, default_value = "0")]
    threads: usize,

    /// Time limit in seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    time_limit: u64,

    /// Maximum descent depth below the worst cell
    #[arg(long)]
    max_depth: Option<usize>,

    /// Stop at the first round without improvement
    #[arg(long)]
    stop_when_stuck: bool,

    /// Vertex snapping tolerance of the geometry kernel
    #[arg(long, default_value_t = DEFAULT_SNAP_TOLERANCE)]
    snap_tolerance: f64,

    /// Output file for the report (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file for the per-round record (CSV)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Suppress per-round output
    #[arg(short, long)]
    quiet: bool,
}

impl RunArgs {
    fn runner_config(&self) -> RunnerConfig {
        let mut reopt = ReoptConfig::new()
            .with_iterations(self.iterations)
            .with_sample_count(self.samples)
            .with_threads(self.threads)
            .with_time_limit(self.time_limit * 1000)
            .with_stop_when_stuck(self.stop_when_stuck);
        if let Some(depth) = self.max_depth {
            reopt = reopt.with_max_depth(depth);
        }

        RunnerConfig::new()
            .with_reopt(reopt)
            .with_snap_tolerance(self.snap_tolerance)
            .with_progress(!self.quiet)
    }

    fn execute(&self, scenarios: &[Scenario]) -> anyhow::Result<()> {
        let runner = ScenarioRunner::new(self.runner_config());

        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let report = runner
                .run(scenario)
                .with_context(|| format!("scenario {} failed", scenario.name))?;
            report.print_summary();
            reports.push(report);
        }

        self.save(&reports)
    }

    fn save(&self, reports: &[RunReport]) -> anyhow::Result<()> {
        if let Some(path) = &self.output {
            let json = match reports {
                [single] => serde_json::to_string_pretty(single)?,
                _ => serde_json::to_string_pretty(reports)?,
            };
            std::fs::write(path, json)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("Report saved to: {}", path.display());
        }

        if let Some(path) = &self.csv {
            for report in reports {
                let file = if reports.len() == 1 {
                    path.clone()
                } else {
                    path.with_file_name(format!(
                        "{}-{}",
                        report.scenario,
                        path.file_name().map_or_else(
                            || "rounds.csv".to_string(),
                            |n| n.to_string_lossy().into_owned()
                        )
                    ))
                };
                report
                    .save_csv(&file)
                    .with_context(|| format!("cannot write {}", file.display()))?;
                println!("CSV saved to: {}", file.display());
            }
        }

        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            println!("Built-in scenarios:");
            println!("===================");
            for scenario in builtin_scenarios() {
                println!(
                    "  {:<14} {} cells, radius {}  {}",
                    scenario.name,
                    scenario.cells.len(),
                    scenario.radius,
                    scenario.description
                );
            }
            println!("\nUse 'reopt-runner run -s <SCENARIO>' to run one");
        }

        Commands::Run { scenario, args } => {
            let scenarios = if scenario == "all" {
                builtin_scenarios()
            } else {
                match builtin(&scenario) {
                    Some(s) => vec![s],
                    None => anyhow::bail!("Unknown scenario: {} (see `reopt-runner list`)", scenario),
                }
            };
            args.execute(&scenarios)?;
        }

        Commands::RunFile { file, args } => {
            let scenario = Scenario::load_json(&file)
                .with_context(|| format!("cannot read scenario {}", file.display()))?;
            args.execute(&[scenario])?;
        }

        Commands::Synthetic {
            cols,
            rows,
            width,
            height,
            radius,
            scattered,
            seed,
            save_scenario,
            args,
        } => {
            let spec = GridSpec {
                cols,
                rows,
                width,
                height,
                radius,
                layout: if scattered {
                    SiteLayout::Scattered
                } else {
                    SiteLayout::Depot
                },
                ..GridSpec::default()
            };
            let scenario = SyntheticGenerator::with_seed(seed).grid(&spec);
            println!(
                "Generated {} (seed={}, {} cells)",
                scenario.name,
                seed,
                scenario.cells.len()
            );

            if let Some(path) = save_scenario {
                scenario
                    .save_json(&path)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("Scenario saved to: {}", path.display());
            }

            args.execute(&[scenario])?;
        }

        Commands::Export { scenario, output } => {
            let Some(s) = builtin(&scenario) else {
                anyhow::bail!("Unknown scenario: {}", scenario);
            };
            s.save_json(&output)
                .with_context(|| format!("cannot write {}", output.display()))?;
            println!("Scenario {} saved to: {}", s.name, output.display());
        }
    }

    Ok(())
}
