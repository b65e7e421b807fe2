mod demo;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cv_core::{
    ComplexityState, ComplexityVector, Dimension, DistanceMetric, ProjectionMethod, Statistics,
    Weights, calculate_signal_loss, compute_distance, compute_pareto_frontier, generate_cycle,
    project_to_3d, random_vectors, scalar_average,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use settings::{load_config, load_scenarios, open_state, parse_vector, parse_weights};

#[derive(Parser)]
#[command(name = "cv", about = "Complexity-vector kernel: what a single scalar hides")]
struct Cli {
    /// TOML session config (falls back to $CV_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scalar weights as four comma-separated numbers, normalized to sum 1
    #[arg(long, global = true, value_parser = parse_weights)]
    weights: Option<Weights>,

    /// Scenario JSON file used instead of the built-in presets
    #[arg(long, global = true)]
    scenario_file: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weighted scalar of a vector
    Scalar {
        #[arg(value_parser = parse_vector)]
        vector: ComplexityVector,
    },

    /// Signal loss between two vectors
    Analyze {
        #[arg(value_parser = parse_vector)]
        before: ComplexityVector,
        #[arg(value_parser = parse_vector)]
        after: ComplexityVector,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the impossibility cycle from a starting vector
    Cycle {
        /// Starting vector (defaults to the configured initial vector)
        #[arg(long, value_parser = parse_vector, conflicts_with = "scenario")]
        from: Option<ComplexityVector>,
        /// Start from a named scenario
        #[arg(long)]
        scenario: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Animate the cycle step by step (Ctrl-C halts)
    Demo {
        #[arg(long)]
        scenario: Option<String>,
        /// Milliseconds between steps
        #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
        /// Number of full cycles to play
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        loops: u32,
        /// Write the final session to a JSON file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Pareto frontier of random vectors
    Pareto {
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Seed for a reproducible point cloud
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },

    /// Project a vector to three coordinates
    Project {
        #[arg(value_parser = parse_vector)]
        vector: ComplexityVector,
        /// drop-geom | drop-last | pca | weighted
        #[arg(long, default_value = "drop-last")]
        method: String,
    },

    /// Distance between two vectors
    Distance {
        #[arg(value_parser = parse_vector)]
        a: ComplexityVector,
        #[arg(value_parser = parse_vector)]
        b: ComplexityVector,
        /// euclidean | manhattan | chebyshev | weighted
        #[arg(long, default_value = "euclidean")]
        metric: String,
    },

    /// Summary statistics of a vector
    Stats {
        #[arg(value_parser = parse_vector)]
        vector: ComplexityVector,
        #[arg(long)]
        json: bool,
    },

    /// List available scenarios
    Scenarios,

    /// Load an exported session file and summarize it
    Inspect {
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Scalar { vector } => cmd_scalar(&cli, vector),
        Commands::Analyze {
            before,
            after,
            json,
        } => cmd_analyze(&cli, before, after, *json),
        Commands::Cycle {
            from,
            scenario,
            json,
        } => cmd_cycle(&cli, *from, scenario.as_deref(), *json),
        Commands::Demo {
            scenario,
            interval_ms,
            loops,
            export,
        } => {
            let state = session_for(&cli, scenario.as_deref())?;
            let options = demo::DemoOptions {
                interval: Duration::from_millis(*interval_ms),
                loops: *loops,
                export: export.clone(),
            };
            demo::run(state, options).await
        }
        Commands::Pareto { count, seed, json } => cmd_pareto(*count, *seed, *json),
        Commands::Project { vector, method } => cmd_project(vector, method),
        Commands::Distance { a, b, metric } => cmd_distance(a, b, metric),
        Commands::Stats { vector, json } => cmd_stats(vector, *json),
        Commands::Scenarios => cmd_scenarios(&cli),
        Commands::Inspect { path } => cmd_inspect(&cli, path),
    }
}

fn open_session(cli: &Cli) -> Result<ComplexityState> {
    let config = load_config(cli.config.as_deref())?;
    open_state(config, cli.weights)
}

/// A fresh session, moved onto `scenario` when one is named.
fn session_for(cli: &Cli, scenario: Option<&str>) -> Result<ComplexityState> {
    let mut state = open_session(cli)?;
    if let Some(name) = scenario {
        let scenarios = load_scenarios(cli.scenario_file.as_deref())?;
        let scenario = scenarios.find(name)?;
        state.load_scenario(scenario);
    }
    Ok(state)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn cmd_scalar(cli: &Cli, vector: &ComplexityVector) -> Result<()> {
    let state = open_session(cli)?;
    let scalar = scalar_average(vector, state.weights());
    println!("vector:  {vector}");
    println!("weights: {:?}", state.weights().to_array());
    println!("scalar:  {:.4}", scalar.value);
    Ok(())
}

fn cmd_analyze(
    cli: &Cli,
    before: &ComplexityVector,
    after: &ComplexityVector,
    json: bool,
) -> Result<()> {
    let state = open_session(cli)?;
    let report = calculate_signal_loss(before, after, state.weights());
    if json {
        return print_json(&report);
    }

    println!("before:       {before}");
    println!("after:        {after}");
    println!("scalar delta: {:+.4}", report.scalar_delta);
    for dim in Dimension::ALL {
        let marker = if report.lost.contains_key(&dim) { "  (lost)" } else { "" };
        println!(
            "  {:<12} {:+.4}{marker}",
            dim.label(),
            report.deltas[dim.index()]
        );
    }
    println!("loss type:    {}", report.loss_type.as_str());
    println!("signal lost:  {:.4}", report.total);
    Ok(())
}

fn cmd_cycle(
    cli: &Cli,
    from: Option<ComplexityVector>,
    scenario: Option<&str>,
    json: bool,
) -> Result<()> {
    let state = session_for(cli, scenario)?;
    let start = from.unwrap_or_else(|| state.current());
    let cycle = generate_cycle(&start, state.deltas(), state.weights());
    if json {
        return print_json(&cycle);
    }

    for step in cycle.steps() {
        println!(
            "{}  {:<18} {}  scalar {:.4}",
            step.index, step.label, step.vector, step.scalar
        );
    }
    let p = cycle.paradox;
    println!(
        "improved by {:.2} in total, scalar {:.4} -> {:.4} -> {:.4}",
        p.total_delta, p.initial_scalar, p.peak_scalar, p.final_scalar
    );
    Ok(())
}

fn cmd_pareto(count: usize, seed: Option<u64>, json: bool) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let points = random_vectors(count, &mut rng);
    let frontier = compute_pareto_frontier(&points);
    if json {
        return print_json(&frontier);
    }

    println!("frontier: {} of {} points", frontier.len(), points.len());
    for p in &frontier {
        println!("  #{:<4} {}", p.index, p.vector);
    }
    Ok(())
}

fn cmd_project(vector: &ComplexityVector, method: &str) -> Result<()> {
    let method = ProjectionMethod::from_str_lossy(method);
    let [x, y, z] = project_to_3d(vector, method);
    println!("{}: [{x:.4}, {y:.4}, {z:.4}]", method.as_str());
    Ok(())
}

fn cmd_distance(a: &ComplexityVector, b: &ComplexityVector, metric: &str) -> Result<()> {
    let metric = DistanceMetric::from_str_lossy(metric);
    println!("{}: {:.4}", metric.as_str(), compute_distance(a, b, metric));
    Ok(())
}

fn cmd_stats(vector: &ComplexityVector, json: bool) -> Result<()> {
    let stats = Statistics::of(vector);
    if json {
        return print_json(&stats);
    }

    println!("mean:     {:.4}", stats.mean);
    println!("min:      {:.4}", stats.min);
    println!("max:      {:.4}", stats.max);
    println!("range:    {:.4}", stats.range);
    println!("variance: {:.6}", stats.variance);
    println!("dominant: {}", stats.dominant.label());
    println!("weakest:  {}", stats.weakest.label());
    println!("balanced: {}", stats.balanced);
    Ok(())
}

fn cmd_scenarios(cli: &Cli) -> Result<()> {
    let scenarios = load_scenarios(cli.scenario_file.as_deref())?;
    for s in &scenarios.scenarios {
        println!("{:<14} {}  {}", s.name, s.initial, s.description);
    }
    Ok(())
}

fn cmd_inspect(cli: &Cli, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut state = open_session(cli)?;
    state
        .import_json(&text)
        .with_context(|| format!("failed to import {}", path.display()))?;

    println!("session:    {}", state.session_id());
    println!("started:    {}", cv_core::time::millis_to_iso8601(state.started_at()));
    println!("vector:     {}", state.current());
    println!("scalar:     {:.4}", state.scalar());
    println!("operations: {}", state.operation_count());
    println!("history:    {}/{}", state.history().len(), state.max_history());
    if let Some(name) = state.current_scenario() {
        println!("scenario:   {name}");
    }
    if let Some(report) = state.last_signal_loss() {
        println!(
            "last step:  {} (lost {:.4})",
            report.loss_type.as_str(),
            report.total
        );
    }
    Ok(())
}
