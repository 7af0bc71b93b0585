mod error;
mod left_heart;

use clap::{Parser, Subcommand, ValueEnum};
use mc_core::TimeGrid;
use mc_results::{RunStore, TimeseriesRecord, compute_run_id, export_csv, write_csv};
use mc_sim::{Solver, SolverOptions};
use mc_solver::Method;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::{CliError, CliResult, read_json};
use left_heart::LeftHeartParameters;

const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "mc-cli")]
#[command(about = "ModularCirc CLI - cyclic steady-state circulation models", long_about = None)]
struct Cli {
    /// Directory holding persisted runs
    #[arg(long, global = true, default_value = ".mc/runs")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the built-in left-heart loop and persist the result
    Run {
        /// Maximum number of cycles
        #[arg(long, default_value_t = 20)]
        cycles: usize,
        /// Cycle length in ms
        #[arg(long, default_value_t = 800.0)]
        t_cycle: f64,
        /// Sampling interval in ms
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
        /// Solver options as a JSON file (missing fields take defaults)
        #[arg(long)]
        options: Option<PathBuf>,
        /// Model parameters as a JSON file (missing fields take defaults)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Override the integration method
        #[arg(long, value_enum)]
        method: Option<MethodArg>,
        /// Refine algebraic quantities with Levenberg-Marquardt
        #[arg(long)]
        optimize_secondary: bool,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List persisted runs
    Runs {
        /// Only runs of this network
        #[arg(long)]
        network: Option<String>,
    },
    /// Show details of a persisted run
    ShowRun {
        /// Run ID to display
        run_id: String,
    },
    /// Export a run's time series as CSV
    Export {
        /// Run ID
        run_id: String,
        /// Columns to export (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Rk45,
    TrBdf2,
    Auto,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Rk45 => Method::Rk45,
            MethodArg::TrBdf2 => Method::TrBdf2,
            MethodArg::Auto => Method::Auto,
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,mc_sim=info")),
        )
        .init();

    let cli = Cli::parse();
    let store = RunStore::new(cli.store)?;

    match cli.command {
        Commands::Run {
            cycles,
            t_cycle,
            dt,
            options,
            params,
            method,
            optimize_secondary,
            no_cache,
        } => {
            let mut solver_options = match options {
                Some(path) => read_json::<SolverOptions>(&path)?,
                None => SolverOptions::default(),
            };
            if let Some(method) = method {
                solver_options.method = method.into();
            }
            solver_options.optimize_secondary |= optimize_secondary;
            let params = match params {
                Some(path) => read_json::<LeftHeartParameters>(&path)?,
                None => LeftHeartParameters::default(),
            };
            let grid = TimeGrid::new(cycles, t_cycle, dt)?;
            cmd_run(&store, &params, grid, solver_options, !no_cache)
        }
        Commands::Runs { network } => cmd_runs(&store, network.as_deref()),
        Commands::ShowRun { run_id } => cmd_show_run(&store, &run_id),
        Commands::Export {
            run_id,
            columns,
            output,
        } => cmd_export(&store, &run_id, &columns, output.as_deref()),
    }
}

fn cmd_run(
    store: &RunStore,
    params: &LeftHeartParameters,
    grid: TimeGrid,
    options: SolverOptions,
    use_cache: bool,
) -> CliResult<()> {
    let net = left_heart::build(params, grid)?;
    let run_id = compute_run_id(
        net.name(),
        net.all_quantity_names(),
        &grid,
        &options,
        &params_version(params),
    );

    if use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        info!(%run_id, "cache hit");
        println!("✓ Loaded from cache: {}", run_id);
        print_report(&manifest.report);
        return Ok(());
    }

    println!(
        "Running {} for at most {} cycles (T = {} ms, dt = {} ms)",
        net.name(),
        grid.n_cycles,
        grid.t_cycle,
        grid.dt
    );
    let mut solver = Solver::new(net);
    let assembly = solver.setup(options)?;
    let (lower, upper) = assembly.bandwidth();
    println!(
        "  {} differential, {} algebraic, {} init-only, {} inert quantities; bandwidth {}/{}",
        assembly.principal_ids().len(),
        assembly.secondary_ids().len(),
        assembly.init_only_ids().len(),
        assembly.inert_ids().len(),
        lower,
        upper
    );

    let report = solver.solve()?;
    store.save_solver(&run_id, &solver, SOLVER_VERSION)?;
    println!("✓ Simulation completed: {}", run_id);
    print_report(&report);
    Ok(())
}

/// Solver version with the model parameters appended; feeds the run id.
fn params_version(params: &LeftHeartParameters) -> String {
    let json = serde_json::to_string(params).unwrap_or_default();
    format!("{SOLVER_VERSION}+{json}")
}

fn print_report(report: &mc_sim::SolveReport) {
    println!("\nSolve summary:");
    println!("  Converged: {}", report.converged);
    println!("  Cycles:    {}", report.cycles);
    if let Some(error) = report.final_error() {
        println!("  Final cycle difference: {:.3e}", error);
    }
    if let Some(failure) = &report.failure {
        println!("  Integration failure: {}", failure);
    }
    println!("  Time:      {:.3}s", report.elapsed_s);
}

fn cmd_runs(store: &RunStore, network: Option<&str>) -> CliResult<()> {
    let runs = store.list_runs(network)?;

    if runs.is_empty() {
        println!("No runs found in {}", store.root_dir().display());
    } else {
        println!("Runs in {}:", store.root_dir().display());
        for manifest in runs {
            println!(
                "  {} {} ({}, {} cycles, converged: {})",
                manifest.run_id,
                manifest.network,
                manifest.timestamp,
                manifest.report.cycles,
                manifest.report.converged
            );
        }
    }
    Ok(())
}

fn cmd_show_run(store: &RunStore, run_id: &str) -> CliResult<()> {
    println!("Loading run: {}", run_id);
    let (manifest, table) = store.load_table(run_id)?;

    println!("\nRun Summary:");
    println!("  Network:    {}", manifest.network);
    println!("  Timestamp:  {}", manifest.timestamp);
    println!("  Time points: {}", table.n_rows());
    if let (Some(first), Some(last)) = (table.times().first(), table.times().last()) {
        println!("  Time range: {:.3} - {:.3}", first, last);
    }
    print_report(&manifest.report);

    println!("\nQuantities:");
    for (col, name) in table.names().iter().enumerate() {
        let values = table.column(col);
        let (lo, hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        println!("  {:<10} [{:.4e}, {:.4e}]", name, lo, hi);
    }
    Ok(())
}

fn cmd_export(
    store: &RunStore,
    run_id: &str,
    columns: &[String],
    output: Option<&Path>,
) -> CliResult<()> {
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_timeseries(run_id)?;

    let csv = if columns.is_empty() {
        export_csv(&manifest, &records)
    } else {
        let indices = columns
            .iter()
            .map(|name| {
                manifest
                    .columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| CliError::UnknownColumn(name.clone()))
            })
            .collect::<CliResult<Vec<_>>>()?;
        let selected: Vec<TimeseriesRecord> = records
            .iter()
            .map(|r| TimeseriesRecord {
                time_s: r.time_s,
                values: indices.iter().map(|&i| r.values[i]).collect(),
            })
            .collect();
        let mut buf = Vec::new();
        write_csv(columns, &selected, &mut buf)?;
        String::from_utf8_lossy(&buf).into_owned()
    };

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {} rows to {}", records.len(), path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}
