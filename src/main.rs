use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tigermdp::belief::policy::{policy_table, thresholds, write_policy_csv};
use tigermdp::discrete_dp::random::RandomDpSpec;
use tigermdp::discrete_dp::solver::DEFAULT_K;
use tigermdp::representations::compare_representations;
use tigermdp::{read_tiger_config, Result, SolveMethod, SolverOptions, TigerConfig};

#[derive(Parser, Debug)]
#[command(name = "tigermdp", version, about = "Solve the tiger POMDP on a discretized belief grid")]
struct Cli {
    /// Level of verbosity: -v inputs and results, -vv algorithm debugging, -vvv everything.
    /// RUST_LOG overrides this when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the belief-grid MDP, solve it and report the policy thresholds
    Solve(SolveArgs),
    /// Solve one random MDP in dense 3-D, dense pair and sparse pair encodings and compare
    Compare(CompareArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    /// value iteration
    Vi,
    /// policy iteration
    Pi,
    /// modified policy iteration
    Mpi,
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// JSON experiment configuration; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    grid_size: Option<usize>,
    #[arg(long)]
    discount: Option<f64>,
    /// P(right signal | tiger left)
    #[arg(long)]
    p_left: Option<f64>,
    /// P(left signal | tiger right)
    #[arg(long)]
    p_right: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    reward: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    penalty: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    cost: Option<f64>,
    #[arg(long, value_enum)]
    method: Option<MethodArg>,
    /// Policy operator applications per round of modified policy iteration
    #[arg(long)]
    k: Option<usize>,
    #[arg(long)]
    epsilon: Option<f64>,
    #[arg(long)]
    max_iter: Option<usize>,
    /// Write index, belief, action and value for every grid point as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[arg(long, default_value_t = 100)]
    states: usize,
    #[arg(long, default_value_t = 10)]
    actions: usize,
    /// Successor states per state-action pair
    #[arg(long, default_value_t = 5)]
    support: usize,
    #[arg(long, default_value_t = 0.95)]
    discount: f64,
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
    #[arg(long, default_value_t = 1234)]
    seed: u64,
    #[arg(long, default_value_t = 1e-6)]
    epsilon: f64,
    #[arg(long, default_value_t = 10_000)]
    max_iter: usize,
    #[arg(long, default_value_t = DEFAULT_K)]
    k: usize,
    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let outcome = match cli.command {
        Command::Solve(args) => solve(args),
        Command::Compare(args) => compare(args),
    };
    if let Err(e) = outcome {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_config(args: &SolveArgs) -> Result<TigerConfig> {
    let mut config = match &args.config {
        Some(path) => read_tiger_config(path)?,
        None => TigerConfig::default(),
    };
    if let Some(g) = args.grid_size {
        config.grid_size = g;
    }
    if let Some(d) = args.discount {
        config.discount = d;
    }
    if let Some(p) = args.p_left {
        config.noise.p_left = p;
    }
    if let Some(p) = args.p_right {
        config.noise.p_right = p;
    }
    if let Some(r) = args.reward {
        config.payoffs.reward = r;
    }
    if let Some(p) = args.penalty {
        config.payoffs.penalty = p;
    }
    if let Some(c) = args.cost {
        config.payoffs.cost = c;
    }
    if let Some(e) = args.epsilon {
        config.solver.epsilon = e;
    }
    if let Some(m) = args.max_iter {
        config.solver.max_iter = m;
    }
    let current_k = match config.method {
        SolveMethod::ModifiedPolicyIteration { k } => k,
        _ => DEFAULT_K,
    };
    let k = args.k.unwrap_or(current_k);
    config.method = match args.method {
        Some(MethodArg::Vi) => SolveMethod::ValueIteration,
        Some(MethodArg::Pi) => SolveMethod::PolicyIteration,
        Some(MethodArg::Mpi) => SolveMethod::ModifiedPolicyIteration { k },
        None => match config.method {
            SolveMethod::ModifiedPolicyIteration { .. } => SolveMethod::ModifiedPolicyIteration { k },
            other => other,
        },
    };
    config.validate()?;
    Ok(config)
}

fn solve(args: SolveArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    info!(?config, "resolved configuration");
    let problem = config.problem()?;

    let start = Instant::now();
    let dp = problem.descriptor()?;
    let assembly = start.elapsed();

    let start = Instant::now();
    let result = dp.solve(config.method, &config.solver)?;
    let solve_time = start.elapsed();

    let table = policy_table(&problem.grid, &result)?;
    println!(
        "grid: {} points, pairs: {}, discount: {}",
        problem.grid.len(),
        dp.num_pairs(),
        config.discount
    );
    println!(
        "{}: {} iterations, converged: {}, assembly: {:?}, solve: {:?}",
        result.method, result.num_iter, result.converged, assembly, solve_time
    );
    let steps = thresholds(&table);
    if steps.is_empty() {
        println!("policy is constant: {}", table[0].action);
    }
    for t in steps.iter() {
        println!("b >= {:.4} (index {}): {} -> {}", t.belief, t.index, t.from, t.to);
    }
    if let Some(path) = &args.output {
        write_policy_csv(path, &table)?;
        println!("policy written to {}", path.display());
    }
    Ok(())
}

fn compare(args: CompareArgs) -> Result<()> {
    let spec = RandomDpSpec {
        num_states: args.states,
        num_actions: args.actions,
        support: args.support,
        discount: args.discount,
        scale: args.scale,
        seed: args.seed,
    };
    let options = SolverOptions {
        epsilon: args.epsilon,
        max_iter: args.max_iter,
    };
    let report = compare_representations(&spec, &options, &SolveMethod::all(args.k))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (method, representation, seconds) in report.timings() {
            println!("{:<32} {:<20} {:>10.6}s", method.to_string(), format!("{:?}", representation), seconds);
        }
    }
    report.verify()?;
    println!("all representations agree");
    Ok(())
}
