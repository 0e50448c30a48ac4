//! `jt` - exact inference and EM learning for discrete Bayesian networks.
//!
//! Every command writes one JSON document to stdout. Logs and error reports
//! go to stderr, and the exit code follows [`ExitCode`].

use clap::{Args, Parser, Subcommand, ValueEnum};
use jt_common::{Combination, Error, Evidence, Network, Node, Result, SCHEMA_VERSION};
use jt_config::{load_config, LoadedConfig};
use jt_core::exit_codes::ExitCode;
use jt_core::inference::{IpfpSettings, Inference};
use jt_core::io::{parse_evidence_json, read_evidence, read_network, read_observations, write_network};
use jt_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use jt_core::{learn, EnumerationEngine, InferAllOptions, JunctionTreeEngine};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exact inference on discrete Bayesian networks via junction trees
#[derive(Parser)]
#[command(name = "jt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Engine configuration file (TOML or JSON)
    #[arg(long, global = true, env = "JT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format for stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probability of a state combination given evidence
    Infer(InferArgs),

    /// Posterior distribution of every node
    InferAll(InferAllArgs),

    /// Fit CPTs to observations with Expectation-Maximization
    Learn(LearnArgs),

    /// Print the junction tree built for a network
    Structure(StructureArgs),

    /// Validate a network file
    Check(CheckArgs),

    /// JSON Schema of the network file format
    Schema,

    /// Show the effective engine configuration
    Config,
}

#[derive(Args, Debug)]
struct EvidenceOpts {
    /// Evidence file (JSON or YAML)
    #[arg(long, conflicts_with = "evidence_json")]
    evidence: Option<PathBuf>,

    /// Inline evidence, e.g. '{"ALARM": "T", "RAIN": {"T": 3, "F": 7}}'
    #[arg(long)]
    evidence_json: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    JunctionTree,
    Enumeration,
}

impl EngineKind {
    fn name(self) -> &'static str {
        match self {
            EngineKind::JunctionTree => "junction-tree",
            EngineKind::Enumeration => "enumeration",
        }
    }
}

#[derive(Args, Debug)]
struct InferArgs {
    /// Network file (JSON or YAML)
    #[arg(long)]
    network: PathBuf,

    /// Queried assignment, NODE=STATE; repeat for a joint query
    #[arg(long, value_parser = parse_assignment)]
    query: Vec<(String, String)>,

    #[command(flatten)]
    evidence: EvidenceOpts,

    /// Inference engine
    #[arg(long, value_enum, default_value = "junction-tree")]
    engine: EngineKind,
}

#[derive(Args, Debug)]
struct InferAllArgs {
    /// Network file (JSON or YAML)
    #[arg(long)]
    network: PathBuf,

    #[command(flatten)]
    evidence: EvidenceOpts,

    /// Decimal digits in the output (default from config)
    #[arg(long)]
    precision: Option<u32>,

    /// Clamp evidenced nodes to their evidence distribution
    #[arg(long)]
    clamp: bool,

    /// Rebuild the junction tree instead of using the cache
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct LearnArgs {
    /// Network file holding the initial parameters
    #[arg(long)]
    network: PathBuf,

    /// Observations: a list of evidence objects
    #[arg(long)]
    data: PathBuf,

    /// Relative log-likelihood change that ends the run
    #[arg(long)]
    stop_ratio: Option<f64>,

    /// Maximum EM iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Threads for the expectation step
    #[arg(long)]
    workers: Option<usize>,

    /// Write the learned network here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StructureArgs {
    /// Network file (JSON or YAML)
    #[arg(long)]
    network: PathBuf,

    /// Nodes that must share one clique (the soft-evidence big clique)
    #[arg(long, value_delimiter = ',')]
    soft: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Network file (JSON or YAML)
    #[arg(long)]
    network: PathBuf,
}

fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((node, state)) if !node.is_empty() && !state.is_empty() => {
            Ok((node.trim().to_string(), state.trim().to_string()))
        }
        _ => Err(format!("expected NODE=STATE, got '{}'", raw)),
    }
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet).or(cli.global.log_level),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let run_id = generate_run_id();
    debug!(run_id = %run_id, "starting");

    let result = match &cli.command {
        Commands::Infer(args) => run_infer(&cli.global, args),
        Commands::InferAll(args) => run_infer_all(&cli.global, args),
        Commands::Learn(args) => run_learn(&cli.global, args),
        Commands::Structure(args) => run_structure(&cli.global, args),
        Commands::Check(args) => run_check(args),
        Commands::Schema => run_schema(),
        Commands::Config => run_config(&cli.global),
    };

    let exit_code = match result.and_then(|payload| emit(&run_id, payload)) {
        Ok(()) => ExitCode::Clean,
        Err(err) => output_error(&run_id, &err),
    };
    std::process::exit(exit_code.as_i32());
}

fn emit(run_id: &str, mut payload: Value) -> Result<()> {
    if let Value::Object(map) = &mut payload {
        map.insert("schema_version".into(), json!(SCHEMA_VERSION));
        map.insert("run_id".into(), json!(run_id));
    }
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn output_error(run_id: &str, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    let response = json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id,
        "status": "error",
        "error": {
            "code": err.code(),
            "exit_code": exit_code.code_name(),
            "category": err.category().to_string(),
            "message": err.to_string(),
            "remediation": err.remediation(),
        }
    });
    match serde_json::to_string_pretty(&response) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("error: {}", err),
    }
    exit_code
}

fn config(global: &GlobalOpts) -> Result<LoadedConfig> {
    load_config(global.config.as_deref()).map_err(|e| Error::Config(e.to_string()))
}

fn load_evidence(opts: &EvidenceOpts) -> Result<Evidence> {
    match (&opts.evidence, &opts.evidence_json) {
        (Some(path), _) => read_evidence(path),
        (None, Some(json)) => parse_evidence_json(json),
        (None, None) => Ok(Evidence::new()),
    }
}

fn load_network(path: &Path) -> Result<Network> {
    let network = read_network(path)?;
    debug!(nodes = network.len(), signature = network.signature(), "loaded network");
    Ok(network)
}

fn run_infer(global: &GlobalOpts, args: &InferArgs) -> Result<Value> {
    let loaded = config(global)?;
    let network = load_network(&args.network)?;
    let evidence = load_evidence(&args.evidence)?;
    let query: Combination = args.query.iter().cloned().collect();

    let probability = match args.engine {
        EngineKind::JunctionTree => {
            JunctionTreeEngine::new(loaded.config.inference).infer(&network, &query, &evidence)?
        }
        EngineKind::Enumeration => {
            EnumerationEngine::new(IpfpSettings::from(&loaded.config.inference))
                .infer(&network, &query, &evidence)?
        }
    };

    Ok(json!({
        "status": "ok",
        "engine": args.engine.name(),
        "query": query,
        "evidence": evidence,
        "probability": probability,
    }))
}

fn run_infer_all(global: &GlobalOpts, args: &InferAllArgs) -> Result<Value> {
    let loaded = config(global)?;
    let network = load_network(&args.network)?;
    let evidence = load_evidence(&args.evidence)?;

    let mut settings = loaded.config.inference;
    if let Some(precision) = args.precision {
        settings.precision = precision;
    }
    jt_config::validate::validate_inference(&settings).map_err(|e| Error::Config(e.to_string()))?;

    let mut options = InferAllOptions::from(&settings);
    options.force = args.force;
    options.clamp_soft_evidence = args.clamp;

    let engine = JunctionTreeEngine::new(settings);
    let marginals = engine.infer_all(&network, &evidence, options)?;

    Ok(json!({
        "status": "ok",
        "evidence": evidence,
        "marginals": marginals,
    }))
}

fn run_learn(global: &GlobalOpts, args: &LearnArgs) -> Result<Value> {
    let loaded = config(global)?;
    let network = load_network(&args.network)?;
    let observations = read_observations(&args.data)?;

    let mut settings = loaded.config.learning.clone();
    if let Some(stop_ratio) = args.stop_ratio {
        settings.stop_ratio = stop_ratio;
    }
    if let Some(max_iterations) = args.max_iterations {
        settings.max_iterations = max_iterations;
    }
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    jt_config::validate::validate_learning(&settings).map_err(|e| Error::Config(e.to_string()))?;

    let engine = JunctionTreeEngine::new(loaded.config.inference);
    let outcome = learn(&engine, &network, &observations, &settings)?;

    let mut payload = json!({
        "status": "ok",
        "observations": observations.len(),
        "iterations": outcome.iterations,
        "stop_reason": outcome.stop_reason,
        "log_likelihoods": outcome.log_likelihoods,
        "signature": outcome.network.signature(),
    });
    match &args.output {
        Some(path) => {
            write_network(path, &outcome.network)?;
            info!(path = %path.display(), "wrote learned network");
            payload["output"] = json!(path.display().to_string());
        }
        None => payload["network"] = serde_json::to_value(&outcome.network)?,
    }
    Ok(payload)
}

fn run_structure(global: &GlobalOpts, args: &StructureArgs) -> Result<Value> {
    let loaded = config(global)?;
    let network = load_network(&args.network)?;
    let engine = JunctionTreeEngine::new(loaded.config.inference);
    let tree = engine.structure(&network, &args.soft, false)?;

    Ok(json!({
        "status": "ok",
        "structure": tree.report(&network),
    }))
}

fn run_check(args: &CheckArgs) -> Result<Value> {
    let network = load_network(&args.network)?;
    Ok(json!({
        "status": "ok",
        "nodes": network.len(),
        "roots": network
            .nodes()
            .iter()
            .filter(|n| n.parents.is_empty())
            .map(|n| n.id.as_str())
            .collect::<Vec<_>>(),
        "signature": network.signature(),
        "structure_signature": network.structure_signature(),
    }))
}

fn run_schema() -> Result<Value> {
    let schema = schemars::schema_for!(Vec<Node>);
    Ok(json!({
        "status": "ok",
        "network_schema": schema,
    }))
}

fn run_config(global: &GlobalOpts) -> Result<Value> {
    let loaded = config(global)?;
    Ok(json!({
        "status": "ok",
        "short_id": loaded.snapshot.short_id(),
        "snapshot": loaded.snapshot,
    }))
}
