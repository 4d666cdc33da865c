//! causeway: check a decision graph before it goes to simulation
//!
//! Usage:
//!   causeway check graph.json
//!   causeway check graph.json --constraints constraints.json --json
//!   causeway check graph.json --no-reconcile --config limits.toml
//!   causeway reconcile graph.json --output repaired.json
//!
//! Exit codes: 0 ready, 1 invalid, 2 the graph or configuration could not be
//! loaded, or the result could not be written.

use causeway_check::{
    prepare_graph, reconcile_structural_truth, GoalConstraint, GraphValidator, PipelineOutcome,
    ReconcileOptions,
};
use causeway_core::{
    new_request_id, CausewayError, CausewayResult, Graph, GraphLoadError, ValidatorConfig,
};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_READY: u8 = 0;
const EXIT_INVALID: u8 = 1;
const EXIT_LOAD_ERROR: u8 = 2;

const DEFAULT_LOG_FILTER: &str = "causeway_check=info,causeway_cli=info,warn";

/// Validate and repair causal decision graphs
#[derive(Parser, Debug)]
#[command(name = "causeway", version)]
#[command(about = "Validate and repair causal decision graphs")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CAUSEWAY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile, validate and gate a graph
    Check {
        /// Graph JSON file
        graph: PathBuf,

        /// Validate the graph exactly as given
        #[arg(long)]
        no_reconcile: bool,

        /// Do not fill missing controllable factor data
        #[arg(long)]
        no_fill: bool,

        /// Goal constraints JSON file (an array)
        #[arg(long)]
        constraints: Option<PathBuf>,

        /// Validator limits TOML file; falls back to CAUSEWAY_* variables
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,

        /// Correlation id for log lines (generated when absent)
        #[arg(long)]
        request_id: Option<String>,
    },

    /// Reconcile a graph and print the repaired JSON
    Reconcile {
        /// Graph JSON file
        graph: PathBuf,

        /// Do not fill missing controllable factor data
        #[arg(long)]
        no_fill: bool,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second init (tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .try_init();
}

fn read_file(path: &Path) -> Result<String, GraphLoadError> {
    std::fs::read_to_string(path).map_err(|e| GraphLoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_json<T: DeserializeOwned>(path: &Path) -> CausewayResult<T> {
    let source = read_file(path)?;
    let value = serde_json::from_str(&source).map_err(GraphLoadError::from)?;
    Ok(value)
}

fn load_config(path: Option<&Path>) -> CausewayResult<ValidatorConfig> {
    match path {
        Some(path) => ValidatorConfig::from_toml_str(&read_file(path)?),
        None => {
            let config = ValidatorConfig::from_env();
            config.validate()?;
            Ok(config)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> CausewayResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CausewayError::Output {
        reason: format!("failed to serialize output: {}", e),
    })
}

struct CheckArgs {
    graph: PathBuf,
    no_reconcile: bool,
    no_fill: bool,
    constraints: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
    request_id: Option<String>,
}

fn run_check(args: CheckArgs) -> CausewayResult<u8> {
    let request_id = args.request_id.unwrap_or_else(new_request_id);
    let validator = GraphValidator::new(load_config(args.config.as_deref())?)?;
    let mut graph: Graph = load_json(&args.graph)?;
    let input_fingerprint = graph.fingerprint();

    let mut options = ReconcileOptions::default().with_fill_controllable_data(!args.no_fill);
    if let Some(path) = &args.constraints {
        let constraints: Vec<GoalConstraint> = load_json(path)?;
        options = options.with_goal_constraints(constraints);
    }
    let mut options = (!args.no_reconcile).then_some(options);

    let outcome = prepare_graph(&mut graph, options.as_mut(), &validator, Some(&request_id));
    tracing::info!(
        request_id = %request_id,
        ready = outcome.is_ready(),
        changed = outcome.fingerprint != input_fingerprint,
        "check complete"
    );

    if args.json {
        println!("{}", to_json(&outcome)?);
    } else {
        print_summary(&outcome, &input_fingerprint);
    }

    Ok(if outcome.is_ready() {
        EXIT_READY
    } else {
        EXIT_INVALID
    })
}

fn print_summary(outcome: &PipelineOutcome, input_fingerprint: &str) {
    println!("graph     {}", &input_fingerprint[..12.min(input_fingerprint.len())]);
    if outcome.fingerprint != input_fingerprint {
        println!(
            "repaired  {} ({} mutation(s))",
            &outcome.fingerprint[..12.min(outcome.fingerprint.len())],
            outcome.mutations.len()
        );
    }
    for mutation in &outcome.mutations {
        println!("  {}", mutation);
    }
    for issue in outcome.blocking_issues() {
        println!("  {}", issue);
    }
    for issue in &outcome.report.warnings {
        println!("  {}", issue);
    }
    if let Some(constraints) = &outcome.goal_constraints {
        println!("constraints kept: {}", constraints.len());
    }
    println!(
        "status    {}",
        if outcome.is_ready() { "ready" } else { "invalid" }
    );
}

fn run_reconcile(graph_path: &Path, no_fill: bool, output: Option<&Path>) -> CausewayResult<u8> {
    let mut graph: Graph = load_json(graph_path)?;
    let mut options = ReconcileOptions::default().with_fill_controllable_data(!no_fill);
    let outcome = reconcile_structural_truth(&mut graph, &mut options);
    for mutation in &outcome.mutations {
        eprintln!("{}", mutation);
    }

    let rendered = to_json(&graph)?;
    match output {
        Some(path) => std::fs::write(path, rendered).map_err(|e| CausewayError::Output {
            reason: format!("failed to write {}: {}", path.display(), e),
        })?,
        None => println!("{}", rendered),
    }
    Ok(EXIT_READY)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result = match cli.command {
        Commands::Check {
            graph,
            no_reconcile,
            no_fill,
            constraints,
            config,
            json,
            request_id,
        } => run_check(CheckArgs {
            graph,
            no_reconcile,
            no_fill,
            constraints,
            config,
            json,
            request_id,
        }),
        Commands::Reconcile {
            graph,
            no_fill,
            output,
        } => run_reconcile(&graph, no_fill, output.as_deref()),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "causeway failed");
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_LOAD_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_test_utils::{minimal_valid_graph, mislabelled_controllable_graph};
    use clap::CommandFactory;

    fn scratch(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("causeway-cli-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn check_args(graph: PathBuf) -> CheckArgs {
        CheckArgs {
            graph,
            no_reconcile: false,
            no_fill: false,
            constraints: None,
            config: None,
            json: true,
            request_id: Some("test".into()),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::parse_from([
            "causeway",
            "check",
            "g.json",
            "--no-reconcile",
            "--constraints",
            "c.json",
            "--request-id",
            "abc",
        ]);
        match cli.command {
            Commands::Check {
                no_reconcile,
                constraints,
                request_id,
                ..
            } => {
                assert!(no_reconcile);
                assert_eq!(constraints, Some(PathBuf::from("c.json")));
                assert_eq!(request_id.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_exit_codes() {
        let valid = scratch("valid.json", &serde_json::to_string(&minimal_valid_graph()).unwrap());
        assert_eq!(run_check(check_args(valid)).unwrap(), EXIT_READY);

        let mislabelled = serde_json::to_string(&mislabelled_controllable_graph()).unwrap();
        let path = scratch("mislabelled.json", &mislabelled);
        assert_eq!(run_check(check_args(path.clone())).unwrap(), EXIT_READY);
        let mut raw = check_args(path);
        raw.no_reconcile = true;
        assert_eq!(run_check(raw).unwrap(), EXIT_INVALID);

        let broken = scratch("broken.json", "{\"nodes\": [");
        assert!(matches!(
            run_check(check_args(broken)),
            Err(CausewayError::Load(GraphLoadError::Malformed { .. }))
        ));
        assert!(matches!(
            run_check(check_args(PathBuf::from("/nonexistent/graph.json"))),
            Err(CausewayError::Load(GraphLoadError::Io { .. }))
        ));
    }

    #[test]
    fn test_serialize_failure_is_an_output_error() {
        let unkeyable = std::collections::BTreeMap::from([((1u8, 2u8), "pair")]);
        match to_json(&unkeyable) {
            Err(CausewayError::Output { reason }) => {
                assert!(reason.starts_with("failed to serialize output"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(to_json(&minimal_valid_graph()).is_ok());
    }

    #[test]
    fn test_bad_config_file_rejected() {
        let graph = scratch("cfg-graph.json", &serde_json::to_string(&minimal_valid_graph()).unwrap());
        let config = scratch("bad.toml", "min_options = 5\nmax_options = 3\n");
        let mut args = check_args(graph);
        args.config = Some(config);
        assert!(matches!(run_check(args), Err(CausewayError::Config(_))));
    }
}
