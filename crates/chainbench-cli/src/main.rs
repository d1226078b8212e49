// crates/chainbench-cli/src/main.rs
// ============================================================================
// Module: Chain-Bench CLI Entry Point
// Description: Command dispatcher for benchmark runs and history queries.
// Purpose: Wire the prober, scheduler, store, and analyzer into a tool.
// Dependencies: chainbench-core, chainbench-probes, chainbench-store-sqlite,
//               clap, ctrlc, serde, serde_json, thiserror, toml
// ============================================================================

//! ## Overview
//! The Chain-Bench CLI runs one full benchmark pass across a node fleet and
//! persists it (`run`), replays the most recent stored run (`latest`), and
//! summarizes uptime, trends, and consistency over a lookback window
//! (`trends`). Settings resolve flag-over-file-over-default, with the node
//! fleet and probe budget shared by all three commands.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use chainbench_core::BenchmarkRunner;
use chainbench_core::CancelToken;
use chainbench_core::Executor;
use chainbench_core::NodeUrl;
use chainbench_core::ProbeBudget;
use chainbench_core::RankingConfig;
use chainbench_core::ReachabilityPolicy;
use chainbench_core::RunStore;
use chainbench_core::RunnerOptions;
use chainbench_core::Scheduler;
use chainbench_core::SchedulerMode;
use chainbench_core::analyze_history;
use chainbench_probes::HttpProber;
use chainbench_probes::ProberConfig;
use chainbench_store_sqlite::SqliteRunStore;
use chainbench_store_sqlite::SqliteStoreConfig;
use chainbench_store_sqlite::SqliteStoreMode;
use chainbench_store_sqlite::SqliteSyncMode;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default database file path.
const DEFAULT_DB_PATH: &str = "benchmark_history.db";
/// Default throughput time box in seconds.
const DEFAULT_TIME_BOX_SECS: u64 = 30;
/// Default per-call timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default trend lookback window in days.
const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Seed fleet probed when neither flags nor the config file name nodes.
const DEFAULT_NODES: [&str; 16] = [
    "https://api.syncad.com",
    "https://api.deathwing.me",
    "https://hive-api.arcange.eu",
    "https://api.openhive.network",
    "https://techcoderx.com",
    "https://api.c0ff33a.uk",
    "https://hive-api.3speak.tv",
    "https://hiveapi.actifit.io",
    "https://rpc.mahdiyari.info",
    "https://api.hive.blog",
    "https://anyx.io",
    "https://hive.roelandp.nl",
    "https://hived.emre.sh",
    "https://api.hive.blue",
    "https://rpc.ausbit.dev",
    "https://hive-api.dlux.io",
];

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "chainbench", version, about = "RPC node benchmark and trend tool")]
struct Cli {
    /// Optional TOML config file path.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Path to the benchmark history database.
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one benchmark pass across the fleet and persist it.
    Run(RunCommand),
    /// Print the most recently stored run.
    Latest,
    /// Summarize uptime, rank trends, and consistency over a window.
    Trends(TrendsCommand),
}

/// Configuration for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Node URL to probe; repeat for multiple nodes.
    #[arg(long = "node", value_name = "URL")]
    nodes: Vec<String>,
    /// Throughput time box in seconds.
    #[arg(long, value_name = "SECS")]
    time_box: Option<u64>,
    /// Per-call timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Connection retries before a node is reported unreachable.
    #[arg(long, value_name = "N")]
    connect_retries: Option<u32>,
    /// Retries for each individual RPC call.
    #[arg(long, value_name = "N")]
    call_retries: Option<u32>,
    /// Probe nodes one at a time instead of on the worker pool.
    #[arg(long)]
    sequential: bool,
    /// Account whose history backs the history throughput probe.
    #[arg(long, value_name = "ACCOUNT")]
    account: Option<String>,
    /// Author of the point-query content target.
    #[arg(long, value_name = "AUTHOR")]
    author: Option<String>,
    /// Permlink of the point-query content target.
    #[arg(long, value_name = "PERMLINK")]
    permlink: Option<String>,
    /// Policy deciding when a node with failed probes counts as failing.
    #[arg(long, value_enum, value_name = "POLICY")]
    policy: Option<PolicyArg>,
}

/// Configuration for the `trends` command.
#[derive(Args, Debug)]
struct TrendsCommand {
    /// Lookback window in days.
    #[arg(long, value_name = "DAYS")]
    days: Option<i64>,
}

/// Reachability policy argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// A node stays working only if its config probe succeeded.
    RequireConfig,
    /// A node stays working if any probe succeeded.
    AnyProbeSuccess,
}

impl From<PolicyArg> for ReachabilityPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::RequireConfig => Self::RequireConfig,
            PolicyArg::AnyProbeSuccess => Self::AnyProbeSuccess,
        }
    }
}

// ============================================================================
// SECTION: File Config
// ============================================================================

/// Optional TOML configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    /// Node URLs to probe.
    #[serde(default)]
    nodes: Option<Vec<String>>,
    /// Path to the benchmark history database.
    #[serde(default)]
    db_path: Option<PathBuf>,
    /// Throughput time box in seconds.
    #[serde(default)]
    time_box_secs: Option<u64>,
    /// Per-call timeout in seconds.
    #[serde(default)]
    timeout_secs: Option<u64>,
    /// Connection retries before a node is reported unreachable.
    #[serde(default)]
    connect_retries: Option<u32>,
    /// Retries for each individual RPC call.
    #[serde(default)]
    call_retries: Option<u32>,
    /// Whether probes run on the threaded worker pool.
    #[serde(default)]
    threaded: Option<bool>,
    /// Account whose history backs the history throughput probe.
    #[serde(default)]
    history_account: Option<String>,
    /// Author of the point-query content target.
    #[serde(default)]
    call_author: Option<String>,
    /// Permlink of the point-query content target.
    #[serde(default)]
    call_permlink: Option<String>,
    /// Lookback window in days for the trends command.
    #[serde(default)]
    lookback_days: Option<i64>,
    /// Reachability policy, `require_config` or `any_probe_success`.
    #[serde(default)]
    policy: Option<ReachabilityPolicy>,
}

impl FileConfig {
    /// Loads a config file when a path is given, defaulting to empty.
    fn load(path: Option<&PathBuf>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .map_err(|err| CliError::new(format!("failed to read {}: {err}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|err| CliError::new(format!("invalid config {}: {err}", path.display())))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// User-facing error message.
    message: String,
}

impl CliError {
    /// Creates an error from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let file = FileConfig::load(cli.config.as_ref())?;
    let db_path = cli
        .db
        .clone()
        .or_else(|| file.db_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
    let store = open_store(db_path)?;

    match cli.command {
        Commands::Run(command) => command_run(&command, &file, &store),
        Commands::Latest => command_latest(&store),
        Commands::Trends(command) => command_trends(&command, &file, &store),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Runs one benchmark pass and persists it.
fn command_run(
    command: &RunCommand,
    file: &FileConfig,
    store: &SqliteRunStore,
) -> CliResult<ExitCode> {
    let nodes = resolve_nodes(command, file);
    let budget = resolve_budget(command, file);
    let threaded = if command.sequential { false } else { file.threaded.unwrap_or(true) };
    let policy = command
        .policy
        .map(ReachabilityPolicy::from)
        .or(file.policy)
        .unwrap_or_default();

    let prober_config = ProberConfig::default();
    let defaults = RunnerOptions::default();
    let options = RunnerOptions {
        history_account: command
            .account
            .clone()
            .or_else(|| file.history_account.clone())
            .unwrap_or(defaults.history_account),
        call_author: command
            .author
            .clone()
            .or_else(|| file.call_author.clone())
            .unwrap_or(defaults.call_author),
        call_permlink: command
            .permlink
            .clone()
            .or_else(|| file.call_permlink.clone())
            .unwrap_or(defaults.call_permlink),
        latency_samples: defaults.latency_samples,
        client_version: prober_config.user_agent.clone(),
        script_version: defaults.script_version,
    };
    let ranking = RankingConfig {
        policy,
        ..RankingConfig::default()
    };

    let mode = if threaded { SchedulerMode::Threaded } else { SchedulerMode::Sequential };
    let scheduler = Scheduler::new(Executor::new(HttpProber::new(prober_config), budget), mode);
    let runner = BenchmarkRunner::new(scheduler, options, ranking);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|err| CliError::new(format!("failed to install signal handler: {err}")))?;

    write_stderr_line(&format!("benchmarking {} nodes", nodes.len()))
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    let mut run = runner.run(&nodes, &cancel);
    let run_id = store.record(&run).map_err(|err| CliError::new(err.to_string()))?;
    run.run_id = Some(run_id);

    write_json(&run)?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves the node fleet from flags, file, then the seed list.
fn resolve_nodes(command: &RunCommand, file: &FileConfig) -> Vec<NodeUrl> {
    let urls: Vec<String> = if command.nodes.is_empty() {
        file.nodes
            .clone()
            .unwrap_or_else(|| DEFAULT_NODES.iter().map(|url| (*url).to_owned()).collect())
    } else {
        command.nodes.clone()
    };
    urls.into_iter().map(NodeUrl::new).collect()
}

/// Resolves the probe budget from flags, file, then defaults.
fn resolve_budget(command: &RunCommand, file: &FileConfig) -> ProbeBudget {
    let time_box_secs =
        command.time_box.or(file.time_box_secs).unwrap_or(DEFAULT_TIME_BOX_SECS);
    let timeout_secs = command.timeout.or(file.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS);
    let defaults = ProbeBudget::default();
    ProbeBudget {
        connect_retries: command
            .connect_retries
            .or(file.connect_retries)
            .unwrap_or(defaults.connect_retries),
        call_retries: command.call_retries.or(file.call_retries).unwrap_or(defaults.call_retries),
        timeout_ms: timeout_secs.saturating_mul(1_000),
        time_box_ms: time_box_secs.saturating_mul(1_000),
    }
}

// ============================================================================
// SECTION: History Commands
// ============================================================================

/// Prints the most recently stored run.
fn command_latest(store: &SqliteRunStore) -> CliResult<ExitCode> {
    let Some(run) = store.latest().map_err(|err| CliError::new(err.to_string()))? else {
        write_stderr_line("no runs recorded yet")
            .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
        return Ok(ExitCode::FAILURE);
    };
    write_json(&run)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints uptime, trend, and consistency summaries over the window.
fn command_trends(
    command: &TrendsCommand,
    file: &FileConfig,
    store: &SqliteRunStore,
) -> CliResult<ExitCode> {
    let days = command.days.or(file.lookback_days).unwrap_or(DEFAULT_LOOKBACK_DAYS);
    let rows = store.history(days).map_err(|err| CliError::new(err.to_string()))?;
    let report = analyze_history(&rows);
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Opens the run store at the resolved database path.
fn open_store(path: PathBuf) -> CliResult<SqliteRunStore> {
    SqliteRunStore::new(&SqliteStoreConfig {
        path,
        busy_timeout_ms: 5_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    })
    .map_err(|err| CliError::new(err.to_string()))
}

/// Writes a value to stdout as pretty JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("json serialization failed: {err}")))?;
    write_stdout_line(&rendered)
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
