// crates/chainbench-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Run Store
// Description: Durable RunStore backed by SQLite WAL.
// Purpose: Persist benchmark runs atomically and serve history windows.
// Dependencies: chainbench-core, rusqlite, serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! One transaction per recorded run: the run row, node upserts, per-node
//! status rows, and per-probe result rows commit together or not at all.
//! Nodes are deduplicated by URL with an immutable `first_seen` and a
//! `last_seen` that advances on every observing run. The history query
//! applies the lookback window, except that a store holding three runs or
//! fewer serves its whole history so sparse deployments still get trends.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use chainbench_core::BenchmarkRun;
use chainbench_core::HistoryRows;
use chainbench_core::NodeRecord;
use chainbench_core::NodeStatusRow;
use chainbench_core::NodeUrl;
use chainbench_core::ProbeKind;
use chainbench_core::ProbeMeasurement;
use chainbench_core::ProbeReport;
use chainbench_core::RankRow;
use chainbench_core::RunParameters;
use chainbench_core::RunStore;
use chainbench_core::StoreError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Stores holding this many runs or fewer serve their whole history.
const SMALL_STORE_RUNS: i64 = 3;
/// Sentinel persisted for a report that holds no rank.
const NO_RANK: i64 = -1;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` run store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or impossible row contents.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Store(message)
            }
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a rusqlite error into the store error taxonomy.
fn db_err(error: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(error.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed benchmark run store with WAL support.
#[derive(Clone)]
pub struct SqliteRunStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRunStore {
    /// Opens an `SQLite`-backed run store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs one closure inside a transaction on the shared connection.
    fn with_transaction<T>(
        &self,
        body: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(|err| db_err(&err))?;
        let value = body(&tx)?;
        tx.commit().map_err(|err| db_err(&err))?;
        drop(guard);
        Ok(value)
    }
}

impl RunStore for SqliteRunStore {
    fn record(&self, run: &BenchmarkRun) -> Result<i64, StoreError> {
        self.record_run(run).map_err(StoreError::from)
    }

    fn latest(&self) -> Result<Option<BenchmarkRun>, StoreError> {
        self.latest_run().map_err(StoreError::from)
    }

    fn history(&self, lookback_days: i64) -> Result<HistoryRows, StoreError> {
        self.history_rows(lookback_days).map_err(StoreError::from)
    }
}

impl SqliteRunStore {
    /// Persists one run in a single transaction.
    fn record_run(&self, run: &BenchmarkRun) -> Result<i64, SqliteStoreError> {
        let parameters_json = serde_json::to_string(&run.parameters)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO benchmark_runs (recorded_at, timestamp, start_time, end_time, \
                 client_version, script_version, connect_retries, call_retries, timeout_ms, \
                 time_box_ms, threaded, parameters_json) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    run.timestamp.unix_timestamp(),
                    format_time(run.timestamp)?,
                    format_time(run.start_time)?,
                    format_time(run.end_time)?,
                    run.parameters.client_version,
                    run.parameters.script_version,
                    run.parameters.budget.connect_retries,
                    run.parameters.budget.call_retries,
                    i64::try_from(run.parameters.budget.timeout_ms).unwrap_or(i64::MAX),
                    i64::try_from(run.parameters.budget.time_box_ms).unwrap_or(i64::MAX),
                    i64::from(run.parameters.threaded),
                    parameters_json,
                ],
            )
            .map_err(|err| db_err(&err))?;
            let run_id = tx.last_insert_rowid();

            let observed_at = format_time(run.timestamp)?;
            for record in &run.records {
                let node_id = upsert_node(tx, &record.node, &observed_at)?;
                tx.execute(
                    "INSERT INTO node_status (run_id, node_id, is_working, error_message, \
                     version, composite_score) VALUES (?1, ?2, 1, NULL, ?3, ?4)",
                    params![run_id, node_id, record.version, record.composite_score],
                )
                .map_err(|err| db_err(&err))?;
                for (kind, report) in &record.reports {
                    insert_result(tx, run_id, node_id, *kind, report)?;
                }
            }
            for (node, error) in &run.failing {
                let node_id = upsert_node(tx, node, &observed_at)?;
                tx.execute(
                    "INSERT INTO node_status (run_id, node_id, is_working, error_message, \
                     version, composite_score) VALUES (?1, ?2, 0, ?3, NULL, 0.0)",
                    params![run_id, node_id, error],
                )
                .map_err(|err| db_err(&err))?;
            }
            Ok(run_id)
        })
    }

    /// Reconstructs the most recently recorded run.
    fn latest_run(&self) -> Result<Option<BenchmarkRun>, SqliteStoreError> {
        self.with_transaction(|tx| {
            let header = tx
                .query_row(
                    "SELECT run_id, timestamp, start_time, end_time, parameters_json \
                     FROM benchmark_runs ORDER BY recorded_at DESC, run_id DESC LIMIT 1",
                    params![],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(|err| db_err(&err))?;
            let Some((run_id, timestamp, start_time, end_time, parameters_json)) = header else {
                return Ok(None);
            };
            let parameters: RunParameters = serde_json::from_str(&parameters_json)
                .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;

            let mut records: BTreeMap<i64, NodeRecord> = BTreeMap::new();
            let mut failing: BTreeMap<NodeUrl, String> = BTreeMap::new();
            {
                let mut statement = tx
                    .prepare(
                        "SELECT s.node_id, n.url, s.is_working, s.error_message, s.version, \
                         s.composite_score FROM node_status s JOIN nodes n ON n.node_id = \
                         s.node_id WHERE s.run_id = ?1",
                    )
                    .map_err(|err| db_err(&err))?;
                let rows = statement
                    .query_map(params![run_id], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, Option<String>>(4)?,
                            row.get::<_, f64>(5)?,
                        ))
                    })
                    .map_err(|err| db_err(&err))?;
                for row in rows {
                    let (node_id, url, is_working, error, version, score) =
                        row.map_err(|err| db_err(&err))?;
                    if is_working == 0 {
                        failing.insert(NodeUrl::new(&url), error.unwrap_or_default());
                    } else {
                        let mut record = NodeRecord::new(NodeUrl::new(&url));
                        record.version = version;
                        record.composite_score = score;
                        records.insert(node_id, record);
                    }
                }
            }

            {
                let mut statement = tx
                    .prepare(
                        "SELECT node_id, probe_kind, is_ok, rank, total_duration, count, \
                         access_time, min_latency, max_latency, avg_latency, samples, \
                         head_delay, head_lag FROM test_results WHERE run_id = ?1",
                    )
                    .map_err(|err| db_err(&err))?;
                let rows = statement
                    .query_map(params![run_id], read_result_row)
                    .map_err(|err| db_err(&err))?;
                for row in rows {
                    let raw = row.map_err(|err| db_err(&err))?;
                    let Some(record) = records.get_mut(&raw.node_id) else {
                        continue;
                    };
                    apply_result_row(record, &raw)?;
                }
            }

            let mut records: Vec<NodeRecord> = records.into_values().collect();
            records.sort_by(|a, b| {
                b.composite_score
                    .total_cmp(&a.composite_score)
                    .then_with(|| a.node.cmp(&b.node))
            });

            Ok(Some(BenchmarkRun {
                run_id: Some(run_id),
                timestamp: parse_time(&timestamp)?,
                start_time: parse_time(&start_time)?,
                end_time: parse_time(&end_time)?,
                parameters,
                records,
                failing,
            }))
        })
    }

    /// Returns in-window status and rank rows plus every known node.
    fn history_rows(&self, lookback_days: i64) -> Result<HistoryRows, SqliteStoreError> {
        self.with_transaction(|tx| {
            let run_count: i64 = tx
                .query_row("SELECT COUNT(*) FROM benchmark_runs", params![], |row| row.get(0))
                .map_err(|err| db_err(&err))?;
            let cutoff = if run_count <= SMALL_STORE_RUNS {
                i64::MIN
            } else {
                let now = OffsetDateTime::now_utc().unix_timestamp();
                now.saturating_sub(lookback_days.saturating_mul(86_400))
            };

            let mut rows = HistoryRows::default();
            {
                let mut statement = tx
                    .prepare(
                        "SELECT n.url, s.run_id, r.timestamp, s.is_working, s.error_message \
                         FROM node_status s \
                         JOIN nodes n ON n.node_id = s.node_id \
                         JOIN benchmark_runs r ON r.run_id = s.run_id \
                         WHERE r.recorded_at >= ?1 ORDER BY r.recorded_at, s.run_id",
                    )
                    .map_err(|err| db_err(&err))?;
                let mapped = statement
                    .query_map(params![cutoff], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    })
                    .map_err(|err| db_err(&err))?;
                for row in mapped {
                    let (url, run_id, timestamp, is_working, error) =
                        row.map_err(|err| db_err(&err))?;
                    rows.statuses.push(NodeStatusRow {
                        node: NodeUrl::new(&url),
                        run_id,
                        timestamp: parse_time(&timestamp)?,
                        is_working: is_working != 0,
                        error,
                    });
                }
            }
            {
                let mut statement = tx
                    .prepare(
                        "SELECT n.url, t.run_id, r.timestamp, t.probe_kind, t.is_ok, t.rank \
                         FROM test_results t \
                         JOIN nodes n ON n.node_id = t.node_id \
                         JOIN benchmark_runs r ON r.run_id = t.run_id \
                         WHERE r.recorded_at >= ?1 ORDER BY r.recorded_at, t.run_id",
                    )
                    .map_err(|err| db_err(&err))?;
                let mapped = statement
                    .query_map(params![cutoff], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, i64>(5)?,
                        ))
                    })
                    .map_err(|err| db_err(&err))?;
                for row in mapped {
                    let (url, run_id, timestamp, kind_label, is_ok, rank) =
                        row.map_err(|err| db_err(&err))?;
                    let probe_kind = parse_kind(&kind_label)?;
                    rows.ranks.push(RankRow {
                        node: NodeUrl::new(&url),
                        run_id,
                        timestamp: parse_time(&timestamp)?,
                        probe_kind,
                        ok: is_ok != 0,
                        rank: parse_rank(rank)?,
                    });
                }
            }
            {
                let mut statement = tx
                    .prepare("SELECT url FROM nodes ORDER BY url")
                    .map_err(|err| db_err(&err))?;
                let mapped = statement
                    .query_map(params![], |row| row.get::<_, String>(0))
                    .map_err(|err| db_err(&err))?;
                for url in mapped {
                    rows.known_nodes.push(NodeUrl::new(&url.map_err(|err| db_err(&err))?));
                }
            }
            Ok(rows)
        })
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Raw per-probe result row, before measurement reconstruction.
struct ResultRow {
    /// Node the row belongs to.
    node_id: i64,
    /// Persisted probe kind label.
    kind_label: String,
    /// Whether the probe succeeded.
    is_ok: bool,
    /// Persisted rank, [`NO_RANK`] when absent.
    rank: i64,
    /// Wall-clock seconds spent in the probe.
    total_duration: f64,
    /// Throughput count, when the kind has one.
    count: Option<i64>,
    /// Access time, when the kind has one.
    access_time: Option<f64>,
    /// Minimum repeated latency.
    min_latency: Option<f64>,
    /// Maximum repeated latency.
    max_latency: Option<f64>,
    /// Mean repeated latency.
    avg_latency: Option<f64>,
    /// Contributing repeated-latency samples.
    samples: Option<i64>,
    /// Head delay in seconds.
    head_delay: Option<f64>,
    /// Head-to-irreversible lag in blocks.
    head_lag: Option<i64>,
}

/// Maps one `test_results` row into [`ResultRow`].
fn read_result_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResultRow> {
    Ok(ResultRow {
        node_id: row.get(0)?,
        kind_label: row.get(1)?,
        is_ok: row.get::<_, i64>(2)? != 0,
        rank: row.get(3)?,
        total_duration: row.get(4)?,
        count: row.get(5)?,
        access_time: row.get(6)?,
        min_latency: row.get(7)?,
        max_latency: row.get(8)?,
        avg_latency: row.get(9)?,
        samples: row.get(10)?,
        head_delay: row.get(11)?,
        head_lag: row.get(12)?,
    })
}

/// Applies one result row to a reconstructed record.
fn apply_result_row(record: &mut NodeRecord, raw: &ResultRow) -> Result<(), SqliteStoreError> {
    let kind = parse_kind(&raw.kind_label)?;
    let measurement =
        if raw.is_ok { rebuild_measurement(kind, record.version.as_deref(), raw)? } else { None };
    *record.report_mut(kind) = ProbeReport {
        ok: raw.is_ok,
        rank: parse_rank(raw.rank)?,
        total_duration: raw.total_duration,
        measurement,
    };
    Ok(())
}

/// Rebuilds the kind-specific measurement from result columns.
fn rebuild_measurement(
    kind: ProbeKind,
    version: Option<&str>,
    raw: &ResultRow,
) -> Result<Option<ProbeMeasurement>, SqliteStoreError> {
    let missing =
        |field: &str| SqliteStoreError::Corrupt(format!("missing {field} for {kind} result"));
    let measurement = match kind {
        ProbeKind::Config => ProbeMeasurement::Config {
            version: version.map(str::to_owned),
            access_time: raw.access_time.ok_or_else(|| missing("access_time"))?,
        },
        ProbeKind::Blocks | ProbeKind::History => ProbeMeasurement::Throughput {
            count: raw
                .count
                .and_then(|count| u64::try_from(count).ok())
                .ok_or_else(|| missing("count"))?,
        },
        ProbeKind::Call => ProbeMeasurement::PointLatency {
            access_time: raw.access_time.ok_or_else(|| missing("access_time"))?,
        },
        ProbeKind::Latency => ProbeMeasurement::RepeatedLatency {
            min_latency: raw.min_latency.ok_or_else(|| missing("min_latency"))?,
            max_latency: raw.max_latency.ok_or_else(|| missing("max_latency"))?,
            avg_latency: raw.avg_latency.ok_or_else(|| missing("avg_latency"))?,
            samples: raw
                .samples
                .and_then(|samples| u32::try_from(samples).ok())
                .ok_or_else(|| missing("samples"))?,
        },
        ProbeKind::Staleness => ProbeMeasurement::Staleness {
            head_delay: raw.head_delay.ok_or_else(|| missing("head_delay"))?,
            head_lag: raw.head_lag.ok_or_else(|| missing("head_lag"))?,
        },
    };
    Ok(Some(measurement))
}

/// Inserts one per-probe result row.
fn insert_result(
    tx: &Transaction<'_>,
    run_id: i64,
    node_id: i64,
    kind: ProbeKind,
    report: &ProbeReport,
) -> Result<(), SqliteStoreError> {
    let mut count: Option<i64> = None;
    let mut access_time: Option<f64> = None;
    let mut min_latency: Option<f64> = None;
    let mut max_latency: Option<f64> = None;
    let mut avg_latency: Option<f64> = None;
    let mut samples: Option<i64> = None;
    let mut head_delay: Option<f64> = None;
    let mut head_lag: Option<i64> = None;
    match &report.measurement {
        Some(
            ProbeMeasurement::Config {
                access_time: value, ..
            }
            | ProbeMeasurement::PointLatency {
                access_time: value,
            },
        ) => access_time = Some(*value),
        Some(ProbeMeasurement::Throughput {
            count: value,
        }) => count = Some(i64::try_from(*value).unwrap_or(i64::MAX)),
        Some(ProbeMeasurement::RepeatedLatency {
            min_latency: min,
            max_latency: max,
            avg_latency: avg,
            samples: taken,
        }) => {
            min_latency = Some(*min);
            max_latency = Some(*max);
            avg_latency = Some(*avg);
            samples = Some(i64::from(*taken));
        }
        Some(ProbeMeasurement::Staleness {
            head_delay: delay,
            head_lag: lag,
        }) => {
            head_delay = Some(*delay);
            head_lag = Some(*lag);
        }
        None => {}
    }
    let rank = report.rank.map_or(NO_RANK, i64::from);
    tx.execute(
        "INSERT INTO test_results (run_id, node_id, probe_kind, is_ok, rank, total_duration, \
         count, access_time, min_latency, max_latency, avg_latency, samples, head_delay, \
         head_lag) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            run_id,
            node_id,
            kind.as_str(),
            i64::from(report.ok),
            rank,
            report.total_duration,
            count,
            access_time,
            min_latency,
            max_latency,
            avg_latency,
            samples,
            head_delay,
            head_lag,
        ],
    )
    .map_err(|err| db_err(&err))?;
    Ok(())
}

/// Upserts a node by URL, advancing `last_seen` and returning its id.
fn upsert_node(
    tx: &Transaction<'_>,
    node: &NodeUrl,
    observed_at: &str,
) -> Result<i64, SqliteStoreError> {
    tx.execute(
        "INSERT INTO nodes (url, first_seen, last_seen) VALUES (?1, ?2, ?2) \
         ON CONFLICT(url) DO UPDATE SET last_seen = excluded.last_seen",
        params![node.as_str(), observed_at],
    )
    .map_err(|err| db_err(&err))?;
    tx.query_row("SELECT node_id FROM nodes WHERE url = ?1", params![node.as_str()], |row| {
        row.get(0)
    })
    .map_err(|err| db_err(&err))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_err(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| db_err(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_err(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_err(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_err(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_err(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_err(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS benchmark_runs (
                    run_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recorded_at INTEGER NOT NULL,
                    timestamp TEXT NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL,
                    client_version TEXT NOT NULL,
                    script_version TEXT NOT NULL,
                    connect_retries INTEGER NOT NULL,
                    call_retries INTEGER NOT NULL,
                    timeout_ms INTEGER NOT NULL,
                    time_box_ms INTEGER NOT NULL,
                    threaded INTEGER NOT NULL,
                    parameters_json TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS nodes (
                    node_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    url TEXT NOT NULL UNIQUE,
                    first_seen TEXT NOT NULL,
                    last_seen TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS node_status (
                    status_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    run_id INTEGER NOT NULL,
                    node_id INTEGER NOT NULL,
                    is_working INTEGER NOT NULL,
                    error_message TEXT,
                    version TEXT,
                    composite_score REAL NOT NULL DEFAULT 0.0,
                    FOREIGN KEY (run_id) REFERENCES benchmark_runs(run_id) ON DELETE CASCADE,
                    FOREIGN KEY (node_id) REFERENCES nodes(node_id) ON DELETE CASCADE
                );
                CREATE TABLE IF NOT EXISTS test_results (
                    result_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    run_id INTEGER NOT NULL,
                    node_id INTEGER NOT NULL,
                    probe_kind TEXT NOT NULL,
                    is_ok INTEGER NOT NULL,
                    rank INTEGER NOT NULL,
                    total_duration REAL NOT NULL,
                    count INTEGER,
                    access_time REAL,
                    min_latency REAL,
                    max_latency REAL,
                    avg_latency REAL,
                    samples INTEGER,
                    head_delay REAL,
                    head_lag INTEGER,
                    FOREIGN KEY (run_id) REFERENCES benchmark_runs(run_id) ON DELETE CASCADE,
                    FOREIGN KEY (node_id) REFERENCES nodes(node_id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_node_status_run_id ON node_status (run_id);
                CREATE INDEX IF NOT EXISTS idx_test_results_run_id ON test_results (run_id);
                CREATE INDEX IF NOT EXISTS idx_test_results_node_kind
                    ON test_results (node_id, probe_kind);",
            )
            .map_err(|err| db_err(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_err(&err))?;
    Ok(())
}

/// Formats a timestamp as RFC 3339 text.
fn format_time(time: OffsetDateTime) -> Result<String, SqliteStoreError> {
    time.format(&Rfc3339).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Parses RFC 3339 text back into a timestamp.
fn parse_time(text: &str) -> Result<OffsetDateTime, SqliteStoreError> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|_| SqliteStoreError::Corrupt(format!("unparseable timestamp: {text}")))
}

/// Parses a persisted probe kind label.
fn parse_kind(label: &str) -> Result<ProbeKind, SqliteStoreError> {
    ProbeKind::from_label(label)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown probe kind: {label}")))
}

/// Parses a persisted rank, mapping the sentinel back to `None`.
fn parse_rank(rank: i64) -> Result<Option<u32>, SqliteStoreError> {
    if rank == NO_RANK {
        return Ok(None);
    }
    u32::try_from(rank)
        .map(Some)
        .map_err(|_| SqliteStoreError::Corrupt(format!("invalid rank: {rank}")))
}
