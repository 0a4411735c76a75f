use serde::Deserialize;

/// Main configuration structure for Tidepool
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub session: SessionConfig,
    pub output: OutputConfig,
    pub fields: FieldsConfig,
    /// Optional CSV task source for the bundled task fetcher
    #[serde(default)]
    pub tasks: Option<TaskSourceConfig>,
}

/// Orchestration behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum extraction attempts per task, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base backoff delay before the first retry (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Ceiling for computed backoff delays (milliseconds)
    #[serde(rename = "backoff-cap-ms")]
    pub backoff_cap_ms: u64,

    /// Lower bound of the politeness delay between tasks (milliseconds)
    #[serde(rename = "pace-min-ms")]
    pub pace_min_ms: u64,

    /// Upper bound of the politeness delay between tasks (milliseconds)
    #[serde(rename = "pace-max-ms")]
    pub pace_max_ms: u64,

    /// Stop after persisting this many new records (unset = unlimited)
    #[serde(rename = "item-cap", default)]
    pub item_cap: Option<u64>,

    /// Cleanup grace period after a shutdown request (milliseconds)
    #[serde(rename = "shutdown-grace-ms", default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

/// Fetch session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// User agent string sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Connection establishment timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Optional Accept-Language header for localized sites
    #[serde(rename = "accept-language", default)]
    pub accept_language: Option<String>,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

/// Backing format of the result sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    /// Single merged tabular file, one row per record
    Csv,
    /// One self-describing JSON document per record
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Which result sink to use
    pub format: SinkFormat,

    /// Path to the merged tabular file (required for the csv format)
    #[serde(rename = "results-path", default)]
    pub results_path: Option<String>,

    /// Directory for per-record JSON files (required for the json format)
    #[serde(rename = "output-dir", default)]
    pub output_dir: Option<String>,

    /// Path to the append-only attempt ledger
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,
}

/// Record field set configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FieldsConfig {
    /// Full ordered field set; also the tabular sink header
    pub names: Vec<String>,

    /// Fields whose normalized values form the duplicate-detection fingerprint
    #[serde(rename = "key-fields")]
    pub key_fields: Vec<String>,

    /// Fields that must be present and non-empty for a record to persist
    #[serde(default)]
    pub required: Vec<String>,
}

/// CSV task source for the bundled task fetcher
///
/// Points at a file produced by an earlier listing crawl, one candidate
/// task per row.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSourceConfig {
    /// Path to the task CSV file
    pub path: String,

    /// Column holding the stable task identifier (typically a URL)
    #[serde(rename = "id-column")]
    pub id_column: String,

    /// Column holding the human-readable label
    #[serde(rename = "label-column")]
    pub label_column: String,

    /// Columns whose values form the task fingerprint
    #[serde(rename = "key-columns")]
    pub key_columns: Vec<String>,
}
