use std::fmt;
use std::path::PathBuf;

use tracing::trace;

/// Top-level configuration shared by all bots.
///
/// Every section falls back to its defaults, so running without a config
/// file is the same as loading `{}`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub instance: InstanceConfig,

    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub keepalive: KeepaliveConfig,

    #[serde(default)]
    pub processes: ProcessConfig,

    #[serde(default)]
    pub cron: CronConfig,

    #[serde(default)]
    pub discord: DiscordConfig,
}

/// Display-only description of the machine being watched
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InstanceConfig {
    #[serde(default = "default_instance_name")]
    pub name: String,
    #[serde(default = "default_instance_shape")]
    pub shape: String,
    #[serde(default = "default_total_cpu")]
    pub total_cpu: u32,
    #[serde(default = "default_total_ram_gb")]
    pub total_ram_gb: u32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            name: default_instance_name(),
            shape: default_instance_shape(),
            total_cpu: default_total_cpu(),
            total_ram_gb: default_total_ram_gb(),
        }
    }
}

fn default_instance_name() -> String {
    String::from("Oracle Cloud (ARM64)")
}

fn default_instance_shape() -> String {
    String::from("VM.Standard.A1.Flex")
}

fn default_total_cpu() -> u32 {
    4
}

fn default_total_ram_gb() -> u32 {
    24
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct StatusConfig {
    /// Seconds between two status reports
    #[serde(default = "default_status_interval")]
    pub interval: u64,

    /// Above these the status embed turns orange
    #[serde(default)]
    pub warn: WarnThresholds,

    /// Crossing these posts an alert message
    #[serde(default)]
    pub alert: AlertThresholds,

    /// Filesystem reported as "disk"
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,

    /// Prefix of raise notifications
    #[serde(default = "default_mention")]
    pub mention: String,

    /// Milliseconds the CPU usage is sampled over
    #[serde(default = "default_cpu_window_ms")]
    pub cpu_window_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            interval: default_status_interval(),
            warn: WarnThresholds::default(),
            alert: AlertThresholds::default(),
            mount_point: default_mount_point(),
            mention: default_mention(),
            cpu_window_ms: default_cpu_window_ms(),
        }
    }
}

fn default_status_interval() -> u64 {
    10
}

fn default_mount_point() -> PathBuf {
    PathBuf::from("/")
}

fn default_mention() -> String {
    String::from("@here")
}

fn default_cpu_window_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct WarnThresholds {
    #[serde(default = "default_warn_cpu")]
    pub cpu: f32,
    #[serde(default = "default_warn_memory")]
    pub memory: f32,
    #[serde(default = "default_warn_disk")]
    pub disk: f32,
}

impl Default for WarnThresholds {
    fn default() -> Self {
        Self {
            cpu: default_warn_cpu(),
            memory: default_warn_memory(),
            disk: default_warn_disk(),
        }
    }
}

fn default_warn_cpu() -> f32 {
    80.0
}

fn default_warn_memory() -> f32 {
    80.0
}

fn default_warn_disk() -> f32 {
    85.0
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_alert_cpu")]
    pub cpu: f32,
    #[serde(default = "default_alert_disk")]
    pub disk: f32,
    /// KB/s, applied to receive and send independently
    #[serde(default = "default_alert_net_kb")]
    pub net_kb: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu: default_alert_cpu(),
            disk: default_alert_disk(),
            net_kb: default_alert_net_kb(),
        }
    }
}

fn default_alert_cpu() -> f32 {
    50.0
}

fn default_alert_disk() -> f32 {
    50.0
}

fn default_alert_net_kb() -> f64 {
    10.0 * 1024.0
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct KeepaliveConfig {
    /// Upper bound of the prime sieve
    #[serde(default = "default_sieve_limit")]
    pub sieve_limit: usize,

    /// Length of the SHA-256 chain
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u64,

    /// Parallel workers; defaults to the available parallelism
    pub workers: Option<usize>,

    #[serde(default = "default_interval_min")]
    pub interval_min: u64,
    #[serde(default = "default_interval_max")]
    pub interval_max: u64,

    /// Seconds before the first run
    #[serde(default = "default_initial_delay")]
    pub initial_delay: u64,

    #[serde(default = "default_hash_seed")]
    pub seed: String,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            sieve_limit: default_sieve_limit(),
            hash_iterations: default_hash_iterations(),
            workers: None,
            interval_min: default_interval_min(),
            interval_max: default_interval_max(),
            initial_delay: default_initial_delay(),
            seed: default_hash_seed(),
        }
    }
}

impl KeepaliveConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

fn default_sieve_limit() -> usize {
    150_000_000
}

fn default_hash_iterations() -> u64 {
    80_000_000
}

fn default_interval_min() -> u64 {
    5 * 60
}

fn default_interval_max() -> u64 {
    20 * 60
}

fn default_initial_delay() -> u64 {
    60
}

fn default_hash_seed() -> String {
    String::from("oracle-cpu-keepalive")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProcessConfig {
    #[serde(default = "default_process_interval")]
    pub interval: u64,

    /// Number of processes listed in the report, at most [`MAX_TOP`]
    #[serde(default = "default_top")]
    pub top: usize,

    /// Milliseconds per-process CPU usage is sampled over
    #[serde(default = "default_cpu_window_ms")]
    pub cpu_window_ms: u64,
}

/// More rows than this do not fit in one embed field
pub const MAX_TOP: usize = 15;

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            interval: default_process_interval(),
            top: default_top(),
            cpu_window_ms: default_cpu_window_ms(),
        }
    }
}

fn default_process_interval() -> u64 {
    60
}

fn default_top() -> usize {
    10
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CronConfig {
    #[serde(default = "default_cron_interval")]
    pub interval: u64,

    /// Crontab-style file describing the job
    #[serde(default = "default_cron_file")]
    pub file: PathBuf,

    /// Substring identifying the job's processes
    #[serde(default = "default_cron_keyword")]
    pub keyword: String,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            interval: default_cron_interval(),
            file: default_cron_file(),
            keyword: default_cron_keyword(),
        }
    }
}

fn default_cron_interval() -> u64 {
    300
}

fn default_cron_file() -> PathBuf {
    PathBuf::from("/etc/cron.d/keepwatch-job")
}

fn default_cron_keyword() -> String {
    String::from("keepwatch-job")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// How many recent messages are scanned when recovering the status message
    #[serde(default = "default_history_limit")]
    pub history_limit: u8,

    /// Offset of the clock shown in embed footers
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            history_limit: default_history_limit(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_api_base() -> String {
    String::from("https://discord.com/api/v10")
}

fn default_history_limit() -> u8 {
    50
}

fn default_utc_offset_hours() -> i32 {
    9
}

/// Errors raised while assembling the startup configuration.
///
/// All of them are fatal: the bot exits before it talks to Discord.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    MissingVar(&'static str),

    /// A channel id that is not a positive integer
    InvalidChannel { var: &'static str, value: String },

    /// The config file could not be read
    Io(std::io::Error),

    /// The config file is not valid JSON for [`Config`]
    Parse(serde_json::Error),

    /// A value is outside its allowed range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(var) => {
                write!(f, "environment variable {var} is not set")
            }
            ConfigError::InvalidChannel { var, value } => {
                write!(f, "{var} must be a non-zero channel id, got {value:?}")
            }
            ConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid configuration file: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.status.interval == 0 {
            return invalid("status.interval must be greater than zero");
        }
        if self.processes.interval == 0 {
            return invalid("processes.interval must be greater than zero");
        }
        if !(1..=MAX_TOP).contains(&self.processes.top) {
            return invalid(&format!("processes.top must be within 1..={MAX_TOP}"));
        }
        if self.cron.interval == 0 {
            return invalid("cron.interval must be greater than zero");
        }
        if self.keepalive.interval_min == 0 {
            return invalid("keepalive.interval_min must be greater than zero");
        }
        if self.keepalive.interval_min > self.keepalive.interval_max {
            return invalid("keepalive.interval_min must not exceed keepalive.interval_max");
        }
        if self.keepalive.sieve_limit < 2 || self.keepalive.hash_iterations == 0 {
            return invalid("keepalive workload sizes must be non-trivial");
        }
        if self.keepalive.workers == Some(0) {
            return invalid("keepalive.workers must be greater than zero");
        }
        if self.discord.utc_offset_hours.abs() > 23 {
            return invalid("discord.utc_offset_hours must be within -23..=23");
        }

        Ok(())
    }
}

pub fn read_config_file(path: &str) -> Result<Config, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&file_content)?;
    config.validate()?;
    trace!("loaded config: {config:?}");
    Ok(config)
}

/// Reads the config file if one was given, otherwise uses the defaults
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => read_config_file(path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
