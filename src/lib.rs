pub mod alerts;
pub mod bots;
pub mod config;
pub mod discord;
pub mod monitors;
pub mod report;
pub mod scheduler;
pub mod status_message;
pub mod telemetry;
pub mod util;
pub mod workload;

use std::time::Instant;

/// Everything the status report shows, for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub host_name: Option<String>,
    pub cpus: CpuOverview,
    pub memory: MemoryInformation,
    pub disk: DiskInformation,
    pub network: NetRate,
    pub uptime_seconds: u64,
}

impl SystemStats {
    pub fn new(snapshot: HostSnapshot, network: NetRate) -> Self {
        Self {
            host_name: snapshot.host_name,
            cpus: snapshot.cpus,
            memory: snapshot.memory,
            disk: snapshot.disk,
            network,
            uptime_seconds: snapshot.uptime_seconds,
        }
    }
}

/// Raw readings of one collection, before the network rate is derived
#[derive(Debug, Clone)]
pub struct HostSnapshot {
    pub host_name: Option<String>,
    pub cpus: CpuOverview,
    pub memory: MemoryInformation,
    pub disk: DiskInformation,
    pub net_counters: NetCounters,
    pub uptime_seconds: u64,

    /// When the network counters were read
    pub taken_at: Instant,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuOverview {
    pub average_usage: f32,
    pub per_core: Vec<f32>,
}

/// Memory and swap, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInformation {
    pub total: u64,
    pub used: u64,
    pub total_swap: u64,
    pub used_swap: u64,
}

impl MemoryInformation {
    pub fn percent(&self) -> f32 {
        percent_of(self.used, self.total)
    }

    pub fn swap_percent(&self) -> f32 {
        percent_of(self.used_swap, self.total_swap)
    }
}

/// One mounted filesystem, in bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskInformation {
    pub mount_point: String,
    pub total: u64,
    pub available: u64,
}

impl DiskInformation {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }

    pub fn percent(&self) -> f32 {
        percent_of(self.used(), self.total)
    }
}

/// Cumulative bytes since boot, summed over all interfaces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub received: u64,
    pub sent: u64,
}

/// Throughput in KB/s
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRate {
    pub recv_kb: f64,
    pub sent_kb: f64,
}

impl NetRate {
    pub const ZERO: NetRate = NetRate {
        recv_kb: 0.0,
        sent_kb: 0.0,
    };
}

pub(crate) fn percent_of(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0) as f32
}

pub(crate) const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub(crate) fn to_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}
