use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, Networks, System};
use tracing::{instrument, trace};

use crate::{CpuOverview, DiskInformation, HostSnapshot, MemoryInformation, NetCounters, NetRate};

impl NetRate {
    /// Rate between two counter readings taken `elapsed` apart.
    ///
    /// Without a previous reading, or over a zero interval, the rate is zero.
    /// Counters that went backwards (interface reset) count as no traffic.
    pub fn between(previous: Option<NetCounters>, current: NetCounters, elapsed: Duration) -> NetRate {
        let Some(previous) = previous else {
            return NetRate::ZERO;
        };

        let seconds = elapsed.as_secs_f64();
        if seconds <= 0.0 {
            return NetRate::ZERO;
        }

        let per_second = |now: u64, before: u64| now.saturating_sub(before) as f64 / 1024.0 / seconds;

        NetRate {
            recv_kb: per_second(current.received, previous.received),
            sent_kb: per_second(current.sent, previous.sent),
        }
    }
}

/// Previous counter reading, owned by the loop that computes rates
#[derive(Debug, Clone, Copy, Default)]
pub struct NetBaseline {
    last: Option<(NetCounters, Instant)>,
}

impl NetBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns a new reading into a rate and makes it the next baseline
    pub fn advance(&mut self, current: NetCounters, at: Instant) -> NetRate {
        let rate = match self.last {
            Some((previous, previous_at)) => NetRate::between(
                Some(previous),
                current,
                at.saturating_duration_since(previous_at),
            ),
            None => NetRate::ZERO,
        };

        self.last = Some((current, at));
        rate
    }
}

fn cpu_window(window: Duration) -> Duration {
    window.max(MINIMUM_CPU_UPDATE_INTERVAL)
}

/// Blocking: samples every host metric, sleeping through the CPU window
pub fn read_host_snapshot(mount_point: &Path, window: Duration) -> Result<HostSnapshot> {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(cpu_window(window));
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let cpus = CpuOverview {
        average_usage: sys.global_cpu_usage(),
        per_core: sys.cpus().iter().map(|cpu| cpu.cpu_usage()).collect(),
    };

    let memory = MemoryInformation {
        total: sys.total_memory(),
        used: sys.used_memory(),
        total_swap: sys.total_swap(),
        used_swap: sys.used_swap(),
    };

    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == mount_point)
        .map(|disk| DiskInformation {
            mount_point: disk.mount_point().display().to_string(),
            total: disk.total_space(),
            available: disk.available_space(),
        })
        .with_context(|| format!("no filesystem mounted at {}", mount_point.display()))?;

    let networks = Networks::new_with_refreshed_list();
    let net_counters = networks
        .list()
        .values()
        .fold(NetCounters::default(), |acc, data| NetCounters {
            received: acc.received.saturating_add(data.total_received()),
            sent: acc.sent.saturating_add(data.total_transmitted()),
        });
    let taken_at = Instant::now();

    trace!("host snapshot: cpu {:.1}% over {} cores", cpus.average_usage, cpus.per_core.len());

    Ok(HostSnapshot {
        host_name: System::host_name(),
        cpus,
        memory,
        disk,
        net_counters,
        uptime_seconds: System::uptime(),
        taken_at,
    })
}

/// Runs [`read_host_snapshot`] on the blocking pool
#[instrument]
pub async fn collect_host(mount_point: PathBuf, window: Duration) -> Result<HostSnapshot> {
    tokio::task::spawn_blocking(move || read_host_snapshot(&mount_point, window))
        .await
        .context("host metric collection task failed")?
}

/// Blocking: aggregate CPU usage over the window
pub fn read_cpu_usage(window: Duration) -> f32 {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(cpu_window(window));
    sys.refresh_cpu_usage();
    sys.global_cpu_usage()
}

pub async fn sample_cpu_usage(window: Duration) -> Result<f32> {
    tokio::task::spawn_blocking(move || read_cpu_usage(window))
        .await
        .context("CPU sampling task failed")
}
