use std::cmp::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use sysinfo::{
    MINIMUM_CPU_UPDATE_INTERVAL, Process, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// Owner's user name, when it can be resolved
    pub user: Option<String>,
    pub cpu_usage: f32,
    /// Resident memory in bytes
    pub memory: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    /// Busiest processes first
    pub processes: Vec<ProcessInfo>,
    pub total: usize,
    pub load: LoadAverage,
}

/// Sorts by CPU then memory, both descending, and keeps the first `limit`
pub fn rank(mut processes: Vec<ProcessInfo>, limit: usize) -> Vec<ProcessInfo> {
    processes.sort_by(|a, b| {
        b.cpu_usage
            .partial_cmp(&a.cpu_usage)
            .unwrap_or(Ordering::Equal)
            .then(b.memory.cmp(&a.memory))
            .then(a.pid.cmp(&b.pid))
    });
    processes.truncate(limit);
    processes
}

/// Blocking: two process refreshes `window` apart so CPU usage is meaningful
pub fn read_process_snapshot(limit: usize, window: Duration) -> ProcessSnapshot {
    let refresh = ProcessRefreshKind::nothing()
        .with_cpu()
        .with_memory()
        .with_user(UpdateKind::OnlyIfNotSet);

    let mut sys = System::new();
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);
    std::thread::sleep(window.max(MINIMUM_CPU_UPDATE_INTERVAL));
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);

    let users = Users::new_with_refreshed_list();

    let processes: Vec<ProcessInfo> = sys
        .processes()
        .values()
        .map(|process| ProcessInfo {
            pid: process.pid().as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            user: process
                .user_id()
                .and_then(|uid| users.get_user_by_id(uid))
                .map(|user| user.name().to_string()),
            cpu_usage: process.cpu_usage(),
            memory: process.memory(),
        })
        .collect();

    let total = processes.len();
    let load = System::load_average();

    ProcessSnapshot {
        processes: rank(processes, limit),
        total,
        load: LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        },
    }
}

pub async fn collect_processes(limit: usize, window: Duration) -> Result<ProcessSnapshot> {
    tokio::task::spawn_blocking(move || read_process_snapshot(limit, window))
        .await
        .context("process collection task failed")
}

/// Whether a process name or command line contains the keyword
pub fn matches_keyword(name: &str, command_line: &str, keyword: &str) -> bool {
    !keyword.is_empty() && (name.contains(keyword) || command_line.contains(keyword))
}

fn command_line(process: &Process) -> String {
    process
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Blocking: number of running processes matching the keyword
pub fn count_matching(keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }

    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
    );

    let own_pid = std::process::id();

    sys.processes()
        .values()
        .filter(|process| process.pid().as_u32() != own_pid)
        .filter(|process| {
            matches_keyword(
                &process.name().to_string_lossy(),
                &command_line(process),
                keyword,
            )
        })
        .count()
}
