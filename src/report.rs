use chrono::{FixedOffset, Offset, Utc};

use crate::config::{InstanceConfig, WarnThresholds};
use crate::discord::{Embed, EmbedField, EmbedFooter, FIELD_VALUE_LIMIT};
use crate::monitors::cron::JobStatus;
use crate::monitors::processes::ProcessSnapshot;
use crate::monitors::resources::{AlertNotice, Transition};
use crate::workload::WorkloadSummary;
use crate::{SystemStats, to_gib};

pub const COLOR_NORMAL: u32 = 0x2ECC71;
pub const COLOR_WARN: u32 = 0xE67E22;
pub const COLOR_CRIT: u32 = 0xE74C3C;
pub const COLOR_INFO: u32 = 0x3498DB;

/// Title markers used to find a bot's own periodic message in channel history
pub const STATUS_MARKER: &str = "System Monitor";
pub const KEEPALIVE_MARKER: &str = "CPU Workload";
pub const PROCESS_MARKER: &str = "Process Report";
pub const CRON_MARKER: &str = "Cron Watch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

impl Severity {
    pub fn classify(value: f32, threshold: f32) -> Severity {
        if value >= threshold {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    pub fn color(self) -> u32 {
        match self {
            Severity::Normal => COLOR_NORMAL,
            Severity::Warning => COLOR_WARN,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Normal => "✅",
            Severity::Warning => "⚠️",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Severity::Normal => "",
            Severity::Warning => " ⚠️",
        }
    }
}

/// Text bar of `width` cells, filled proportionally to `percent`
pub fn make_bar(percent: f64, width: usize) -> String {
    let filled = (percent / 100.0 * width as f64).round();
    let filled = if filled.is_nan() {
        0
    } else {
        filled.clamp(0.0, width as f64) as usize
    };

    "█".repeat(filled) + &"░".repeat(width - filled)
}

pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// `1234567` → `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

const BAR_WIDTH: usize = 10;

/// Joins `items` with `sep`; once `budget` characters would be exceeded the
/// rest is dropped and replaced by `…`
fn join_within(items: &[String], sep: &str, budget: usize) -> String {
    let joined = items.join(sep);
    if joined.chars().count() <= budget {
        return joined;
    }

    let sep_len = sep.chars().count();
    let mut out = String::new();
    let mut used = 0;
    for item in items {
        let piece = if out.is_empty() { 0 } else { sep_len } + item.chars().count();
        if used + piece + sep_len + 1 > budget {
            break;
        }
        if !out.is_empty() {
            out.push_str(sep);
        }
        out.push_str(item);
        used += piece;
    }

    if !out.is_empty() {
        out.push_str(sep);
    }
    out.push('…');
    out
}

/// Backticks would close the surrounding code block
fn code_safe(text: &str) -> String {
    text.replace('`', "'")
}

const TABLE_HEADER: &str = "```\n  PID   CPU%    MEM  USER      NAME\n";
const TABLE_END: &str = "```";

fn usage_line(percent: f32, severity: Severity) -> String {
    format!(
        "`{}` **{percent:.1}%**{}",
        make_bar(percent as f64, BAR_WIDTH),
        severity.suffix()
    )
}

/// Builds every embed the bots post.
///
/// Holds the display settings shared by all of them.
#[derive(Debug, Clone)]
pub struct Reporter {
    instance: InstanceConfig,
    offset: FixedOffset,
}

impl Reporter {
    pub fn new(instance: InstanceConfig, utc_offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { instance, offset }
    }

    pub fn instance_name(&self) -> &str {
        &self.instance.name
    }

    fn footer(&self) -> EmbedFooter {
        let now = Utc::now().with_timezone(&self.offset);
        EmbedFooter {
            text: now.format("%Y-%m-%d %H:%M:%S UTC%:z").to_string(),
        }
    }

    fn timestamp() -> Option<String> {
        Some(Utc::now().to_rfc3339())
    }

    pub fn build_status_embed(&self, stats: &SystemStats, warn: &WarnThresholds) -> Embed {
        let cpu_percent = stats.cpus.average_usage;
        let mem_percent = stats.memory.percent();
        let disk_percent = stats.disk.percent();

        let cpu = Severity::classify(cpu_percent, warn.cpu);
        let mem = Severity::classify(mem_percent, warn.memory);
        let disk = Severity::classify(disk_percent, warn.disk);

        let overall = if [cpu, mem, disk].contains(&Severity::Warning) {
            Severity::Warning
        } else {
            Severity::Normal
        };

        let cpu_head = format!("{}\nPer core: ", usage_line(cpu_percent, cpu));
        let per_core: Vec<String> = stats
            .cpus
            .per_core
            .iter()
            .map(|usage| format!("{usage:.0}%"))
            .collect();
        let per_core = join_within(
            &per_core,
            " / ",
            FIELD_VALUE_LIMIT.saturating_sub(cpu_head.chars().count()),
        );

        let mut fields = vec![
            EmbedField::new("CPU", format!("{cpu_head}{per_core}"), false),
            EmbedField::new(
                "Memory (RAM)",
                format!(
                    "{}\n{:.1} GB / {:.1} GB",
                    usage_line(mem_percent, mem),
                    to_gib(stats.memory.used),
                    to_gib(stats.memory.total)
                ),
                true,
            ),
        ];

        if stats.memory.total_swap > 0 {
            fields.push(EmbedField::new(
                "Swap",
                format!(
                    "{}\n{:.1} GB / {:.1} GB",
                    usage_line(stats.memory.swap_percent(), Severity::Normal),
                    to_gib(stats.memory.used_swap),
                    to_gib(stats.memory.total_swap)
                ),
                true,
            ));
        }

        fields.push(EmbedField::new(
            format!("Disk ({})", stats.disk.mount_point),
            format!(
                "{}\n{:.1} GB / {:.1} GB",
                usage_line(disk_percent, disk),
                to_gib(stats.disk.used()),
                to_gib(stats.disk.total)
            ),
            true,
        ));

        fields.push(EmbedField::new(
            "Network",
            format!(
                "Receive ↓ **{:.1} KB/s**\nSend ↑ **{:.1} KB/s**",
                stats.network.recv_kb, stats.network.sent_kb
            ),
            true,
        ));

        Embed {
            title: Some(format!(
                "{} {} {STATUS_MARKER}",
                overall.icon(),
                self.instance.name
            )),
            description: Some(format!(
                "`{}` | {} OCPU / {} GB | Uptime: **{}**",
                self.instance.shape,
                self.instance.total_cpu,
                self.instance.total_ram_gb,
                format_uptime(stats.uptime_seconds)
            )),
            color: Some(overall.color()),
            fields,
            footer: Some(self.footer()),
            timestamp: Self::timestamp(),
        }
    }

    pub fn build_alert_embed(&self, notice: &AlertNotice) -> Embed {
        let label = notice.category.label();
        let unit = notice.category.unit();

        let (title, description, color) = match notice.transition {
            Transition::Cleared => (
                format!("✅ {label} recovered"),
                format!(
                    "**{}** {label} is back below the threshold",
                    self.instance.name
                ),
                COLOR_NORMAL,
            ),
            _ => (
                format!("🚨 {label} alert"),
                format!(
                    "**{}** {label} has reached the threshold!",
                    self.instance.name
                ),
                COLOR_CRIT,
            ),
        };

        Embed {
            title: Some(title),
            description: Some(description),
            color: Some(color),
            fields: vec![
                EmbedField::new("Current", format!("{:.1}{unit}", notice.value), true),
                EmbedField::new("Threshold", format!("{:.0}{unit}", notice.threshold), true),
            ],
            footer: Some(self.footer()),
            timestamp: Self::timestamp(),
        }
    }

    pub fn build_keepalive_embed(&self, summary: &WorkloadSummary, cpu_before: f32, cpu_after: f32) -> Embed {
        Embed {
            title: Some(format!("🖥️ {KEEPALIVE_MARKER} complete")),
            description: Some(format!(
                "Parallel run on **{} cores** finished.\nTotal time: **{:.2}s**",
                summary.workers,
                summary.total.as_secs_f64()
            )),
            color: Some(COLOR_INFO),
            fields: vec![
                EmbedField::new(
                    "Prime sieve",
                    format!(
                        "Range: 2 ~ **{}**\nPrimes found: **{}**\nAverage per core: **{:.2}s**",
                        group_thousands(summary.sieve_limit as u64),
                        group_thousands(summary.prime_count as u64),
                        summary.avg_sieve.as_secs_f64()
                    ),
                    false,
                ),
                EmbedField::new(
                    "SHA-256 chain",
                    format!(
                        "Iterations: **{}**\nAverage per core: **{:.2}s**\nDigest: `{}`",
                        group_thousands(summary.hash_iterations),
                        summary.avg_hash.as_secs_f64(),
                        summary.digest_prefix
                    ),
                    false,
                ),
                EmbedField::new(
                    "CPU usage",
                    format!("Before: **{cpu_before:.1}%** → After: **{cpu_after:.1}%**"),
                    false,
                ),
            ],
            footer: Some(self.footer()),
            timestamp: Self::timestamp(),
        }
    }

    pub fn build_keepalive_failure_embed(&self, error: &str) -> Embed {
        Embed {
            title: Some(String::from("❌ Workload failed")),
            description: Some(format!("```{error}```")),
            color: Some(COLOR_CRIT),
            footer: Some(self.footer()),
            timestamp: Self::timestamp(),
            ..Embed::default()
        }
    }

    pub fn build_process_embed(&self, snapshot: &ProcessSnapshot) -> Embed {
        let mut table = String::from(TABLE_HEADER);
        let mut used = TABLE_HEADER.chars().count() + TABLE_END.chars().count();
        let mut shown = 0;
        for process in &snapshot.processes {
            let user = code_safe(process.user.as_deref().unwrap_or("?"));
            let row = format!(
                "{:>5} {:>6.1} {:>5}M  {:<8.8}  {:.24}\n",
                process.pid,
                process.cpu_usage,
                process.memory / (1024 * 1024),
                user,
                code_safe(&process.name)
            );

            let len = row.chars().count();
            if used + len > FIELD_VALUE_LIMIT {
                break;
            }
            used += len;
            table.push_str(&row);
            shown += 1;
        }
        table.push_str(TABLE_END);

        let load = snapshot.load;

        Embed {
            title: Some(format!("📋 {} {PROCESS_MARKER}", self.instance.name)),
            description: Some(format!(
                "**{}** processes | load **{:.2}** / **{:.2}** / **{:.2}** (1m / 5m / 15m)",
                snapshot.total, load.one, load.five, load.fifteen
            )),
            color: Some(COLOR_INFO),
            fields: vec![EmbedField::new(
                format!("Top {shown} by CPU"),
                table,
                false,
            )],
            footer: Some(self.footer()),
            timestamp: Self::timestamp(),
        }
    }

    pub fn build_cron_embed(&self, status: &JobStatus, keyword: &str) -> Embed {
        let severity = if status.is_configured() {
            Severity::Normal
        } else {
            Severity::Warning
        };

        let file_state = if status.file_exists { "present" } else { "missing" };

        Embed {
            title: Some(format!("{} {CRON_MARKER}: {keyword}", severity.icon())),
            description: Some(format!(
                "Job file `{}` is **{file_state}**",
                status.file.display()
            )),
            color: Some(severity.color()),
            fields: vec![
                EmbedField::new("Schedule entries", status.entries, true),
                EmbedField::new("Running processes", status.running, true),
            ],
            footer: Some(self.footer()),
            timestamp: Self::timestamp(),
        }
    }

    /// `Raised` means the job stopped being configured
    pub fn build_cron_notice_embed(&self, transition: Transition, status: &JobStatus) -> Embed {
        let (title, color) = match transition {
            Transition::Cleared => ("✅ Cron job configured again", COLOR_NORMAL),
            _ => ("⚠️ Cron job not configured", COLOR_WARN),
        };

        Embed {
            title: Some(title.to_string()),
            description: Some(format!(
                "`{}`: {} schedule entries, {} running processes",
                status.file.display(),
                status.entries,
                status.running
            )),
            color: Some(color),
            footer: Some(self.footer()),
            timestamp: Self::timestamp(),
            ..Embed::default()
        }
    }
}
