use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use super::processes::count_matching;

/// Five time fields or an `@macro`, followed by at least one more token.
///
/// Minute, hour and day-of-month are numeric; month and day-of-week may also
/// use three-letter names.
static SCHEDULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let number = r"(?:\*|\d+)(?:-\d+)?(?:/\d+)?";
    let named = r"(?:\*|\d+|[A-Za-z]{3})(?:-(?:\d+|[A-Za-z]{3}))?(?:/\d+)?";
    let numeric_field = format!("{number}(?:,{number})*");
    let named_field = format!("{named}(?:,{named})*");

    Regex::new(&format!(
        r"^(?:@(?:reboot|yearly|annually|monthly|weekly|daily|midnight|hourly)|(?:{numeric_field}\s+){{3}}{named_field}\s+{named_field})\s+\S"
    ))
    .expect("schedule pattern is valid")
});

static ENV_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\s*=").expect("assignment pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub file: PathBuf,
    pub file_exists: bool,
    /// Schedule lines found in the file
    pub entries: usize,
    /// Processes currently matching the job keyword
    pub running: usize,
}

impl JobStatus {
    /// The job is set up to run periodically
    pub fn is_configured(&self) -> bool {
        self.file_exists && self.entries > 0
    }
}

/// Counts schedule lines, skipping blanks, comments and variable assignments
pub fn count_entries(contents: &str) -> usize {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| !ENV_ASSIGNMENT.is_match(line))
        .filter(|line| SCHEDULE_LINE.is_match(line))
        .count()
}

/// Blocking: reads the job file and counts the job's running processes
pub fn inspect_job(file: &Path, keyword: &str) -> Result<JobStatus> {
    let (file_exists, entries) = match std::fs::read_to_string(file) {
        Ok(contents) => (true, count_entries(&contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => (false, 0),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", file.display()));
        }
    };

    Ok(JobStatus {
        file: file.to_path_buf(),
        file_exists,
        entries,
        running: count_matching(keyword),
    })
}

pub async fn collect_job(file: PathBuf, keyword: String) -> Result<JobStatus> {
    tokio::task::spawn_blocking(move || inspect_job(&file, &keyword))
        .await
        .context("cron inspection task failed")?
}
