//! Keepalive workload: CPU-bound busy work spread over every core.
//!
//! Each worker runs a prime sieve followed by a SHA-256 chain. Workers share
//! nothing and are only joined once all of them are done.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Number of primes `<= limit` (sieve of Eratosthenes)
pub fn sieve_prime_count(limit: usize) -> usize {
    if limit < 2 {
        return 0;
    }

    let mut is_prime = vec![true; limit + 1];
    is_prime[0] = false;
    is_prime[1] = false;

    let mut i = 2;
    while i * i <= limit {
        if is_prime[i] {
            for multiple in (i * i..=limit).step_by(i) {
                is_prime[multiple] = false;
            }
        }
        i += 1;
    }

    is_prime.iter().filter(|&&prime| prime).count()
}

/// Hashes `seed`, then the digest, `iterations` times in total
pub fn hash_chain(seed: &[u8], iterations: u64) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::digest(seed).into();
    for _ in 1..iterations {
        digest = Sha256::digest(digest).into();
    }
    digest
}

#[derive(Debug, Clone)]
pub struct WorkloadPlan {
    pub workers: usize,
    pub sieve_limit: usize,
    pub hash_iterations: u64,
    pub seed: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub prime_count: usize,
    pub sieve_time: Duration,
    pub digest: String,
    pub hash_time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSummary {
    pub workers: usize,
    pub sieve_limit: usize,
    pub prime_count: usize,
    pub hash_iterations: u64,
    pub avg_sieve: Duration,
    pub avg_hash: Duration,
    pub total: Duration,
    /// First 16 hex characters of the final digest
    pub digest_prefix: String,
}

/// Blocking: one worker's share of the workload
pub fn run_worker(worker_id: usize, plan: &WorkloadPlan) -> WorkerReport {
    let started = Instant::now();
    let prime_count = sieve_prime_count(plan.sieve_limit);
    let sieve_time = started.elapsed();

    let started = Instant::now();
    let digest = hex::encode(hash_chain(plan.seed.as_bytes(), plan.hash_iterations));
    let hash_time = started.elapsed();

    WorkerReport {
        worker_id,
        prime_count,
        sieve_time,
        digest,
        hash_time,
    }
}

/// Combines the worker reports of one run
pub fn summarize(plan: &WorkloadPlan, reports: &[WorkerReport], total: Duration) -> Result<WorkloadSummary> {
    let Some(first) = reports.first() else {
        bail!("workload finished without any worker report");
    };

    let count = reports.len() as u32;
    let avg_sieve = reports.iter().map(|r| r.sieve_time).sum::<Duration>() / count;
    let avg_hash = reports.iter().map(|r| r.hash_time).sum::<Duration>() / count;

    Ok(WorkloadSummary {
        workers: reports.len(),
        sieve_limit: plan.sieve_limit,
        prime_count: first.prime_count,
        hash_iterations: plan.hash_iterations,
        avg_sieve,
        avg_hash,
        total,
        digest_prefix: first.digest.chars().take(16).collect(),
    })
}

/// Fans the plan out over `plan.workers` blocking tasks and waits for all of them
#[instrument(skip(plan), fields(workers = plan.workers))]
pub async fn run_workload(plan: WorkloadPlan) -> Result<WorkloadSummary> {
    if plan.workers == 0 {
        bail!("workload needs at least one worker");
    }

    let started = Instant::now();

    let handles = (0..plan.workers).map(|worker_id| {
        let plan = plan.clone();
        tokio::task::spawn_blocking(move || run_worker(worker_id, &plan))
    });

    let mut reports = Vec::with_capacity(plan.workers);
    for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
        let report = joined.with_context(|| format!("worker {worker_id} failed"))?;
        debug!(
            "worker {worker_id}: {} primes in {:?}, hash chain in {:?}",
            report.prime_count, report.sieve_time, report.hash_time
        );
        reports.push(report);
    }

    summarize(&plan, &reports, started.elapsed())
}
