use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::discord::{ChannelId, DiscordClient, MessageBuilder};
use crate::monitors::host::sample_cpu_usage;
use crate::report::{KEEPALIVE_MARKER, Reporter};
use crate::scheduler::{Cycle, CycleError, CycleReport};
use crate::status_message::StatusMessage;
use crate::workload::{WorkloadPlan, run_workload};

const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Keeps the CPU busy on a random schedule and reports each run
pub struct KeepaliveBot {
    client: DiscordClient,
    reporter: Reporter,
    plan: WorkloadPlan,
    history_limit: u8,
    message: StatusMessage,
}

impl KeepaliveBot {
    pub fn new(client: DiscordClient, channel: ChannelId, config: &Config) -> Self {
        let plan = WorkloadPlan {
            workers: config.keepalive.worker_count(),
            sieve_limit: config.keepalive.sieve_limit,
            hash_iterations: config.keepalive.hash_iterations,
            seed: config.keepalive.seed.clone(),
        };

        Self {
            client,
            reporter: Reporter::new(config.instance.clone(), config.discord.utc_offset_hours),
            plan,
            history_limit: config.discord.history_limit,
            message: StatusMessage::new(channel, KEEPALIVE_MARKER),
        }
    }

    pub fn plan(&self) -> &WorkloadPlan {
        &self.plan
    }

    pub fn message(&self) -> &StatusMessage {
        &self.message
    }

    async fn cpu_reading(&self) -> f32 {
        match sample_cpu_usage(CPU_SAMPLE_WINDOW).await {
            Ok(usage) => usage,
            Err(e) => {
                warn!("could not read CPU usage: {e:#}");
                0.0
            }
        }
    }
}

#[async_trait]
impl Cycle for KeepaliveBot {
    fn name(&self) -> &str {
        "keepalive"
    }

    async fn prepare(&mut self) -> Result<(), CycleError> {
        super::recover_handle(&self.client, &mut self.message, self.history_limit).await
    }

    async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let cpu_before = self.cpu_reading().await;
        info!("workload starting on {} workers (CPU {cpu_before:.1}%)", self.plan.workers);

        let summary = match run_workload(self.plan.clone()).await {
            Ok(summary) => summary,
            Err(e) => {
                let embed = self.reporter.build_keepalive_failure_embed(&format!("{e:#}"));
                let message = MessageBuilder::new().add_embed(embed).build();
                if let Err(send_err) = self.client.send_message(self.message.channel(), &message).await {
                    warn!("could not report workload failure: {send_err}");
                }
                return Err(CycleError::Workload(e));
            }
        };

        let cpu_after = self.cpu_reading().await;

        let embed = self.reporter.build_keepalive_embed(&summary, cpu_before, cpu_after);
        let message = MessageBuilder::new().add_embed(embed).build();
        self.message.publish(&self.client, &message).await?;

        Ok(CycleReport::new(format!(
            "workload done in {:.2}s | {} primes | digest {}",
            summary.total.as_secs_f64(),
            summary.prime_count,
            summary.digest_prefix
        )))
    }
}
