use async_trait::async_trait;
use tracing::warn;

use crate::config::{Config, CronConfig};
use crate::discord::{ChannelId, DiscordClient, MessageBuilder};
use crate::monitors::cron::{JobStatus, collect_job};
use crate::monitors::resources::Transition;
use crate::report::{CRON_MARKER, Reporter};
use crate::scheduler::{Cycle, CycleError, CycleReport};
use crate::status_message::StatusMessage;

/// Watches that the scheduled external job is still installed and running
pub struct CronBot {
    client: DiscordClient,
    reporter: Reporter,
    config: CronConfig,
    history_limit: u8,
    message: StatusMessage,

    /// Raised while the job is not configured
    unconfigured: bool,
}

impl CronBot {
    pub fn new(client: DiscordClient, channel: ChannelId, config: &Config) -> Self {
        Self {
            client,
            reporter: Reporter::new(config.instance.clone(), config.discord.utc_offset_hours),
            config: config.cron.clone(),
            history_limit: config.discord.history_limit,
            message: StatusMessage::new(channel, CRON_MARKER),
            unconfigured: false,
        }
    }

    pub fn is_alerting(&self) -> bool {
        self.unconfigured
    }

    pub fn message(&self) -> &StatusMessage {
        &self.message
    }

    pub async fn report(&mut self, status: JobStatus) -> Result<CycleReport, CycleError> {
        let unconfigured = !status.is_configured();
        let transition = Transition::between(self.unconfigured, unconfigured);
        self.unconfigured = unconfigured;

        let embed = self.reporter.build_cron_embed(&status, &self.config.keyword);
        let message = MessageBuilder::new().add_embed(embed).build();
        let published = self.message.publish(&self.client, &message).await;

        let notified = if transition.fired() {
            let embed = self.reporter.build_cron_notice_embed(transition, &status);
            let notice = MessageBuilder::new().add_embed(embed).build();
            let sent = self.client.send_message(self.message.channel(), &notice).await;
            if let Err(e) = &sent {
                warn!("failed to send cron notice: {e}");
            }
            sent.map(|_| ())
        } else {
            Ok(())
        };

        published?;
        notified?;

        Ok(CycleReport::new(format!(
            "cron report sent | {} entries | {} running",
            status.entries, status.running
        )))
    }
}

#[async_trait]
impl Cycle for CronBot {
    fn name(&self) -> &str {
        "cron"
    }

    async fn prepare(&mut self) -> Result<(), CycleError> {
        super::recover_handle(&self.client, &mut self.message, self.history_limit).await
    }

    async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let status = collect_job(self.config.file.clone(), self.config.keyword.clone())
            .await
            .map_err(CycleError::Collection)?;

        self.report(status).await
    }
}
