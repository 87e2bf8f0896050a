use std::time::Duration;

use async_trait::async_trait;

use crate::alerts::AlertNotifier;
use crate::config::{Config, StatusConfig};
use crate::discord::{ChannelId, DiscordClient, MessageBuilder};
use crate::monitors::host::{NetBaseline, collect_host};
use crate::monitors::resources::{AlertSample, AlertState};
use crate::report::{Reporter, STATUS_MARKER};
use crate::scheduler::{Cycle, CycleError, CycleReport};
use crate::status_message::StatusMessage;
use crate::{HostSnapshot, SystemStats};

/// Host status report, edited in place, plus edge-triggered alerts
pub struct StatusBot {
    client: DiscordClient,
    reporter: Reporter,
    config: StatusConfig,
    history_limit: u8,

    message: StatusMessage,
    notifier: AlertNotifier,
    baseline: NetBaseline,
    alerts: AlertState,
}

impl StatusBot {
    pub fn new(client: DiscordClient, channel: ChannelId, config: &Config) -> Self {
        let reporter = Reporter::new(config.instance.clone(), config.discord.utc_offset_hours);
        let notifier = AlertNotifier::new(
            client.clone(),
            channel,
            reporter.clone(),
            config.status.mention.clone(),
        );

        Self {
            client,
            reporter,
            config: config.status.clone(),
            history_limit: config.discord.history_limit,
            message: StatusMessage::new(channel, STATUS_MARKER),
            notifier,
            baseline: NetBaseline::new(),
            alerts: AlertState::default(),
        }
    }

    pub fn alerts(&self) -> &AlertState {
        &self.alerts
    }

    pub fn message(&self) -> &StatusMessage {
        &self.message
    }

    /// Formats and delivers one snapshot: status report first, then every alert notice
    pub async fn report(&mut self, snapshot: HostSnapshot) -> Result<CycleReport, CycleError> {
        let network = self.baseline.advance(snapshot.net_counters, snapshot.taken_at);
        let stats = SystemStats::new(snapshot, network);

        let embed = self.reporter.build_status_embed(&stats, &self.config.warn);
        let message = MessageBuilder::new().add_embed(embed).build();

        let sample = AlertSample {
            cpu_percent: stats.cpus.average_usage,
            disk_percent: stats.disk.percent(),
            net_recv_kb: stats.network.recv_kb,
            net_sent_kb: stats.network.sent_kb,
        };
        let notices = self.alerts.observe(&sample, &self.config.alert);

        let published = self.message.publish(&self.client, &message).await;
        let notified = self.notifier.send_all(&notices).await;

        published?;
        let sent = notified?;

        Ok(CycleReport::new(format!(
            "report sent | CPU: {:.1}% MEM: {:.1}% DISK: {:.1}% NET: ↓{:.1} ↑{:.1} KB/s | {sent} notices",
            sample.cpu_percent,
            stats.memory.percent(),
            sample.disk_percent,
            sample.net_recv_kb,
            sample.net_sent_kb,
        )))
    }
}

#[async_trait]
impl Cycle for StatusBot {
    fn name(&self) -> &str {
        "status"
    }

    async fn prepare(&mut self) -> Result<(), CycleError> {
        super::recover_handle(&self.client, &mut self.message, self.history_limit).await
    }

    async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let window = Duration::from_millis(self.config.cpu_window_ms);
        let snapshot = collect_host(self.config.mount_point.clone(), window)
            .await
            .map_err(CycleError::Collection)?;

        self.report(snapshot).await
    }
}
