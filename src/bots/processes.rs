use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::discord::{ChannelId, DiscordClient, MessageBuilder};
use crate::monitors::processes::{ProcessSnapshot, collect_processes};
use crate::report::{PROCESS_MARKER, Reporter};
use crate::scheduler::{Cycle, CycleError, CycleReport};
use crate::status_message::StatusMessage;

/// Top processes and load averages, edited in place
pub struct ProcessBot {
    client: DiscordClient,
    reporter: Reporter,
    top: usize,
    window: Duration,
    history_limit: u8,
    message: StatusMessage,
}

impl ProcessBot {
    pub fn new(client: DiscordClient, channel: ChannelId, config: &Config) -> Self {
        Self {
            client,
            reporter: Reporter::new(config.instance.clone(), config.discord.utc_offset_hours),
            top: config.processes.top,
            window: Duration::from_millis(config.processes.cpu_window_ms),
            history_limit: config.discord.history_limit,
            message: StatusMessage::new(channel, PROCESS_MARKER),
        }
    }

    pub fn message(&self) -> &StatusMessage {
        &self.message
    }

    pub async fn report(&mut self, snapshot: ProcessSnapshot) -> Result<CycleReport, CycleError> {
        let embed = self.reporter.build_process_embed(&snapshot);
        let message = MessageBuilder::new().add_embed(embed).build();
        self.message.publish(&self.client, &message).await?;

        Ok(CycleReport::new(format!(
            "process report sent | {} processes | load {:.2} {:.2} {:.2}",
            snapshot.total, snapshot.load.one, snapshot.load.five, snapshot.load.fifteen
        )))
    }
}

#[async_trait]
impl Cycle for ProcessBot {
    fn name(&self) -> &str {
        "processes"
    }

    async fn prepare(&mut self) -> Result<(), CycleError> {
        super::recover_handle(&self.client, &mut self.message, self.history_limit).await
    }

    async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let snapshot = collect_processes(self.top, self.window)
            .await
            .map_err(CycleError::Collection)?;

        self.report(snapshot).await
    }
}
