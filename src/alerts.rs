use tracing::{error, info, instrument};

use crate::discord::{ChannelId, DiscordClient, DiscordError, MessageBuilder, MessageId};
use crate::monitors::resources::{AlertNotice, Transition};
use crate::report::Reporter;

/// Posts alert and recovery notices as new messages
#[derive(Debug, Clone)]
pub struct AlertNotifier {
    client: DiscordClient,
    channel: ChannelId,
    reporter: Reporter,

    /// Prepended to raise notices only
    mention: String,
}

impl AlertNotifier {
    pub fn new(client: DiscordClient, channel: ChannelId, reporter: Reporter, mention: impl Into<String>) -> Self {
        Self {
            client,
            channel,
            reporter,
            mention: mention.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn send_notice(&self, notice: &AlertNotice) -> Result<MessageId, DiscordError> {
        let embed = self.reporter.build_alert_embed(notice);
        let mut builder = MessageBuilder::new().add_embed(embed);

        if notice.transition == Transition::Raised && !self.mention.is_empty() {
            builder = builder.content(format!(
                "{} {} ~ {:.1}{}",
                self.mention,
                notice.category.label(),
                notice.value,
                notice.category.unit()
            ));
        }

        let sent = self.client.send_message(self.channel, &builder.build()).await?;
        info!("sent {:?} notice for {:?}", notice.transition, notice.category);
        Ok(sent.id)
    }

    /// Sends every notice independently; returns the first failure after trying all
    pub async fn send_all(&self, notices: &[AlertNotice]) -> Result<usize, DiscordError> {
        let mut first_error = None;
        let mut sent = 0;

        for notice in notices {
            match self.send_notice(notice).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    error!("failed to send {:?} notice: {e}", notice.category);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(sent),
        }
    }
}
