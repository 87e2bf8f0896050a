//! Handle of the periodic message a bot keeps editing.
//!
//! ```text
//! publish:  no handle ──send──▶ handle
//!           handle ──edit──▶ handle
//!           handle ──edit fails: unknown message──send──▶ new handle
//! ```
//!
//! On startup the handle can be recovered from channel history so a restart
//! keeps editing the same message instead of posting a new one.

use tracing::{debug, instrument, warn};

use crate::discord::{ChannelId, ChannelMessage, DiscordClient, DiscordError, Message, MessageId, UserId};

#[derive(Debug, Clone)]
pub struct StatusMessage {
    channel: ChannelId,

    /// Substring of the embed title identifying this bot's message
    marker: String,

    current: Option<MessageId>,
}

impl StatusMessage {
    pub fn new(channel: ChannelId, marker: impl Into<String>) -> Self {
        Self {
            channel,
            marker: marker.into(),
            current: None,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn current(&self) -> Option<&MessageId> {
        self.current.as_ref()
    }

    /// Whether a message from history is one this handle should adopt
    pub fn is_own(&self, message: &ChannelMessage, author: &UserId) -> bool {
        &message.author.id == author
            && message.embeds.iter().any(|embed| {
                embed
                    .title
                    .as_deref()
                    .is_some_and(|title| title.contains(&self.marker))
            })
    }

    /// Scans recent history for the newest message of ours carrying the marker
    #[instrument(skip(self, client), fields(channel = %self.channel))]
    pub async fn recover(
        &mut self,
        client: &DiscordClient,
        author: &UserId,
        history_limit: u8,
    ) -> Result<Option<MessageId>, DiscordError> {
        let history = client.recent_messages(self.channel, history_limit).await?;

        let found = history
            .into_iter()
            .find(|message| self.is_own(message, author))
            .map(|message| message.id);

        match &found {
            Some(id) => debug!("recovered status message {id}"),
            None => debug!("no previous status message found"),
        }

        if found.is_some() {
            self.current = found.clone();
        }

        Ok(found)
    }

    /// Edits the current message, or sends a new one when there is none or it vanished
    #[instrument(skip(self, client, message), fields(channel = %self.channel))]
    pub async fn publish(
        &mut self,
        client: &DiscordClient,
        message: &Message,
    ) -> Result<MessageId, DiscordError> {
        if let Some(id) = &self.current {
            match client.edit_message(self.channel, id, message).await {
                Ok(_) => return Ok(id.clone()),
                Err(e) if e.is_missing_message() => {
                    warn!("status message {id} is gone, sending a new one");
                    self.current = None;
                }
                Err(e) => return Err(e),
            }
        }

        let sent = client.send_message(self.channel, message).await?;
        self.current = Some(sent.id.clone());
        Ok(sent.id)
    }
}
