use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::AUTHORIZATION};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, instrument, trace};

/// JSON error code Discord returns for a channel that does not exist or is not visible
const UNKNOWN_CHANNEL: u64 = 10003;

/// Longest embed field value Discord accepts, in characters
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// JSON error code Discord returns for a deleted or foreign message
const UNKNOWN_MESSAGE: u64 = 10008;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl ToString, value: impl ToString, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            inline,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

/// A message as returned by the channel endpoints.
///
/// Only the parts needed to find our own status message are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub author: Author,
    #[serde(default)]
    pub embeds: Vec<ReceivedEmbed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub id: UserId,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedEmbed {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

/// Errors returned by [`DiscordClient`]
#[derive(Debug)]
pub enum DiscordError {
    /// The channel does not exist or the bot cannot see it
    UnknownChannel(ChannelId),

    /// The message to edit has been deleted
    UnknownMessage(MessageId),

    /// Any other non-success response
    Api {
        status: u16,
        code: Option<u64>,
        message: String,
    },

    /// Connection, TLS or timeout failure
    Transport(reqwest::Error),

    /// A success response whose body could not be decoded
    Decode(String),
}

impl DiscordError {
    /// Whether the edit target is gone and a fresh message should be sent instead
    pub fn is_missing_message(&self) -> bool {
        matches!(self, DiscordError::UnknownMessage(_))
    }
}

impl fmt::Display for DiscordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscordError::UnknownChannel(channel) => write!(f, "unknown channel {channel}"),
            DiscordError::UnknownMessage(message) => write!(f, "unknown message {message}"),
            DiscordError::Api {
                status,
                code,
                message,
            } => match code {
                Some(code) => write!(f, "Discord API error {status} (code {code}): {message}"),
                None => write!(f, "Discord API error {status}: {message}"),
            },
            DiscordError::Transport(err) => write!(f, "request to Discord failed: {err}"),
            DiscordError::Decode(msg) => write!(f, "unexpected Discord response: {msg}"),
        }
    }
}

impl std::error::Error for DiscordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscordError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DiscordError {
    fn from(err: reqwest::Error) -> Self {
        DiscordError::Transport(err)
    }
}

/// Minimal Discord REST client authenticated as a bot user
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: String,
    token: String,
}

impl fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("keepwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bot {}", self.token))
    }

    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<CurrentUser, DiscordError> {
        let request = self.authorized(self.client.get(self.url("/users/@me")));
        let response = request.send().await?;
        let response = check(response, None, None).await?;
        decode(response).await
    }

    #[instrument(skip(self, message))]
    pub async fn send_message(
        &self,
        channel: ChannelId,
        message: &Message,
    ) -> Result<ChannelMessage, DiscordError> {
        let url = self.url(&format!("/channels/{channel}/messages"));
        let response = self
            .authorized(self.client.post(url))
            .json(message)
            .send()
            .await?;

        let response = check(response, Some(channel), None).await?;
        let sent: ChannelMessage = decode(response).await?;
        debug!("sent message {}", sent.id);
        Ok(sent)
    }

    #[instrument(skip(self, message))]
    pub async fn edit_message(
        &self,
        channel: ChannelId,
        id: &MessageId,
        message: &Message,
    ) -> Result<ChannelMessage, DiscordError> {
        let url = self.url(&format!("/channels/{channel}/messages/{id}"));
        let response = self
            .authorized(self.client.patch(url))
            .json(message)
            .send()
            .await?;

        let response = check(response, Some(channel), Some(id)).await?;
        let edited: ChannelMessage = decode(response).await?;
        trace!("edited message {}", edited.id);
        Ok(edited)
    }

    /// Most recent messages of a channel, newest first
    #[instrument(skip(self))]
    pub async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, DiscordError> {
        let limit = limit.clamp(1, 100);
        let url = self.url(&format!("/channels/{channel}/messages"));
        let response = self
            .authorized(self.client.get(url))
            .query(&[("limit", limit)])
            .send()
            .await?;

        let response = check(response, Some(channel), None).await?;
        decode(response).await
    }
}

async fn check(
    response: Response,
    channel: Option<ChannelId>,
    message: Option<&MessageId>,
) -> Result<Response, DiscordError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ApiErrorBody>(&text).ok();
    let code = body.as_ref().and_then(|body| body.code);

    if status == StatusCode::NOT_FOUND {
        match (code, channel, message) {
            (Some(UNKNOWN_CHANNEL), Some(channel), _) => {
                return Err(DiscordError::UnknownChannel(channel));
            }
            (Some(UNKNOWN_MESSAGE) | None, _, Some(message)) => {
                return Err(DiscordError::UnknownMessage(message.clone()));
            }
            (None, Some(channel), None) => {
                return Err(DiscordError::UnknownChannel(channel));
            }
            _ => {}
        }
    }

    error!("Discord request failed with status: {status}");
    let message = body
        .and_then(|body| body.message)
        .unwrap_or_else(|| text.chars().take(200).collect());

    Err(DiscordError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DiscordError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| DiscordError::Decode(e.to_string()))
}
