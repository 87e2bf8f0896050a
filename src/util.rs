use tracing::{debug, error, info};

use crate::config::{Config, ConfigError, load_config};
use crate::discord::ChannelId;

/// Environment variable pair a bot reads its credentials from
#[derive(Debug, Clone, Copy)]
pub struct CredentialVars {
    pub token: &'static str,
    pub channel: &'static str,
}

pub const STATUS_BOT: CredentialVars = CredentialVars {
    token: "DISCORD_BOT_TOKEN",
    channel: "MONITOR_CHANNEL_ID",
};

pub const KEEPALIVE_BOT: CredentialVars = CredentialVars {
    token: "CPU_BOT_TOKEN",
    channel: "CPU_CHANNEL_ID",
};

pub const PROCESS_BOT: CredentialVars = CredentialVars {
    token: "PROCESS_BOT_TOKEN",
    channel: "PROCESS_CHANNEL_ID",
};

pub const CRON_BOT: CredentialVars = CredentialVars {
    token: "CRON_BOT_TOKEN",
    channel: "CRON_CHANNEL_ID",
};

#[derive(Clone)]
pub struct Credentials {
    pub token: String,
    pub channel: ChannelId,
}

// keeps the token out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("channel", &self.channel)
            .finish()
    }
}

impl Credentials {
    pub fn from_env(vars: CredentialVars) -> Result<Credentials, ConfigError> {
        Self::from_lookup(vars, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(vars: CredentialVars, lookup: F) -> Result<Credentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(vars.token)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingVar(vars.token))?;

        let raw_channel = lookup(vars.channel)
            .map(|channel| channel.trim().to_string())
            .filter(|channel| !channel.is_empty())
            .ok_or(ConfigError::MissingVar(vars.channel))?;

        let channel = match raw_channel.parse::<u64>() {
            Ok(id) if id != 0 => ChannelId(id),
            _ => {
                return Err(ConfigError::InvalidChannel {
                    var: vars.channel,
                    value: raw_channel,
                });
            }
        };

        Ok(Credentials { token, channel })
    }
}

/// Common startup of every bot binary: `.env`, config file, credentials.
///
/// Errors are logged here so each binary only has to propagate them.
pub fn bootstrap(vars: CredentialVars, config_file: Option<&str>) -> anyhow::Result<(Config, Credentials)> {
    if let Err(e) = dotenv::dotenv() {
        debug!("no .env file loaded: {e}");
    }

    let config = load_config(config_file).inspect_err(|e| error!("{e}"))?;
    let credentials = Credentials::from_env(vars).inspect_err(|e| error!("{e}"))?;
    info!("configuration loaded for {} (channel {})", config.instance.name, credentials.channel);

    Ok((config, credentials))
}
