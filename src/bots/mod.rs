//! The four reporting bots. Each one is a [`Cycle`](crate::scheduler::Cycle)
//! driven by the shared scheduler.

mod cron;
mod keepalive;
mod processes;
mod status;

pub use cron::CronBot;
pub use keepalive::KeepaliveBot;
pub use processes::ProcessBot;
pub use status::StatusBot;

use tracing::info;

use crate::discord::DiscordClient;
use crate::scheduler::CycleError;
use crate::status_message::StatusMessage;

/// Resolves the bot user and adopts its last periodic message, if any
pub(crate) async fn recover_handle(
    client: &DiscordClient,
    message: &mut StatusMessage,
    history_limit: u8,
) -> Result<(), CycleError> {
    let me = client.current_user().await?;
    info!("logged in as {} ({})", me.username, me.id.0);

    message.recover(client, &me.id, history_limit).await?;
    Ok(())
}
