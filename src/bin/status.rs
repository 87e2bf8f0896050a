use std::time::Duration;

use clap::Parser;
use keepwatch::{
    bots::StatusBot,
    discord::DiscordClient,
    scheduler::{Schedule, drive},
    telemetry,
    util::{STATUS_BOT, bootstrap},
};
use tracing::trace;

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); defaults are used without one
    #[arg(short, long)]
    file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init(module_path!());
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let (config, credentials) = bootstrap(STATUS_BOT, args.file.as_deref())?;
    let client = DiscordClient::new(&config.discord.api_base, credentials.token)?;

    let schedule = Schedule::Every(Duration::from_secs(config.status.interval));
    let bot = StatusBot::new(client, credentials.channel, &config);

    drive(bot, schedule, Duration::ZERO).await;

    Ok(())
}
