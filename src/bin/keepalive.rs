use std::time::Duration;

use clap::Parser;
use keepwatch::{
    bots::KeepaliveBot,
    discord::DiscordClient,
    scheduler::{Schedule, drive},
    telemetry,
    util::{KEEPALIVE_BOT, bootstrap},
};
use tracing::{info, trace};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); defaults are used without one
    #[arg(short, long)]
    file: Option<String>,

    /// Run the workload once right away instead of waiting for the first delay
    #[arg(long)]
    now: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init(module_path!());
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let (config, credentials) = bootstrap(KEEPALIVE_BOT, args.file.as_deref())?;
    let client = DiscordClient::new(&config.discord.api_base, credentials.token)?;

    let keepalive = &config.keepalive;
    let schedule = Schedule::Random {
        min: Duration::from_secs(keepalive.interval_min),
        max: Duration::from_secs(keepalive.interval_max),
    };
    let initial_delay = if args.now {
        Duration::ZERO
    } else {
        Duration::from_secs(keepalive.initial_delay)
    };

    let bot = KeepaliveBot::new(client, credentials.channel, &config);
    info!(
        "{} workers | sieve {} | hash chain {}",
        bot.plan().workers,
        bot.plan().sieve_limit,
        bot.plan().hash_iterations
    );

    drive(bot, schedule, initial_delay).await;

    Ok(())
}
