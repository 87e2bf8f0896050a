use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the compact stderr logger for the library and the calling binary.
///
/// `binary` is the binary's tracing target, i.e. its crate name with
/// underscores (`keepwatch_status`).
pub fn init(binary: &'static str) {
    let filter = filter::Targets::new().with_targets(vec![
        ("keepwatch", LevelFilter::DEBUG),
        (binary, LevelFilter::TRACE),
    ]);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}
