//! Helper functions for integration tests

use std::time::Instant;

use keepwatch::{
    CpuOverview, DiskInformation, HostSnapshot, MemoryInformation, NetCounters,
    config::Config,
    discord::{ChannelId, DiscordClient},
};
use wiremock::{MockServer, Request};

pub const CHANNEL: ChannelId = ChannelId(42);
pub const BOT_USER: &str = "1000";

const GB: u64 = 1024 * 1024 * 1024;

pub fn client_for(server: &MockServer) -> DiscordClient {
    DiscordClient::new(server.uri(), "test-token").unwrap()
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.instance.name = "test-instance".to_string();
    config.cron.keyword = "backup.sh".to_string();
    config
}

/// A channel message as Discord returns it
pub fn message_json(id: &str, author: &str, title: Option<&str>) -> serde_json::Value {
    let embeds = match title {
        Some(title) => serde_json::json!([{ "title": title }]),
        None => serde_json::json!([]),
    };

    serde_json::json!({
        "id": id,
        "channel_id": CHANNEL.0.to_string(),
        "author": { "id": author, "username": "keepwatch", "bot": true },
        "content": "",
        "embeds": embeds,
    })
}

pub fn host_snapshot(cpu: f32, disk_used_percent: u64, counters: NetCounters, taken_at: Instant) -> HostSnapshot {
    let disk_total = 100 * GB;

    HostSnapshot {
        host_name: Some("test-host".to_string()),
        cpus: CpuOverview {
            average_usage: cpu,
            per_core: vec![cpu, cpu],
        },
        memory: MemoryInformation {
            total: 16 * GB,
            used: 4 * GB,
            total_swap: 0,
            used_swap: 0,
        },
        disk: DiskInformation {
            mount_point: "/".to_string(),
            total: disk_total,
            available: disk_total - disk_used_percent * GB,
        },
        net_counters: counters,
        uptime_seconds: 3_600,
        taken_at,
    }
}

/// Requests the mock server has seen so far, as `(method, path, body)`
pub async fn received(server: &MockServer) -> Vec<(String, String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request: &Request| {
            (
                request.method.to_string(),
                request.url.path().to_string(),
                String::from_utf8_lossy(&request.body).into_owned(),
            )
        })
        .collect()
}
