//! Full cycles of each bot against the mocked API

use std::path::PathBuf;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use keepwatch::NetCounters;
use keepwatch::bots::{CronBot, KeepaliveBot, ProcessBot, StatusBot};
use keepwatch::monitors::cron::JobStatus;
use keepwatch::monitors::processes::{LoadAverage, ProcessInfo, ProcessSnapshot};
use keepwatch::monitors::resources::AlertCategory;
use keepwatch::scheduler::{Cycle, CycleError, tick};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

async fn mount_send(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json(id, BOT_USER, None)))
        .mount(server)
        .await;
}

async fn mount_edit(server: &MockServer, id: &str) {
    Mock::given(method("PATCH"))
        .and(path(format!("/channels/42/messages/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json(id, BOT_USER, None)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_status_bot_raises_then_clears_cpu_alert() {
    let server = MockServer::start().await;
    mount_send(&server, "100").await;
    mount_edit(&server, "100").await;

    let mut bot = StatusBot::new(client_for(&server), CHANNEL, &test_config());
    let start = Instant::now();
    let counters = NetCounters {
        received: 1_000_000,
        sent: 500_000,
    };

    bot.report(host_snapshot(90.0, 20, counters, start)).await.unwrap();
    assert!(bot.alerts().is_alerting(AlertCategory::Cpu));
    assert!(!bot.alerts().is_alerting(AlertCategory::Disk));

    let requests = received(&server).await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, "POST");
    assert!(requests[0].2.contains("System Monitor"));
    assert!(requests[1].2.contains("CPU usage alert"));
    assert!(requests[1].2.contains("@here"));

    bot.report(host_snapshot(10.0, 20, counters, start + Duration::from_secs(10)))
        .await
        .unwrap();
    assert!(!bot.alerts().is_alerting(AlertCategory::Cpu));

    let requests = received(&server).await;
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[2].0, "PATCH");
    assert_eq!(requests[2].1, "/channels/42/messages/100");
    assert!(requests[3].2.contains("CPU usage recovered"));
    assert!(!requests[3].2.contains("@here"));
}

#[tokio::test]
async fn test_status_bot_steady_state_sends_no_notices() {
    let server = MockServer::start().await;
    mount_send(&server, "100").await;
    mount_edit(&server, "100").await;

    let mut bot = StatusBot::new(client_for(&server), CHANNEL, &test_config());
    let start = Instant::now();

    for cycle in 0..3u64 {
        let counters = NetCounters {
            received: cycle * 1024,
            sent: cycle * 1024,
        };
        let report = bot
            .report(host_snapshot(5.0, 20, counters, start + Duration::from_secs(cycle * 10)))
            .await
            .unwrap();
        assert!(report.summary.contains("0 notices"));
    }

    let requests = received(&server).await;
    let methods: Vec<&str> = requests.iter().map(|r| r.0.as_str()).collect();
    assert_eq!(methods, vec!["POST", "PATCH", "PATCH"]);
}

#[tokio::test]
async fn test_status_bot_network_spike_alerts_both_directions() {
    let server = MockServer::start().await;
    mount_send(&server, "100").await;
    mount_edit(&server, "100").await;

    let mut bot = StatusBot::new(client_for(&server), CHANNEL, &test_config());
    let start = Instant::now();

    bot.report(host_snapshot(5.0, 20, NetCounters::default(), start))
        .await
        .unwrap();

    // 200 MiB each way over 10 s is 20480 KB/s
    let spike = NetCounters {
        received: 200 * 1024 * 1024,
        sent: 200 * 1024 * 1024,
    };
    bot.report(host_snapshot(5.0, 20, spike, start + Duration::from_secs(10)))
        .await
        .unwrap();

    assert!(bot.alerts().is_alerting(AlertCategory::NetReceive));
    assert!(bot.alerts().is_alerting(AlertCategory::NetSend));
    assert_eq!(received(&server).await.len(), 4);
}

#[tokio::test]
async fn test_unknown_channel_is_reported_as_skip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "message": "Unknown Channel", "code": 10003 })),
        )
        .mount(&server)
        .await;

    let mut bot = ProcessBot::new(client_for(&server), CHANNEL, &test_config());
    let snapshot = ProcessSnapshot {
        processes: vec![],
        total: 0,
        load: LoadAverage::default(),
    };

    let result = bot.report(snapshot).await;

    assert_matches!(result, Err(CycleError::ChannelNotFound(channel)) if channel == CHANNEL);
    assert!(bot.message().current().is_none());
}

#[tokio::test]
async fn test_process_bot_publishes_table() {
    let server = MockServer::start().await;
    mount_send(&server, "300").await;

    let mut bot = ProcessBot::new(client_for(&server), CHANNEL, &test_config());
    let snapshot = ProcessSnapshot {
        processes: vec![ProcessInfo {
            pid: 4242,
            name: "postgres".to_string(),
            user: Some("postgres".to_string()),
            cpu_usage: 37.5,
            memory: 512 * 1024 * 1024,
        }],
        total: 118,
        load: LoadAverage {
            one: 0.5,
            five: 0.25,
            fifteen: 0.125,
        },
    };

    let report = bot.report(snapshot).await.unwrap();

    assert!(report.summary.contains("118 processes"));
    let requests = received(&server).await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].2.contains("Process Report"));
    assert!(requests[0].2.contains("4242"));
}

#[tokio::test]
async fn test_cron_bot_notifies_on_edges_only() {
    let server = MockServer::start().await;
    mount_send(&server, "400").await;
    mount_edit(&server, "400").await;

    let mut bot = CronBot::new(client_for(&server), CHANNEL, &test_config());
    let missing = JobStatus {
        file: PathBuf::from("/etc/cron.d/keepwatch-job"),
        file_exists: false,
        entries: 0,
        running: 0,
    };
    let configured = JobStatus {
        file_exists: true,
        entries: 1,
        ..missing.clone()
    };

    bot.report(missing.clone()).await.unwrap();
    assert!(bot.is_alerting());
    bot.report(missing).await.unwrap();
    bot.report(configured).await.unwrap();
    assert!(!bot.is_alerting());

    let requests = received(&server).await;
    let methods: Vec<&str> = requests.iter().map(|r| r.0.as_str()).collect();
    // report, raise, report, report, clear
    assert_eq!(methods, vec!["POST", "POST", "PATCH", "PATCH", "POST"]);
    assert!(requests[1].2.contains("Cron job not configured"));
    assert!(requests[4].2.contains("Cron job configured again"));
}

#[tokio::test]
async fn test_cron_bot_reads_job_file() {
    let server = MockServer::start().await;
    mount_send(&server, "400").await;

    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("keepwatch-job");
    std::fs::write(&job, "SHELL=/bin/sh\n*/5 * * * * root /opt/backup.sh\n").unwrap();

    let mut config = test_config();
    config.cron.file = job;
    let mut bot = CronBot::new(client_for(&server), CHANNEL, &config);

    let report = tick(&mut bot).await.unwrap();

    assert!(report.summary.contains("1 entries"));
    assert!(!bot.is_alerting());
    assert_eq!(received(&server).await.len(), 1);
}

#[tokio::test]
async fn test_keepalive_bot_runs_and_publishes() {
    let server = MockServer::start().await;
    mount_send(&server, "500").await;

    let mut config = test_config();
    config.keepalive.sieve_limit = 30;
    config.keepalive.hash_iterations = 5;
    config.keepalive.workers = Some(2);

    let mut bot = KeepaliveBot::new(client_for(&server), CHANNEL, &config);
    let report = bot.run_cycle().await.unwrap();

    assert!(report.summary.contains("10 primes"));
    assert_eq!(bot.message().current().map(|id| id.0.as_str()), Some("500"));

    let requests = received(&server).await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].2.contains("CPU Workload"));
}

#[tokio::test]
async fn test_prepare_recovers_previous_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": BOT_USER, "username": "keepwatch" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            message_json("61", BOT_USER, Some("📋 test-instance Process Report")),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut bot = ProcessBot::new(client_for(&server), CHANNEL, &test_config());
    bot.prepare().await.unwrap();

    assert_eq!(bot.message().current().map(|id| id.0.as_str()), Some("61"));
}
