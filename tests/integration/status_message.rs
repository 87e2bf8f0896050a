//! Edit-in-place handle: recovery from history and send fallback

use keepwatch::discord::{MessageBuilder, MessageId, UserId};
use keepwatch::status_message::StatusMessage;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn status_update() -> keepwatch::discord::Message {
    MessageBuilder::new().content("update").build()
}

#[tokio::test]
async fn test_first_publish_sends_then_edits() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("100", BOT_USER, None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/channels/42/messages/100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("100", BOT_USER, None)))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut handle = StatusMessage::new(CHANNEL, "System Monitor");

    for _ in 0..3 {
        let id = handle.publish(&client, &status_update()).await.unwrap();
        assert_eq!(id, MessageId("100".to_string()));
    }
}

#[tokio::test]
async fn test_deleted_message_falls_back_to_send() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            message_json("7", BOT_USER, Some("✅ test System Monitor")),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/channels/42/messages/7"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "message": "Unknown Message", "code": 10008 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("8", BOT_USER, None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/channels/42/messages/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("8", BOT_USER, None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut handle = StatusMessage::new(CHANNEL, "System Monitor");
    handle
        .recover(&client, &UserId(BOT_USER.to_string()), 50)
        .await
        .unwrap();
    assert_eq!(handle.current(), Some(&MessageId("7".to_string())));

    let id = handle.publish(&client, &status_update()).await.unwrap();
    assert_eq!(id, MessageId("8".to_string()));

    // the fresh message is the one edited from now on
    let id = handle.publish(&client, &status_update()).await.unwrap();
    assert_eq!(id, MessageId("8".to_string()));
}

#[tokio::test]
async fn test_recover_picks_newest_own_marked_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/42/messages"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            message_json("9", "77", Some("✅ other System Monitor")),
            message_json("8", BOT_USER, Some("🚨 CPU usage alert")),
            message_json("7", BOT_USER, Some("⚠️ test System Monitor")),
            message_json("3", BOT_USER, Some("✅ test System Monitor")),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut handle = StatusMessage::new(CHANNEL, "System Monitor");

    let found = handle
        .recover(&client, &UserId(BOT_USER.to_string()), 50)
        .await
        .unwrap();

    assert_eq!(found, Some(MessageId("7".to_string())));
    assert_eq!(handle.current(), Some(&MessageId("7".to_string())));
}

#[tokio::test]
async fn test_recover_without_match_keeps_handle_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut handle = StatusMessage::new(CHANNEL, "System Monitor");

    let found = handle
        .recover(&client, &UserId(BOT_USER.to_string()), 50)
        .await
        .unwrap();

    assert_eq!(found, None);
    assert_eq!(handle.current(), None);
}
