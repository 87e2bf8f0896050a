//! Request shapes and error classification of the REST client

use assert_matches::assert_matches;
use keepwatch::discord::{DiscordError, EmbedField, MessageBuilder, MessageId, Embed};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn sample_message() -> keepwatch::discord::Message {
    MessageBuilder::new()
        .content("hello")
        .add_embed(Embed {
            title: Some("Title".to_string()),
            fields: vec![EmbedField::new("Name", "Value", true)],
            ..Embed::default()
        })
        .build()
}

#[tokio::test]
async fn test_send_message_posts_json_with_bot_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .and(header("authorization", "Bot test-token"))
        .and(body_partial_json(serde_json::json!({
            "content": "hello",
            "embeds": [{ "title": "Title", "fields": [{ "name": "Name", "value": "Value", "inline": true }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("555", BOT_USER, Some("Title"))))
        .expect(1)
        .mount(&server)
        .await;

    let sent = client_for(&server)
        .send_message(CHANNEL, &sample_message())
        .await
        .unwrap();

    assert_eq!(sent.id, MessageId("555".to_string()));
    assert_eq!(sent.embeds[0].title.as_deref(), Some("Title"));
}

#[tokio::test]
async fn test_edit_message_patches_message_route() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/channels/42/messages/555"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("555", BOT_USER, Some("Title"))))
        .expect(1)
        .mount(&server)
        .await;

    let edited = client_for(&server)
        .edit_message(CHANNEL, &MessageId("555".to_string()), &sample_message())
        .await
        .unwrap();

    assert_eq!(edited.id.0, "555");
}

#[tokio::test]
async fn test_unknown_channel_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "message": "Unknown Channel", "code": 10003 })),
        )
        .mount(&server)
        .await;

    let result = client_for(&server).send_message(CHANNEL, &sample_message()).await;

    assert_matches!(result, Err(DiscordError::UnknownChannel(channel)) if channel == CHANNEL);
}

#[tokio::test]
async fn test_unknown_message_code() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/channels/42/messages/9"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "message": "Unknown Message", "code": 10008 })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .edit_message(CHANNEL, &MessageId("9".to_string()), &sample_message())
        .await
        .unwrap_err();

    assert!(err.is_missing_message());
    assert_matches!(err, DiscordError::UnknownMessage(MessageId(id)) if id == "9");
}

#[tokio::test]
async fn test_bare_404_on_message_route_is_missing_message() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/channels/42/messages/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .edit_message(CHANNEL, &MessageId("9".to_string()), &sample_message())
        .await
        .unwrap_err();

    assert!(err.is_missing_message());
}

#[tokio::test]
async fn test_server_error_keeps_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(serde_json::json!({ "message": "Missing Access", "code": 50001 })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .send_message(CHANNEL, &sample_message())
        .await
        .unwrap_err();

    assert_matches!(
        err,
        DiscordError::Api { status: 403, code: Some(50001), ref message } if message == "Missing Access"
    );
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{invalid json"))
        .mount(&server)
        .await;

    let result = client_for(&server).send_message(CHANNEL, &sample_message()).await;

    assert_matches!(result, Err(DiscordError::Decode(_)));
}

#[tokio::test]
async fn test_recent_messages_sends_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/42/messages"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            message_json("3", BOT_USER, Some("newest")),
            message_json("2", "77", None),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let history = client_for(&server).recent_messages(CHANNEL, 50).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id.0, "3");
    assert!(history[1].embeds.is_empty());
}

#[tokio::test]
async fn test_current_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": BOT_USER, "username": "keepwatch", "bot": true })),
        )
        .mount(&server)
        .await;

    let me = client_for(&server).current_user().await.unwrap();

    assert_eq!(me.id.0, BOT_USER);
    assert_eq!(me.username, "keepwatch");
}
