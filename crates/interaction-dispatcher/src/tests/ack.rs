//! Deferred acknowledgment goes out before any handler work.

use super::harness::*;
use crate::InteractionState;
use axum::http::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn command_is_acknowledged_with_deferred_response() {
    let bot = TestBot::new(&[("version", Script::Reply("v1".into()))]);
    let mut settled = bot.subscribe();

    let (status, body) = bot.send(signed_request(&command_body("1", "version"))).await;
    let body: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"type": 5}));
    assert_eq!(next_settled(&mut settled).await.state, InteractionState::Responded);
}

#[tokio::test]
async fn handler_waits_until_ack_body_is_taken() {
    let bot = TestBot::new(&[("version", Script::Reply("v1".into()))]);
    let mut settled = bot.subscribe();

    let response = bot.call(signed_request(&command_body("1", "version"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    settle_briefly().await;
    assert_eq!(bot.total_handler_calls(), 0);
    assert!(bot.log.events().is_empty());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], br#"{"type":5}"#);

    next_settled(&mut settled).await;
    assert_eq!(bot.log.events(), ["handler", "followup"]);
}

#[tokio::test]
async fn dropped_ack_still_releases_handler() {
    let bot = TestBot::new(&[("version", Script::Reply("v1".into()))]);
    let mut settled = bot.subscribe();

    drop(bot.call(signed_request(&command_body("1", "version"))).await);

    assert_eq!(next_settled(&mut settled).await.state, InteractionState::Responded);
    assert_eq!(bot.handler("version").calls(), 1);
}

#[tokio::test]
async fn followup_uses_the_interaction_token() {
    let bot = TestBot::new(&[("version", Script::Reply("v1".into()))]);
    let mut settled = bot.subscribe();

    bot.send(signed_request(&command_body("abc", "version"))).await;
    next_settled(&mut settled).await;

    let sent = bot.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].token, "token-abc");
}

#[tokio::test]
async fn concurrent_interactions_are_independent() {
    let bot = TestBot::new(&[
        ("version", Script::Reply("v1".into())),
        ("broken", Script::Fail),
    ]);
    let mut settled = bot.subscribe();

    let (a, b) = tokio::join!(
        bot.send(signed_request(&command_body("1", "version"))),
        bot.send(signed_request(&command_body("2", "broken"))),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    let mut outcomes = vec![next_settled(&mut settled).await, next_settled(&mut settled).await];
    outcomes.sort_by(|x, y| x.interaction_id.cmp(&y.interaction_id));
    assert_eq!(outcomes[0].state, InteractionState::Responded);
    assert_eq!(outcomes[1].state, InteractionState::Escalated);
    assert_eq!(bot.alerts.alerts().len(), 1);
}
