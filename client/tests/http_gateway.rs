//! `HttpGateway` routes and error mapping against a mock HTTP server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use serde_json::json;
use wappu_client::config::ApiConfig;
use wappu_client::error::GatewayError;
use wappu_client::gateway::{Gateway, HttpGateway, PutUserParams, VoteParams};
use wappu_client::types::EntityId;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(&ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn fetch_models_gets_the_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
        .expect(1)
        .mount(&server)
        .await;

    let items = gateway(&server).fetch_models("feed").await.unwrap();

    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn put_user_sends_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/device-1"))
        .and(body_json(json!({ "uuid": "device-1", "name": "Teemu", "team": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let body = gateway(&server)
        .put_user(PutUserParams {
            uuid: "device-1".to_string(),
            name: "Teemu".to_string(),
            info: None,
            team: Some(EntityId::Number(5)),
            profile_picture: None,
            image_data: None,
        })
        .await
        .unwrap();

    assert_eq!(body, json!({ "id": 42 }));
}

#[tokio::test]
async fn empty_put_response_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/device-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body = gateway(&server)
        .put_user(PutUserParams {
            uuid: "device-1".to_string(),
            name: "Teemu".to_string(),
            info: None,
            team: None,
            profile_picture: None,
            image_data: None,
        })
        .await
        .unwrap();

    assert!(body.is_null());
}

#[tokio::test]
async fn get_user_and_profile_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/device-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "name": "Teemu", "team": 5 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/42/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Teemu",
            "numSimas": 3,
            "images": [{ "id": "p1", "type": "IMAGE", "votes": "4" }]
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let user = gateway.get_user("device-1".to_string()).await.unwrap();
    let profile = gateway.get_user_profile(user.id.clone()).await.unwrap();

    assert_eq!(user.team, Some(EntityId::Number(5)));
    assert_eq!(profile.name.as_deref(), Some("Teemu"));
    assert_eq!(profile.images[0].votes, 4);
}

#[tokio::test]
async fn put_vote_route() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/votes"))
        .and(body_json(json!({ "feedItemId": "p1", "value": 1 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server)
        .put_vote(VoteParams {
            feed_item_id: EntityId::from("p1"),
            value: 1,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn error_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/nobody"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .mount(&server)
        .await;

    let error = gateway(&server).get_user("nobody".to_string()).await.unwrap_err();

    assert_eq!(
        error,
        GatewayError::Status {
            status: 404,
            message: "no such user".to_string(),
        }
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let error = gateway(&server).fetch_models("apps").await.unwrap_err();

    assert!(matches!(error, GatewayError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_request_failure() {
    let server = MockServer::start().await;
    let gateway = gateway(&server);
    drop(server);

    let error = gateway.fetch_models("apps").await.unwrap_err();

    assert!(matches!(error, GatewayError::RequestFailed(_)));
}
