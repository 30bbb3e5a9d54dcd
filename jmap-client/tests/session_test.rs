//! Integration tests for session bootstrap and caching

mod common;

use common::*;
use jmap_client::{Client, HttpMethod};
use jmap_core::{Error, ProblemType};
use serde_json::{json, Map, Value};

type TestClient = Client<MockServer, Map<String, Value>>;

#[tokio::test]
async fn test_session_fetched_lazily_once() {
    let server = MockServer::new();
    let client: TestClient = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    assert!(client.cached_session().await.is_none());
    assert_eq!(server.session_fetches().await, 0);

    let first = client.session().await.unwrap();
    let second = client.session().await.unwrap();

    assert_eq!(first.state, "s1");
    assert_eq!(first.api_url, API_URL);
    assert_eq!(first.core.max_calls_in_request.0, 16);
    assert_eq!(second.state, first.state);
    assert_eq!(server.session_fetches().await, 1);
}

#[tokio::test]
async fn test_session_request_carries_authorization() {
    let server = MockServer::new();
    let client: TestClient = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    client.update_session().await.unwrap();

    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].url, SESSION_URL);
    assert_eq!(requests[0].authorization, AUTHORIZATION);
}

#[tokio::test]
async fn test_update_session_replaces_cache() {
    let server = MockServer::new();
    let client: TestClient = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    client.session().await.unwrap();

    let mut changed = session_json(4);
    changed["state"] = json!("s2");
    server.set_session(changed).await;

    // the cache still holds the old session until refreshed
    assert_eq!(client.session().await.unwrap().state, "s1");

    let refreshed = client.update_session().await.unwrap();
    assert_eq!(refreshed.state, "s2");
    assert_eq!(refreshed.core.max_calls_in_request.0, 4);
    assert_eq!(client.cached_session().await.unwrap().state, "s2");
    assert_eq!(server.session_fetches().await, 2);
}

#[tokio::test]
async fn test_empty_session_endpoint() {
    let server = MockServer::new();
    let client: TestClient = Client::new(server.clone(), "", AUTHORIZATION);

    assert!(matches!(
        client.update_session().await,
        Err(Error::SessionEndpointMissing)
    ));
    assert!(matches!(client.echo().await, Err(Error::SessionEndpointMissing)));
    assert!(server.requests().await.is_empty());
}

#[tokio::test]
async fn test_session_without_core_capability() {
    let server = MockServer::new();
    let mut session = session_json(16);
    session["capabilities"]
        .as_object_mut()
        .unwrap()
        .remove("urn:ietf:params:jmap:core");
    server.set_session(session).await;

    let client: TestClient = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    match client.session().await {
        Err(Error::Serialization(msg)) => assert!(msg.contains("core capability")),
        other => panic!("unexpected result: {:?}", other.map(|s| s.state.clone())),
    }
    assert!(client.cached_session().await.is_none());
}

#[tokio::test]
async fn test_session_problem_details() {
    // anything but SESSION_URL goes to the handler
    let server = MockServer::with_handler(|_| {
        json_reply(
            401,
            &json!({"type": "about:blank", "status": 401, "title": "Unauthorized"}),
        )
    });
    let client: TestClient =
        Client::new(server.clone(), "https://jmap.example.com/other-session", AUTHORIZATION);

    match client.update_session().await {
        Err(Error::Request(problem)) => {
            assert_eq!(problem.problem_type, ProblemType::Other("about:blank".into()));
            assert_eq!(problem.status, Some(401));
            assert_eq!(problem.title.as_deref(), Some("Unauthorized"));
        }
        other => panic!("unexpected result: {:?}", other.map(|s| s.state.clone())),
    }
    assert!(client.cached_session().await.is_none());
}

#[tokio::test]
async fn test_concurrent_first_use() {
    let server = MockServer::new();
    let client: TestClient = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    let (a, b, c) = tokio::join!(client.session(), client.session(), client.session());
    let states: Vec<String> = [a, b, c]
        .into_iter()
        .map(|s| s.unwrap().state.clone())
        .collect();

    assert_eq!(states, ["s1", "s1", "s1"]);
    let fetches = server.session_fetches().await;
    assert!((1..=3).contains(&fetches));
    assert!(client.cached_session().await.is_some());
}
