//! Integration tests for API requests and responses

mod common;

use common::*;
use jmap_client::{Batch, Client, HttpMethod, HttpReply};
use jmap_core::{Error, ErrorCode, MethodResponse, ProblemType, Registry, Request, Invocation};
use serde_json::{json, Map, Value};

type Args = Map<String, Value>;

fn mail_registry() -> Registry<Args> {
    let mut registry = Registry::new();
    registry.register_object("Mailbox/get");
    registry.register_object("Email/query");
    registry
}

fn args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[tokio::test]
async fn test_send_and_decode() {
    let server = MockServer::with_handler(|_| {
        json_reply(
            200,
            &json!({
                "methodResponses": [
                    ["Mailbox/get", {"accountId": ACCOUNT_ID, "state": "m1", "list": []}, "0"],
                    ["error", {"type": "unknownMethod"}, "1"]
                ],
                "sessionState": "s1"
            }),
        )
    });
    let mut client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);
    client.enable(&mail_registry());

    let mut batch = Batch::new();
    batch.use_capability("urn:ietf:params:jmap:core");
    batch.use_capability("urn:ietf:params:jmap:mail");
    batch.add("Mailbox/get", args(json!({"accountId": ACCOUNT_ID})));
    batch.add("Foo/bar", Map::new());

    let response = client.send(batch.request()).await.unwrap();

    assert_eq!(response.session_state(), "s1");
    assert_eq!(response.responses().len(), 2);
    match &response.responses()[0] {
        MethodResponse::Ok(inv) => {
            assert_eq!(inv.name(), "Mailbox/get");
            assert_eq!(inv.call_id(), "0");
            assert_eq!(inv.args()["state"], "m1");
        }
        other => panic!("unexpected response: {:?}", other),
    }
    let err = response.responses()[1].as_error().unwrap();
    assert_eq!(err.error_type, ErrorCode::UnknownMethod);
    assert_eq!(err.call_id, "1");
}

#[tokio::test]
async fn test_request_wire_format() {
    let server = MockServer::new();
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    let mut batch = Batch::new();
    batch.use_capability("urn:ietf:params:jmap:core");
    batch.add("Email/query", args(json!({"accountId": ACCOUNT_ID})));
    client.send(batch.request()).await.unwrap();

    let requests = server.requests().await;
    assert_eq!(requests.len(), 2);

    let api = &requests[1];
    assert_eq!(api.method, HttpMethod::Post);
    assert_eq!(api.url, API_URL);
    assert_eq!(api.authorization, AUTHORIZATION);
    assert_eq!(api.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        body_json(api),
        json!({
            "using": ["urn:ietf:params:jmap:core"],
            "methodCalls": [["Email/query", {"accountId": ACCOUNT_ID}, "0"]]
        })
    );
}

#[tokio::test]
async fn test_call_limit_checked_before_sending() {
    let server = MockServer::new();
    server.set_session(session_json(2)).await;
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    let mut batch = Batch::new();
    for _ in 0..3 {
        batch.add("Core/echo", Map::new());
    }

    match client.send(batch.request()).await {
        Err(Error::Request(problem)) => {
            assert_eq!(problem.problem_type, ProblemType::Limit);
            assert_eq!(problem.properties["limit"], "maxCallsInRequest");
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.session_state().to_string())),
    }

    // only the session was fetched
    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Get);
}

#[tokio::test]
async fn test_call_limit_allows_exact_count() {
    let server = MockServer::new();
    server.set_session(session_json(2)).await;
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    let request = Request::new(vec!["urn:ietf:params:jmap:core".into()])
        .with_call(Invocation::new("Core/echo", "a", Map::new()))
        .with_call(Invocation::new("Core/echo", "b", Map::new()));

    assert!(client.send(&request).await.is_ok());
    assert_eq!(server.requests().await.len(), 2);
}

#[tokio::test]
async fn test_problem_details_response() {
    let server = MockServer::with_handler(|_| {
        json_reply(
            400,
            &json!({
                "type": "urn:ietf:params:jmap:error:unknownCapability",
                "status": 400,
                "detail": "The Request object used capability 'https://example.com/apis/foobar', which is not supported by this server."
            }),
        )
    });
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);
    let request = Request::new(vec!["https://example.com/apis/foobar".into()]);

    match client.send(&request).await {
        Err(Error::Request(problem)) => {
            assert_eq!(problem.problem_type, ProblemType::UnknownCapability);
            assert_eq!(problem.status, Some(400));
            assert!(problem.detail.unwrap().contains("foobar"));
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.session_state().to_string())),
    }
}

#[tokio::test]
async fn test_non_json_error_response() {
    let server = MockServer::with_handler(|_| {
        HttpReply::new(503, Some("text/plain".into()), b"maintenance".to_vec())
    });
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);
    let request = Request::new(vec!["urn:ietf:params:jmap:core".into()]);

    let result = client.send(&request).await;
    assert!(matches!(result, Err(Error::Http { status: 503 })));
}

#[tokio::test]
async fn test_unknown_method_in_response() {
    let server = MockServer::with_handler(|_| {
        json_reply(
            200,
            &json!({
                "methodResponses": [["Calendar/get", {}, "0"]],
                "sessionState": "s1"
            }),
        )
    });
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);
    let request = Request::new(vec!["urn:ietf:params:jmap:core".into()])
        .with_call(Invocation::new("Calendar/get", "0", Map::new()));

    match client.send(&request).await {
        Err(Error::UnknownMethod(name)) => assert_eq!(name, "Calendar/get"),
        other => panic!("unexpected result: {:?}", other.map(|r| r.session_state().to_string())),
    }
}

#[tokio::test]
async fn test_send_with_custom_registry() {
    let server = MockServer::with_handler(|_| {
        json_reply(
            200,
            &json!({
                "methodResponses": [["Calendar/get", {"list": [1, 2]}, "0"]],
                "sessionState": "s1"
            }),
        )
    });
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    let mut registry: Registry<Value> = Registry::new();
    registry.register("Calendar/get", |raw: &serde_json::value::RawValue| -> jmap_core::Result<Value> {
        Ok(serde_json::from_str(raw.get())?)
    });
    let request = Request::new(vec!["urn:ietf:params:jmap:core".into()])
        .with_call(Invocation::new("Calendar/get", "0", json!({})));

    let response = client.send_with(&request, &registry).await.unwrap();
    match &response.responses()[0] {
        MethodResponse::Ok(inv) => assert_eq!(inv.args()["list"], json!([1, 2])),
        other => panic!("unexpected response: {:?}", other),
    }
    // the client's own registry is untouched
    assert!(client.registry().is_empty());
}

#[tokio::test]
async fn test_transport_failure() {
    struct Down;

    #[async_trait::async_trait]
    impl jmap_client::Transport for Down {
        async fn send(
            &self,
            _request: jmap_client::HttpRequest,
        ) -> jmap_core::Result<HttpReply> {
            Err(Error::Transport("connection refused".into()))
        }
    }

    let client: Client<_, Args> = Client::new(Down, SESSION_URL, AUTHORIZATION);
    let request = Request::new(vec!["urn:ietf:params:jmap:core".into()]);

    match client.send(&request).await {
        Err(Error::Transport(msg)) => assert_eq!(msg, "connection refused"),
        other => panic!("unexpected result: {:?}", other.map(|r| r.session_state().to_string())),
    }
}

#[tokio::test]
async fn test_echo() {
    let server = MockServer::with_handler(|request| {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let call = &body["methodCalls"][0];
        json_reply(
            200,
            &json!({
                "methodResponses": [[call[0].clone(), call[1].clone(), call[2].clone()]],
                "sessionState": "s1"
            }),
        )
    });
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    client.echo().await.unwrap();

    let requests = server.requests().await;
    assert_eq!(
        body_json(&requests[1]),
        json!({
            "using": ["urn:ietf:params:jmap:core"],
            "methodCalls": [["Core/echo", {}, "echo0"]]
        })
    );
}

#[tokio::test]
async fn test_echo_method_error() {
    let server = MockServer::with_handler(|_| {
        json_reply(
            200,
            &json!({
                "methodResponses": [["error", {"type": "forbidden"}, "echo0"]],
                "sessionState": "s1"
            }),
        )
    });
    let client: Client<_, Args> = Client::new(server.clone(), SESSION_URL, AUTHORIZATION);

    match client.echo().await {
        Err(Error::Method(err)) => {
            assert_eq!(err.error_type, ErrorCode::Forbidden);
            assert_eq!(err.call_id, "echo0");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
