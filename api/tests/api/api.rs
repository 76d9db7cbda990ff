use std::{net::TcpListener, time::Duration};

use apihub::{
    domain::{
        request::{AuthMode, HeaderEntry, QueryParam, TestRequestInput},
        response::{ExecutionResult, FailureKind, TestResponse},
    },
    utilities::response::{NETWORK_MESSAGE, TIMEOUT_MESSAGE},
    ApiHubError,
};
use wiremock::{
    matchers::{body_string, header, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::helpers::spawn_test_app;

fn get(url: String) -> TestRequestInput {
    TestRequestInput {
        method: "GET".into(),
        url,
        ..Default::default()
    }
}

#[tokio::test]
async fn error_statuses_come_back_as_success() {
    let test_app = spawn_test_app().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-trace", "abc")
                .set_body_string("not here"),
        )
        .expect(1)
        .mount(&test_app.test_server)
        .await;

    let result = test_app
        .hub
        .test_request(get(test_app.url("/missing")))
        .await
        .unwrap();

    match result {
        ExecutionResult::Success {
            status,
            status_text,
            headers,
            raw_body,
            size_bytes,
            ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(status_text, "Not Found");
            assert_eq!(headers.get("x-trace").map(String::as_str), Some("abc"));
            assert_eq!(raw_body, "not here");
            assert_eq!(size_bytes, 10);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn success_converts_to_client_response() {
    let test_app = spawn_test_app().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1}]"#))
        .mount(&test_app.test_server)
        .await;

    let result = test_app
        .hub
        .test_request(get(test_app.url("/users")))
        .await
        .unwrap();
    let response = TestResponse::from(result);

    assert!(response.success);
    assert_eq!(response.status, Some(200));
    assert_eq!(response.data.as_deref(), Some(r#"[{"id":1}]"#));
    assert!(response.error.is_none());
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let test_app = spawn_test_app().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&test_app.test_server)
        .await;

    let mut input = get(test_app.url("/slow"));
    input.timeout_ms = Some(1_000);
    let result = test_app.hub.test_request(input).await.unwrap();

    assert_eq!(result.failure_kind(), Some(FailureKind::Timeout));
    assert_eq!(result.status(), 0);
    assert!(result.elapsed_ms() >= 1_000, "elapsed {}", result.elapsed_ms());
    assert!(result.elapsed_ms() < 4_000, "elapsed {}", result.elapsed_ms());
    match result {
        ExecutionResult::Failure { message, .. } => assert_eq!(message, TIMEOUT_MESSAGE),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn refused_connection_is_a_network_failure() {
    let test_app = spawn_test_app().await;
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = test_app
        .hub
        .test_request(get(format!("http://127.0.0.1:{}/", port)))
        .await
        .unwrap();

    assert_eq!(result.failure_kind(), Some(FailureKind::Network));
    match result {
        ExecutionResult::Failure { message, status, .. } => {
            assert_eq!(message, NETWORK_MESSAGE);
            assert_eq!(status, 0);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn invalid_header_name_is_a_client_failure() {
    let test_app = spawn_test_app().await;
    let mut input = get(test_app.url("/anything"));
    input.headers = vec![HeaderEntry::new("bad header", "x")];

    let result = test_app.hub.test_request(input).await.unwrap();

    assert_eq!(result.failure_kind(), Some(FailureKind::HttpClientError));
    assert_eq!(result.status(), 0);
    let received = test_app.test_server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn params_and_auth_reach_the_upstream() {
    let test_app = spawn_test_app().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust lang"))
        .and(query_param("page", "2"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.test_server)
        .await;

    let input = TestRequestInput {
        method: "get".into(),
        url: test_app.url("/search"),
        headers: vec![HeaderEntry::new("Accept", "application/json")],
        params: vec![
            QueryParam::new("q", "rust lang"),
            QueryParam::new("page", "2"),
            QueryParam::disabled("debug", "1"),
        ],
        auth: AuthMode::Bearer("secret-token".into()),
        ..Default::default()
    };
    let result = test_app.hub.test_request(input).await.unwrap();

    assert_eq!(result.status(), 200);
    let received = test_app.test_server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("q=rust+lang&page=2"));
}

#[tokio::test]
async fn post_sends_raw_body_text() {
    let test_app = spawn_test_app().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_string(r#"{"name": "widget"}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&test_app.test_server)
        .await;

    let input = TestRequestInput {
        method: "POST".into(),
        url: test_app.url("/items"),
        body: Some(r#"{"name": "widget"}"#.into()),
        ..Default::default()
    };
    let result = test_app.hub.test_request(input).await.unwrap();
    assert_eq!(result.status(), 201);
}

#[tokio::test]
async fn get_never_sends_a_body() {
    let test_app = spawn_test_app().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.test_server)
        .await;

    let mut input = get(test_app.url("/items"));
    input.body = Some("ignored".into());
    test_app.hub.test_request(input).await.unwrap();

    let received = test_app.test_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn relative_url_is_rejected_before_dispatch() {
    let test_app = spawn_test_app().await;
    let err = test_app
        .hub
        .test_request(get("/users".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiHubError::Validation(_)));

    let err = test_app
        .hub
        .test_request(get("ftp://files.example.com/a".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiHubError::Validation(_)));
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let test_app = spawn_test_app().await;
    let input = TestRequestInput {
        method: "TRACE".into(),
        url: test_app.url("/"),
        ..Default::default()
    };
    let err = test_app.hub.test_request(input).await.unwrap_err();
    assert!(matches!(err, ApiHubError::Validation(_)));
}
