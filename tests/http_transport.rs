//! The reqwest transport and the retrying store client against a local
//! mock server.

use std::sync::Arc;
use std::time::Duration;

use url::Url;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use browse_forward::app::BrowseError;
use browse_forward::domain::ContentQuery;
use browse_forward::dynamo::QueryBuilder;
use browse_forward::fetcher::http_fetcher::HttpFetcher;
use browse_forward::fetcher::retry::{RetryPolicy, RetryingTransport};
use browse_forward::fetcher::{HttpRequest, HttpTransport};
use browse_forward::signer::{Credentials, RequestSigner};

fn retrying(server: &MockServer, max_attempts: u32) -> RetryingTransport {
    let signer = Arc::new(RequestSigner::new(
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        "us-east-1",
        "dynamodb",
    ));
    RetryingTransport::new(
        Arc::new(HttpFetcher::with_timeout(Duration::from_secs(5))),
        signer,
        Url::parse(&format!("{}/", server.uri())).unwrap(),
        "DynamoDB_20120810",
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(10),
        },
    )
}

#[tokio::test]
async fn fetcher_posts_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("x-custom", "yes"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let response = HttpFetcher::new()
        .post(&HttpRequest {
            url: format!("{}/echo", server.uri()),
            headers: vec![("x-custom".into(), "yes".into())],
            body: b"{}".to_vec(),
        })
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.body_text(), "created");
}

#[tokio::test]
async fn fetcher_returns_error_statuses_as_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = HttpFetcher::new().get(&server.uri()).await.unwrap();

    assert_eq!(response.status, 404);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let err = HttpFetcher::new()
        .get("http://127.0.0.1:9/")
        .await
        .unwrap_err();
    assert!(matches!(err, BrowseError::Network(_)));
}

#[tokio::test]
async fn store_request_is_signed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-amz-json-1.0"))
        .and(header("x-amz-target", "DynamoDB_20120810.Query"))
        .and(header_exists("x-amz-date"))
        .and(header_exists("authorization"))
        .and(body_partial_json(serde_json::json!({
            "TableName": "webpages",
            "IndexName": "category-status-index"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Items":[],"Count":0}"#))
        .expect(1)
        .mount(&server)
        .await;

    let expression = QueryBuilder::new("webpages").build(&ContentQuery::with_limit(10).category("news"));
    let body = retrying(&server, 3).execute(&expression).await.unwrap();

    assert_eq!(body, br#"{"Items":[],"Count":0}"#);
    let requests = server.received_requests().await.unwrap();
    let authorization = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
    assert!(authorization.contains("/us-east-1/dynamodb/aws4_request"));
}

#[tokio::test]
async fn persistent_503_is_attempted_three_times() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let expression = QueryBuilder::new("webpages").build(&ContentQuery::with_limit(5));
    let err = retrying(&server, 3).execute(&expression).await.unwrap_err();

    assert_eq!(
        err,
        BrowseError::Aws {
            status: 503,
            body: "unavailable".into()
        }
    );
}

#[tokio::test]
async fn validation_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("ValidationException"))
        .expect(1)
        .mount(&server)
        .await;

    let expression = QueryBuilder::new("webpages").build(&ContentQuery::with_limit(5));
    let err = retrying(&server, 3).execute(&expression).await.unwrap_err();

    assert!(matches!(err, BrowseError::Aws { status: 400, .. }));
}
