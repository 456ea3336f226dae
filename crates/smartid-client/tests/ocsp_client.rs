use std::time::Duration;

use smartid_client::{OcspClient, SmartIdError, OCSP_REQUEST_CONTENT_TYPE, OCSP_RESPONSE_CONTENT_TYPE};
use smartid_trust::OcspTransport;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REQUEST: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x00];
const RESPONSE: &[u8] = &[0x30, 0x03, 0x0a, 0x01, 0x00];

async fn post(client: OcspClient, url: String) -> Result<Vec<u8>, SmartIdError> {
    tokio::task::spawn_blocking(move || client.send(&url, REQUEST))
        .await
        .unwrap()
}

fn client() -> OcspClient {
    OcspClient::builder()
        .timeout(Duration::from_millis(500))
        .user_agent("smartid-test")
        .build()
        .unwrap()
}

#[tokio::test]
async fn posts_der_and_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocsp"))
        .and(header("content-type", OCSP_REQUEST_CONTENT_TYPE))
        .and(header("accept", OCSP_RESPONSE_CONTENT_TYPE))
        .and(header("user-agent", "smartid-test"))
        .and(body_bytes(REQUEST.to_vec()))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(RESPONSE.to_vec(), OCSP_RESPONSE_CONTENT_TYPE),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = tokio::task::spawn_blocking(client).await.unwrap();
    let body = post(client, format!("{}/ocsp", server.uri())).await.unwrap();
    assert_eq!(body, RESPONSE);
}

#[tokio::test]
async fn non_success_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = tokio::task::spawn_blocking(client).await.unwrap();
    let err = post(client, server.uri()).await.unwrap_err();
    assert!(matches!(err, SmartIdError::Http(ref msg) if msg.contains("503")));
}

#[tokio::test]
async fn slow_responder_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(RESPONSE.to_vec(), OCSP_RESPONSE_CONTENT_TYPE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = tokio::task::spawn_blocking(client).await.unwrap();
    let err = post(client, server.uri()).await.unwrap_err();
    assert!(matches!(err, SmartIdError::Http(_)));
}

#[tokio::test]
async fn unreachable_responder_is_http_error() {
    let client = tokio::task::spawn_blocking(client).await.unwrap();
    let err = post(client, "http://127.0.0.1:9/ocsp".to_owned())
        .await
        .unwrap_err();
    assert!(matches!(err, SmartIdError::Http(_)));
}
