//! STOW-RS uploads against a mock server.

use dicomweb_client::{ClientConfig, DicomwebClient, DicomwebError, StowRequest};
use mockito::Server;
use serde_json::json;

const DEFAULT_CONTENT_TYPE: &str =
    "multipart/related; type=\"application/dicom\"; boundary=dicomwebRsQx7tZkWb";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_store_body_and_content_type() {
    init_tracing();
    let mut server = Server::new_async().await;
    let expected_body = "--dicomwebRsQx7tZkWb\r\nContent-Type: application/dicom\r\n\r\nfirst\r\n\
                         --dicomwebRsQx7tZkWb\r\nContent-Type: application/dicom\r\n\r\nsecond\r\n\
                         --dicomwebRsQx7tZkWb--\r\n";
    let mock = server
        .mock("POST", "/studies")
        .match_header("content-type", DEFAULT_CONTENT_TYPE)
        .match_body(expected_body)
        .with_status(200)
        .with_header("content-type", "application/dicom+json")
        .with_body(r#"{"00081199":{"vr":"SQ"}}"#)
        .create_async()
        .await;

    let client = DicomwebClient::new(ClientConfig::new(server.url())).unwrap();
    let request = StowRequest::from_parts(["first", "second"]);
    let ack = client.store(&request).await.unwrap();

    assert_eq!(ack, json!({"00081199": {"vr": "SQ"}}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_store_into_study() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/studies/study-id")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = DicomwebClient::new(ClientConfig::new(server.url())).unwrap();
    let request = StowRequest::new().with_study("study-id").with_part("x");
    client.store(&request).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_store_custom_boundary_and_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/studies")
        .match_header(
            "content-type",
            "multipart/related; type=\"application/dicom\"; boundary=custom",
        )
        .match_header("authorization", "Bearer abc")
        .match_body("--custom--\r\n")
        .with_status(204)
        .create_async()
        .await;

    let config = ClientConfig::new(server.url())
        .with_boundary("custom")
        .with_bearer_token("abc");
    let client = DicomwebClient::new(config).unwrap();
    let ack = client.store(&StowRequest::new()).await.unwrap();

    assert!(ack.is_null());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_store_uses_stow_endpoint() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/stow/studies")
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let config = ClientConfig::new("http://127.0.0.1:9")
        .with_stow_endpoint(format!("{}/stow", server.url()));
    let client = DicomwebClient::new(config).unwrap();
    let ack = client.store(&StowRequest::new().with_part("x")).await.unwrap();

    assert_eq!(ack, serde_json::Value::Null);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_store_conflict() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/studies")
        .with_status(409)
        .with_body(r#"{"00081198":{"vr":"SQ"}}"#)
        .create_async()
        .await;

    let config = ClientConfig::new(server.url()).with_logging(false);
    let client = DicomwebClient::new(config).unwrap();
    let err = client
        .store(&StowRequest::new().with_part("x"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "409 Conflict");
}

#[tokio::test]
async fn test_store_invalid_url() {
    let client = DicomwebClient::new(ClientConfig::new("%$^")).unwrap();
    let err = client
        .store(&StowRequest::new().with_part("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DicomwebError::Transport(_)));
}
