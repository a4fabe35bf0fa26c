//! WADO-RS retrievals against a mock server.

use bytes::Bytes;
use dicomweb_client::client::SinglePartPolicy;
use dicomweb_client::{
    ClientConfig, DicomwebClient, DicomwebError, RenderOptions, RetrieveKind, WadoRequest,
};
use mockito::{Matcher, Server};

const TOAST_CONTENT_TYPE: &str = "multipart/related; type=\"application/dicom\"; boundary=TOAST";

// LF framing, no trailing newline after the close delimiter.
const TOAST_BODY: &str = "--TOAST
Content-Type: application/dicom

part: 0
--TOAST
Content-Type: application/dicom

part: 1
--TOAST--";

fn client(endpoint: &str) -> DicomwebClient {
    DicomwebClient::new(ClientConfig::new(endpoint)).unwrap()
}

fn expected_parts() -> Vec<Bytes> {
    vec![Bytes::from("part: 0"), Bytes::from("part: 1")]
}

/// Fill in whatever identifiers `kind` requires.
fn request_for(kind: RetrieveKind, base: &str) -> (WadoRequest, String) {
    match kind {
        RetrieveKind::StudyRaw => (WadoRequest::study("study-id"), "/studies/study-id".into()),
        RetrieveKind::StudyRendered => (
            WadoRequest::study("study-id").with_kind(kind),
            "/studies/study-id/rendered".into(),
        ),
        RetrieveKind::SeriesRaw => (
            WadoRequest::series("study-id", "series-id"),
            "/studies/study-id/series/series-id".into(),
        ),
        RetrieveKind::SeriesRendered => (
            WadoRequest::series("study-id", "series-id").with_kind(kind),
            "/studies/study-id/series/series-id/rendered".into(),
        ),
        RetrieveKind::SeriesMetadata => (
            WadoRequest::series("study-id", "series-id").with_kind(kind),
            "/studies/study-id/series/series-id/metadata".into(),
        ),
        RetrieveKind::InstanceRaw => (
            WadoRequest::instance("study-id", "series-id", "instance-id"),
            "/studies/study-id/series/series-id/instances/instance-id".into(),
        ),
        RetrieveKind::InstanceRendered => (
            WadoRequest::instance("study-id", "series-id", "instance-id").with_kind(kind),
            "/studies/study-id/series/series-id/instances/instance-id/rendered".into(),
        ),
        RetrieveKind::InstanceMetadata => (
            WadoRequest::instance("study-id", "series-id", "instance-id").with_kind(kind),
            "/studies/study-id/series/series-id/instances/instance-id/metadata".into(),
        ),
        RetrieveKind::Frame => (
            WadoRequest::frame("study-id", "series-id", "instance-id", 1),
            "/studies/study-id/series/series-id/instances/instance-id/frames/1".into(),
        ),
        RetrieveKind::UriReference => (
            WadoRequest::uri_reference(format!("{}/direct/ref", base)),
            "/direct/ref".into(),
        ),
    }
}

#[tokio::test]
async fn test_retrieve_every_kind() {
    let mut server = Server::new_async().await;
    let client = client(&server.url());

    for kind in RetrieveKind::ALL {
        let (request, path) = request_for(kind, &server.url());
        let mock = server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_header("content-type", TOAST_CONTENT_TYPE)
            .with_body(TOAST_BODY)
            .create_async()
            .await;

        let parts = client.retrieve(&request).await.unwrap();
        assert_eq!(parts, expected_parts(), "kind: {}", kind);
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_retrieve_crlf_body_with_headers() {
    let mut server = Server::new_async().await;
    let body = "--TOAST\r\nContent-Type: application/dicom\r\nContent-ID: <a>\r\n\r\n\x00\x01\r\nbinary\r\n--TOAST--\r\n";
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(200)
        .with_header("content-type", TOAST_CONTENT_TYPE)
        .with_body(body)
        .create_async()
        .await;

    let parts = client(&server.url())
        .retrieve_parts(&WadoRequest::study("study-id"))
        .await
        .unwrap();

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].content_type(), Some("application/dicom"));
    assert_eq!(parts[0].content_id(), Some("a"));
    assert_eq!(&parts[0].body[..], b"\x00\x01\r\nbinary");
}

#[tokio::test]
async fn test_retrieve_with_start_keeps_wire_order() {
    let mut server = Server::new_async().await;
    let body = "--TOAST
Content-Type: application/dicom
Content-ID: SECOND

part: 0
--TOAST
Content-Type: application/dicom
Content-ID: FIRST

part: 1
--TOAST--";
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(200)
        .with_header(
            "content-type",
            "multipart/related; type=\"application/dicom\"; start=FIRST; boundary=TOAST",
        )
        .with_body(body)
        .create_async()
        .await;

    let parts = client(&server.url())
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap();
    assert_eq!(parts, expected_parts());
}

#[tokio::test]
async fn test_retrieve_sends_basic_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/studies/study-id")
        .match_header("authorization", "Basic dXNlcjpuYW1l")
        .with_status(200)
        .with_header("content-type", TOAST_CONTENT_TYPE)
        .with_body(TOAST_BODY)
        .create_async()
        .await;

    let config = ClientConfig::new(server.url()).with_basic_auth("user", "name");
    let client = DicomwebClient::new(config).unwrap();
    client.retrieve(&WadoRequest::study("study-id")).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rendered_options_in_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/studies/study-id/series/series-id/instances/instance-id/rendered")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("quality".into(), "90".into()),
            Matcher::UrlEncoded("viewport".into(), "512,512".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body("jpeg")
        .create_async()
        .await;

    let render = RenderOptions {
        quality: Some(90),
        viewport: Some("512,512".into()),
        ..RenderOptions::default()
    };
    let request = WadoRequest::instance("study-id", "series-id", "instance-id")
        .with_kind(RetrieveKind::InstanceRendered)
        .with_render_options(render);
    let parts = client(&server.url()).retrieve(&request).await.unwrap();

    assert_eq!(parts, vec![Bytes::from("jpeg")]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_single_body_accepted_by_default() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/studies/study-id/series/series-id/metadata")
        .with_status(200)
        .with_header("content-type", "application/dicom+json")
        .with_body("[{}]")
        .create_async()
        .await;

    let request = WadoRequest::series("study-id", "series-id").with_kind(RetrieveKind::SeriesMetadata);
    let parts = client(&server.url()).retrieve_parts(&request).await.unwrap();

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].content_type(), Some("application/dicom+json"));
    assert_eq!(&parts[0].body[..], b"[{}]");
}

#[tokio::test]
async fn test_single_body_rejected_by_policy() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let config =
        ClientConfig::new(server.url()).with_single_part_policy(SinglePartPolicy::Reject);
    let client = DicomwebClient::new(config).unwrap();
    let err = client
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap_err();

    assert!(matches!(err, DicomwebError::UnsupportedContentType(t) if t == "application/json"));
}

#[tokio::test]
async fn test_multipart_without_boundary() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(200)
        .with_header("content-type", "multipart/related; type=\"application/dicom\"")
        .with_body(TOAST_BODY)
        .create_async()
        .await;

    let err = client(&server.url())
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap_err();
    assert!(matches!(err, DicomwebError::MalformedContentType(_)));
}

#[tokio::test]
async fn test_truncated_multipart_discards_parts() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(200)
        .with_header("content-type", TOAST_CONTENT_TYPE)
        .with_body("--TOAST\nContent-Type: application/dicom\n\npart: 0\n--TOAST\n\npart: 1")
        .create_async()
        .await;

    let err = client(&server.url())
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap_err();
    assert!(matches!(err, DicomwebError::MalformedMultipart(_)));
}

#[tokio::test]
async fn test_retrieve_server_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(404)
        .create_async()
        .await;

    let err = client(&server.url())
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DicomwebError::RemoteError { status: 404, ref status_line } if status_line == "404 Not Found"
    ));
}

#[tokio::test]
async fn test_invalid_shape_never_reaches_server() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let client = client(&server.url());

    let bad = [
        WadoRequest::new(RetrieveKind::StudyRaw),
        WadoRequest::study("study-id").with_kind(RetrieveKind::SeriesRaw),
        WadoRequest::series("study-id", "series-id").with_kind(RetrieveKind::StudyRaw),
        WadoRequest::frame("study-id", "series-id", "instance-id", 0),
        WadoRequest::new(RetrieveKind::UriReference),
    ];
    for request in &bad {
        let err = client.retrieve(request).await.unwrap_err();
        assert!(err.is_validation(), "{:?}", request);
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_retrieve_invalid_url() {
    let err = client("%$^")
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap_err();
    assert!(matches!(err, DicomwebError::Transport(_)));
}

#[tokio::test]
async fn test_retrieve_boundary_outside_bchars() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(200)
        .with_header("content-type", "multipart/related; boundary=\"to@st\"")
        .with_body(
            "--to@st\r\nContent-Type: application/dicom\r\n\r\npart: 0\r\n\
             --to@st\r\nContent-Type: application/dicom\r\n\r\npart: 1\r\n--to@st--\r\n",
        )
        .create_async()
        .await;

    let parts = client(&server.url())
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap();
    assert_eq!(parts, expected_parts());
}

#[tokio::test]
async fn test_retrieve_not_modified_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/studies/study-id")
        .with_status(304)
        .create_async()
        .await;

    let err = client(&server.url())
        .retrieve(&WadoRequest::study("study-id"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(304));
    assert_eq!(err.to_string(), "304 Not Modified");
}
