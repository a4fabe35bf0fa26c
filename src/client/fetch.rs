//! Main DICOMweb client implementation.
//!
//! Provides [`DicomwebClient`] for QIDO-RS searches, WADO-RS retrievals and
//! STOW-RS uploads. Each call is one request/response round trip; nothing is
//! retried or cached.
//!
//! # Examples
//!
//! ## Search for studies
//!
//! ```ignore
//! use dicomweb_client::{ClientConfig, DicomwebClient, QidoRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DicomwebClient::new(ClientConfig::new("https://pacs.example/dicom-web"))?;
//!     let studies = client.query(&QidoRequest::studies().patient_id("12345").limit(10)).await?;
//!     for study in &studies {
//!         println!("{:?}", study.study_instance_uid());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Retrieve a series
//!
//! ```ignore
//! use dicomweb_client::{ClientConfig, DicomwebClient, WadoRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DicomwebClient::new(ClientConfig::new("https://pacs.example/dicom-web"))?;
//!     let parts = client.retrieve(&WadoRequest::series("1.2.3", "1.2.3.4")).await?;
//!     for (i, part) in parts.iter().enumerate() {
//!         std::fs::write(format!("/tmp/instance_{}.dcm", i), part)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Store instances
//!
//! ```ignore
//! use dicomweb_client::{ClientConfig, DicomwebClient, StowRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DicomwebClient::new(ClientConfig::new("https://pacs.example/dicom-web"))?;
//!     let request = StowRequest::new().with_part(std::fs::read("/tmp/instance_0.dcm")?);
//!     let ack = client.store(&request).await?;
//!     println!("{}", ack);
//!     Ok(())
//! }
//! ```

use crate::client::config::{ClientConfig, SinglePartPolicy};
use crate::client::utils::{is_success_status, status_line};
use crate::error::{DicomwebError, Result};
use crate::multipart::{self, Part, PartParser};
use crate::protocol::{classify, MultipartEnvelope, ResponseBody};
use crate::router::{route_query, route_retrieve, route_store, Route};
use crate::types::{QidoMatch, QidoRequest, StowRequest, WadoRequest};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// The DICOMweb client.
///
/// Cheap to clone; clones share the connection pool and the immutable
/// configuration, so concurrent calls on one client are safe.
#[derive(Clone, Debug)]
pub struct DicomwebClient {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl DicomwebClient {
    /// Create a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DicomwebError::Config`] if the configuration is invalid and
    /// [`DicomwebError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(config.insecure);
        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build()?;

        Ok(DicomwebClient {
            client,
            config: Arc::new(config),
        })
    }

    /// Search studies, series or instances (QIDO-RS).
    ///
    /// An empty response body, as sent with `204 No Content`, yields no matches.
    ///
    /// # Errors
    ///
    /// - [`DicomwebError::MissingQueryType`] / [`DicomwebError::InvalidRequestShape`]
    ///   before any network call
    /// - [`DicomwebError::RemoteError`] on a non-2xx status
    /// - [`DicomwebError::Json`] if the body is not a DICOM JSON array
    pub async fn query(&self, request: &QidoRequest) -> Result<Vec<QidoMatch>> {
        let route = route_query(
            &self.config.qido_endpoint,
            request,
            &self.config.filter_policy,
        )?;
        let response = self.execute(Method::GET, &route, None).await?;
        let body = response.bytes().await?;
        if is_blank(&body) {
            return Ok(Vec::new());
        }
        let matches: Vec<QidoMatch> = serde_json::from_slice(&body)?;
        if self.config.enable_logging {
            tracing::debug!(count = matches.len(), "QIDO-RS search returned matches");
        }
        Ok(matches)
    }

    /// Retrieve payloads (WADO-RS), in the order the server sent them.
    pub async fn retrieve(&self, request: &WadoRequest) -> Result<Vec<Bytes>> {
        let parts = self.retrieve_parts(request).await?;
        Ok(parts.into_iter().map(|part| part.body).collect())
    }

    /// Retrieve parts with their headers (WADO-RS).
    ///
    /// Multipart bodies are decoded while they stream in. A non-multipart body
    /// becomes a single part unless the client is configured with
    /// [`SinglePartPolicy::Reject`].
    ///
    /// # Errors
    ///
    /// - [`DicomwebError::InvalidRequestShape`] before any network call
    /// - [`DicomwebError::RemoteError`] on a non-2xx status
    /// - [`DicomwebError::MalformedContentType`] if the `Content-Type` is
    ///   missing, unparsable, or multipart without a boundary
    /// - [`DicomwebError::UnsupportedContentType`] for single bodies under
    ///   [`SinglePartPolicy::Reject`]
    /// - [`DicomwebError::MalformedMultipart`] on any framing error; parts
    ///   decoded before the error are discarded
    pub async fn retrieve_parts(&self, request: &WadoRequest) -> Result<Vec<Part>> {
        let route = route_retrieve(&self.config.wado_endpoint, request)?;
        let response = self.execute(Method::GET, &route, None).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| {
                value.to_str().map(str::to_string).map_err(|_| {
                    DicomwebError::MalformedContentType("non-ASCII Content-Type header".into())
                })
            })
            .transpose()?;

        match classify(content_type.as_deref())? {
            ResponseBody::Multipart(envelope) => self.decode_stream(response, &envelope).await,
            ResponseBody::Single { media_type } => match self.config.single_part {
                SinglePartPolicy::Accept => {
                    let body = response.bytes().await?;
                    let mut headers = BTreeMap::new();
                    if let Some(content_type) = content_type {
                        headers.insert("content-type".to_string(), content_type);
                    }
                    Ok(vec![Part { headers, body }])
                }
                SinglePartPolicy::Reject => Err(DicomwebError::UnsupportedContentType(media_type)),
            },
        }
    }

    /// Upload payloads as one multipart/related body (STOW-RS).
    ///
    /// Returns the server's JSON acknowledgement, or `Value::Null` for an empty
    /// body.
    pub async fn store(&self, request: &StowRequest) -> Result<serde_json::Value> {
        let route = route_store(
            &self.config.stow_endpoint,
            request.study_instance_uid.as_deref(),
        );
        let (body, content_type) = multipart::encode(&request.parts, &self.config.boundary);
        if self.config.enable_logging {
            tracing::debug!(
                parts = request.parts.len(),
                bytes = body.len(),
                "encoded STOW-RS body"
            );
        }

        let response = self
            .execute(Method::POST, &route, Some((body, content_type)))
            .await?;
        let body = response.bytes().await?;
        if is_blank(&body) {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build, hook, send and status-check one request.
    async fn execute(
        &self,
        method: Method,
        route: &Route,
        body: Option<(Bytes, String)>,
    ) -> Result<reqwest::Response> {
        let url = route.url()?;
        let mut req_builder = self.client.request(method, url);

        if let Some(auth) = self
            .config
            .authorization
            .as_deref()
            .filter(|auth| !auth.is_empty())
        {
            req_builder = req_builder.header(AUTHORIZATION, auth);
        }
        if let Some((body, content_type)) = body {
            req_builder = req_builder.header(CONTENT_TYPE, content_type).body(body);
        }

        let request = self.config.hooks.apply(req_builder.build()?)?;
        if self.config.enable_logging {
            tracing::debug!(method = %request.method(), url = %request.url(), "sending DICOMweb request");
        }

        let response = self.client.execute(request).await?;
        let status = response.status();
        if !is_success_status(status.as_u16()) {
            if self.config.enable_logging {
                tracing::warn!(status = status.as_u16(), url = %response.url(), "DICOMweb request failed");
            }
            return Err(DicomwebError::RemoteError {
                status: status.as_u16(),
                status_line: status_line(status),
            });
        }

        Ok(response)
    }

    /// Decode a multipart response chunk by chunk.
    async fn decode_stream(
        &self,
        response: reqwest::Response,
        envelope: &MultipartEnvelope,
    ) -> Result<Vec<Part>> {
        if let Some(start) = envelope.start.as_deref().filter(|_| self.config.enable_logging) {
            tracing::debug!(start, "multipart start parameter present; keeping wire order");
        }

        let mut parser = PartParser::new(&envelope.boundary);
        let mut parts = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            parts.extend(parser.feed(&chunk)?);
        }
        parts.extend(parser.finish()?);

        if self.config.enable_logging {
            tracing::debug!(parts = parts.len(), "decoded multipart response");
        }
        Ok(parts)
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DicomwebClient::new(ClientConfig::new("http://localhost")).unwrap();
        assert_eq!(client.config().qido_endpoint, "http://localhost");
    }

    #[test]
    fn test_client_rejects_invalid_boundary() {
        let config = ClientConfig::new("http://localhost").with_boundary("");
        assert!(matches!(
            DicomwebClient::new(config),
            Err(DicomwebError::Config(_))
        ));
    }

    #[test]
    fn test_insecure_client_builds() {
        let config = ClientConfig::new("https://localhost").with_insecure(true);
        let client = DicomwebClient::new(config).unwrap();
        assert!(client.config().insecure);
    }

    #[tokio::test]
    async fn test_validation_fails_before_network() {
        // Nothing listens on port 9; a network call would be a transport error.
        let client = DicomwebClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();

        let err = client.query(&QidoRequest::default()).await.unwrap_err();
        assert!(matches!(err, DicomwebError::MissingQueryType));

        let err = client
            .retrieve(&WadoRequest::frame("s", "se", "i", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DicomwebError::InvalidRequestShape(_)));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \r\n"));
        assert!(!is_blank(b"[]"));
    }
}
