#![warn(missing_docs)]

//! # dicomweb_client: a DICOMweb client for QIDO-RS, WADO-RS and STOW-RS
//!
//! This crate implements the client side of the DICOMweb RESTful services
//! defined in [DICOM PS3.18](https://dicom.nema.org/medical/dicom/current/output/html/part18.html).
//!
//! ## Overview
//!
//! A DICOMweb server exposes three services over HTTP:
//!
//! 1. **QIDO-RS** - Search studies, series and instances by attribute
//! 2. **WADO-RS** - Retrieve instances, frames, metadata and rendered images
//! 3. **STOW-RS** - Store instances, uploaded as one multipart/related body
//!
//! Requests are typed values. They are validated and routed to canonical
//! resource paths before anything touches the network, and retrieval bodies
//! are decoded incrementally as they arrive.
//!
//! ## Key Features
//!
//! - **Typed requests**: one [`WadoRequest`] shape per retrieval kind, checked by
//!   [`WadoRequest::validate`]
//! - **Filter policy**: [`FilterPolicy`] decides which QIDO-RS filters reach the
//!   query string
//! - **Streaming multipart decoding**: CRLF and bare LF framing, headers per part
//! - **Auth and hooks**: a static `Authorization` header plus ordered
//!   request hooks for tokens or tracing headers
//! - **Error Codes**:
//!   - `MissingQueryType` / `InvalidRequestShape` - rejected before the network
//!   - `RemoteError` - non-2xx status, carries the status line
//!   - `MalformedContentType` / `UnsupportedContentType` / `MalformedMultipart` -
//!     undecodable responses
//!
//! ## Client Usage
//!
//! ```ignore
//! use dicomweb_client::{ClientConfig, DicomwebClient, QidoRequest, WadoRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://pacs.example/dicom-web")
//!         .with_basic_auth("user", "password");
//!     let client = DicomwebClient::new(config)?;
//!
//!     let studies = client.query(&QidoRequest::studies().accession_number("an")).await?;
//!     for study in &studies {
//!         if let Some(uid) = study.study_instance_uid() {
//!             let instances = client.retrieve(&WadoRequest::study(uid)).await?;
//!             println!("{}: {} instances", uid, instances.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Building Requests
//!
//! ```
//! use dicomweb_client::{QidoRequest, RetrieveKind, WadoRequest};
//!
//! let search = QidoRequest::instances("1.2.3", "1.2.3.4").modality("CT").limit(5);
//! assert_eq!(search.filters.len(), 2);
//!
//! let frame = WadoRequest::frame("1.2.3", "1.2.3.4", "1.2.3.4.5", 1);
//! assert_eq!(frame.kind, RetrieveKind::Frame);
//! assert!(frame.validate());
//!
//! let bad = WadoRequest::new(RetrieveKind::SeriesRaw).with_study("1.2.3");
//! assert!(!bad.validate());
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Request and response types
//! - **[error]** - Error types and result handling
//! - **[router]** - Resource paths and query strings
//! - **[multipart]** - multipart/related encoding and streaming decoding
//! - **[protocol]** - Media types, constants and attribute tags
//! - **[client]** - HTTP client

pub mod client;
pub mod error;
pub mod multipart;
pub mod protocol;
pub mod router;
pub mod types;

pub use client::{ClientConfig, DicomwebClient};
pub use error::{DicomwebError, Result};
pub use router::FilterPolicy;
pub use types::{
    DicomAttribute, FilterValue, QidoMatch, QidoRequest, QueryLevel, RenderOptions,
    RetrieveKind, StowRequest, WadoRequest,
};
