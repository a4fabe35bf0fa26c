//! DICOMweb HTTP client implementation.
//!
//! This module provides the transport facade over the three DICOMweb services:
//!
//! - **Search** studies, series and instances (QIDO-RS)
//! - **Retrieve** instances, frames, bulk data, metadata and rendered images (WADO-RS)
//! - **Store** instances as one multipart/related upload (STOW-RS)
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch        - DicomwebClient and HTTP operations
//! ├── config       - Client configuration
//! ├── hooks        - Per-request hooks
//! └── utils        - Utility functions
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DicomwebClient`] | Main HTTP client |
//! | [`ClientConfig`] | Endpoints, auth, TLS and decoding options |
//! | [`RequestHooks`] | Ordered request transformations |
//! | [`SinglePartPolicy`] | Handling of non-multipart retrievals |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use dicomweb_client::client::{ClientConfig, DicomwebClient};
//!
//! let config = ClientConfig::new("https://pacs.example/dicom-web")
//!     .with_basic_auth("user", "password");
//! let client = DicomwebClient::new(config).unwrap();
//! assert_eq!(client.config().wado_endpoint, "https://pacs.example/dicom-web");
//! ```
//!
//! ## Utility Functions
//!
//! ```
//! use dicomweb_client::client::{basic_authorization, is_success_status};
//!
//! assert!(is_success_status(204));
//! assert!(!is_success_status(404));
//! assert_eq!(basic_authorization("user", "name"), "Basic dXNlcjpuYW1l");
//! ```
//!
//! # Specification
//!
//! Based on [DICOM PS3.18 Web Services]:
//!
//! - **Section 10.4**: Retrieve (WADO-RS)
//! - **Section 10.5**: Store (STOW-RS)
//! - **Section 10.6**: Search (QIDO-RS)
//!
//! [DICOM PS3.18 Web Services]: https://dicom.nema.org/medical/dicom/current/output/html/part18.html

mod config;
mod fetch;
mod hooks;
mod utils;

pub use config::{ClientConfig, SinglePartPolicy};
pub use fetch::DicomwebClient;
pub use hooks::{RequestHook, RequestHooks};
pub use utils::*;
