//! DICOMweb protocol constants and header handling.
//!
//! This module collects the wire-level vocabulary shared by the router, the
//! multipart codec and the client:
//!
//! - **[headers]** - `Content-Type` parsing and response classification
//! - **[tags]** - DICOM attribute keys and QIDO-RS query keywords
//!
//! # Examples
//!
//! ```
//! use dicomweb_client::protocol::{classify, ResponseBody};
//!
//! let body = classify(Some("multipart/related; type=\"application/dicom\"; boundary=TOAST")).unwrap();
//! match body {
//!     ResponseBody::Multipart(envelope) => assert_eq!(envelope.boundary, "TOAST"),
//!     ResponseBody::Single { .. } => unreachable!(),
//! }
//! ```

pub mod headers;
pub mod tags;

pub use headers::{
    classify, format_stow_content_type, is_valid_boundary, parse_media_type, MediaType,
    MultipartEnvelope, ResponseBody,
};

/// Protocol constants
pub mod constants {
    /// Media type of a single DICOM Part 10 payload
    pub const APPLICATION_DICOM: &str = "application/dicom";

    /// Media type of DICOM JSON responses (QIDO-RS, metadata)
    pub const APPLICATION_DICOM_JSON: &str = "application/dicom+json";

    /// Media type of a multipart/related body
    pub const MULTIPART_RELATED: &str = "multipart/related";

    /// Boundary token used for STOW-RS request bodies.
    ///
    /// No collision detection is performed against payload content.
    pub const DEFAULT_BOUNDARY: &str = "dicomwebRsQx7tZkWb";

    /// Upper bound on the size of a single part's header block
    pub const MAX_PART_HEADER_BYTES: usize = 16 * 1024;

    /// Resource path segments
    pub mod paths {
        /// `/studies`
        pub const STUDIES: &str = "/studies";
        /// `/series`
        pub const SERIES: &str = "/series";
        /// `/instances`
        pub const INSTANCES: &str = "/instances";
        /// `/frames`
        pub const FRAMES: &str = "/frames";
        /// `/rendered`
        pub const RENDERED: &str = "/rendered";
        /// `/metadata`
        pub const METADATA: &str = "/metadata";
    }
}
