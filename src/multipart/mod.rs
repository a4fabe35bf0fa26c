//! multipart/related transcoding for DICOMweb payloads.
//!
//! Encodes STOW-RS request bodies and decodes WADO-RS response bodies.
//!
//! # Wire Format
//!
//! ```text
//! --{boundary}\r\n
//! Content-Type: application/dicom\r\n
//! \r\n
//! {payload 0}\r\n
//! --{boundary}\r\n
//! ...
//! --{boundary}--\r\n
//! ```
//!
//! Parts are returned in wire order. The `start` parameter of a response, when
//! present, does not reorder them.
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use dicomweb_client::multipart::{decode, encode};
//!
//! let payloads = vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")];
//! let (body, content_type) = encode(&payloads, "TOAST");
//! assert!(content_type.ends_with("boundary=TOAST"));
//!
//! let parts = decode(&body, "TOAST").unwrap();
//! assert_eq!(parts, payloads);
//! ```

mod parser;

pub use parser::{ParseState, Part, PartParser};

use crate::error::Result;
use crate::protocol::constants::APPLICATION_DICOM;
use crate::protocol::format_stow_content_type;
use bytes::{BufMut, Bytes, BytesMut};

/// Encode payloads as a multipart/related body.
///
/// Each part carries only a `Content-Type: application/dicom` header. Returns
/// the body and the matching request `Content-Type`. The boundary is not checked
/// for collisions with payload content.
pub fn encode(payloads: &[Bytes], boundary: &str) -> (Bytes, String) {
    let framing = boundary.len() + APPLICATION_DICOM.len() + 24;
    let size = payloads.iter().map(|p| p.len() + framing).sum::<usize>() + boundary.len() + 6;

    let mut buf = BytesMut::with_capacity(size);
    for payload in payloads {
        buf.put_slice(format!("--{}\r\n", boundary).as_bytes());
        buf.put_slice(format!("Content-Type: {}\r\n\r\n", APPLICATION_DICOM).as_bytes());
        buf.put_slice(payload);
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(format!("--{}--\r\n", boundary).as_bytes());

    (buf.freeze(), format_stow_content_type(boundary))
}

/// Decode a complete multipart body into its payloads, in wire order.
///
/// # Errors
///
/// Returns [`DicomwebError::MalformedMultipart`](crate::DicomwebError::MalformedMultipart)
/// on any framing error; no partial result is returned.
pub fn decode(body: &[u8], boundary: &str) -> Result<Vec<Bytes>> {
    Ok(decode_parts(body, boundary)?
        .into_iter()
        .map(|part| part.body)
        .collect())
}

/// Decode a complete multipart body into parts with their headers.
pub fn decode_parts(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    PartParser::parse_all(boundary, body)
}
