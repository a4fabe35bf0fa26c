//! `Content-Type` parsing and formatting for DICOMweb.
//!
//! Parses media types with parameters following RFC 2045 / RFC 7231 syntax and
//! decides how a retrieval response body must be decoded.
//!
//! # Header Formats
//!
//! | Use | Format | Example |
//! |-----|--------|---------|
//! | WADO-RS response | `multipart/related; type=...; boundary=...[; start=...]` | `multipart/related; type="application/dicom"; boundary=TOAST` |
//! | Single-part response | any non-multipart media type | `application/dicom` |
//! | STOW-RS request | `multipart/related; type="application/dicom"; boundary=...` | see [`format_stow_content_type`] |
//!
//! # Examples
//!
//! ```
//! use dicomweb_client::protocol::{parse_media_type, format_stow_content_type};
//!
//! let media = parse_media_type("multipart/related; type=\"application/dicom\"; boundary=TOAST").unwrap();
//! assert_eq!(media.essence, "multipart/related");
//! assert_eq!(media.param("type"), Some("application/dicom"));
//!
//! let header = format_stow_content_type("TOAST");
//! assert_eq!(header, "multipart/related; type=\"application/dicom\"; boundary=TOAST");
//! ```

use super::constants::APPLICATION_DICOM;
use crate::error::{DicomwebError, Result};
use std::collections::BTreeMap;

/// A parsed media type: lower-cased `type/subtype` plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// `type/subtype`, lower-cased
    pub essence: String,
    /// Parameters keyed by lower-cased name, values unquoted
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Look up a parameter by (case-insensitive) name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Whether the top-level type is `multipart`
    pub fn is_multipart(&self) -> bool {
        self.essence.starts_with("multipart/")
    }
}

/// Framing parameters of a multipart response.
///
/// Derived from the response's `Content-Type` for one decode and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartEnvelope {
    /// Full multipart media type, e.g. `multipart/related`
    pub media_type: String,
    /// Boundary token separating the parts
    pub boundary: String,
    /// Content-ID of the root part, when the `start` parameter is present.
    ///
    /// Carried as metadata only; parts are always returned in wire order.
    pub start: Option<String>,
    /// Media type of the root part from the `type` parameter
    pub root_type: Option<String>,
}

/// How a retrieval response body must be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Boundary-framed body
    Multipart(MultipartEnvelope),
    /// The whole body is one opaque payload
    Single {
        /// Media type the server declared for the body
        media_type: String,
    },
}

/// Parse a `Content-Type` header value into a [`MediaType`].
///
/// # Errors
///
/// Returns [`DicomwebError::MalformedContentType`] if the value has no
/// `type/subtype`, a parameter has no `=`, a quoted string is unterminated, or a
/// parameter name appears twice.
pub fn parse_media_type(value: &str) -> Result<MediaType> {
    let segments = split_params(value)?;
    let mut iter = segments.into_iter();

    let essence = iter
        .next()
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let valid_essence = match essence.split_once('/') {
        Some((top, sub)) => is_token(top) && is_token(sub),
        None => false,
    };
    if !valid_essence {
        return Err(DicomwebError::MalformedContentType(format!(
            "expected 'type/subtype', got '{}'",
            value
        )));
    }

    let mut params = BTreeMap::new();
    for segment in iter {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (name, raw) = segment.split_once('=').ok_or_else(|| {
            DicomwebError::MalformedContentType(format!("parameter without value: '{}'", segment))
        })?;
        let name = name.trim().to_ascii_lowercase();
        if !is_token(&name) {
            return Err(DicomwebError::MalformedContentType(format!(
                "invalid parameter name: '{}'",
                name
            )));
        }
        let value = unquote(raw.trim())?;
        if params.insert(name.clone(), value).is_some() {
            return Err(DicomwebError::MalformedContentType(format!(
                "duplicate parameter: '{}'",
                name
            )));
        }
    }

    Ok(MediaType { essence, params })
}

/// Decide how to decode a response from its `Content-Type` header.
///
/// Non-multipart media types yield [`ResponseBody::Single`]: some servers omit
/// multipart framing for single-part responses. Multipart types must carry a
/// `boundary` parameter.
///
/// # Errors
///
/// Returns [`DicomwebError::MalformedContentType`] if the header is missing or
/// unparsable, or if a multipart type has no (or an empty) boundary. Any other
/// token or quoted-string value is accepted.
pub fn classify(content_type: Option<&str>) -> Result<ResponseBody> {
    let header = content_type
        .ok_or_else(|| DicomwebError::MalformedContentType("missing Content-Type header".into()))?;
    let media = parse_media_type(header)?;

    if !media.is_multipart() {
        return Ok(ResponseBody::Single {
            media_type: media.essence,
        });
    }

    let boundary = match media.param("boundary") {
        Some(b) if !b.is_empty() => b.to_string(),
        _ => {
            return Err(DicomwebError::MalformedContentType(format!(
                "missing boundary parameter in '{}'",
                header
            )))
        }
    };

    Ok(ResponseBody::Multipart(MultipartEnvelope {
        boundary,
        start: media.param("start").map(str::to_string),
        root_type: media.param("type").map(str::to_string),
        media_type: media.essence,
    }))
}

/// Format the `Content-Type` of a STOW-RS request body.
///
/// The `type` parameter is quoted because `/` is not allowed in an unquoted
/// parameter value (RFC 2045).
pub fn format_stow_content_type(boundary: &str) -> String {
    format!(
        "multipart/related; type=\"{}\"; boundary={}",
        APPLICATION_DICOM, boundary
    )
}

/// Check a boundary against RFC 2046: 1-70 `bchars`, not ending in a space.
pub fn is_valid_boundary(boundary: &str) -> bool {
    const SPECIALS: &[u8] = b"'()+_,-./:=? ";
    let bytes = boundary.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= 70
        && !boundary.ends_with(' ')
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || SPECIALS.contains(b))
}

/// Split on `;` outside quoted strings.
fn split_params(value: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(DicomwebError::MalformedContentType(format!(
            "unterminated quoted string in '{}'",
            value
        )));
    }
    segments.push(&value[start..]);
    Ok(segments)
}

fn unquote(raw: &str) -> Result<String> {
    let Some(inner) = raw.strip_prefix('"') else {
        // Lenient: servers send unquoted values such as `start=<root>`.
        if raw.is_empty() || raw.contains(|c: char| c.is_whitespace() || c == '"') {
            return Err(DicomwebError::MalformedContentType(format!(
                "invalid parameter value: '{}'",
                raw
            )));
        }
        return Ok(raw.to_string());
    };
    let inner = inner.strip_suffix('"').ok_or_else(|| {
        DicomwebError::MalformedContentType(format!("unterminated quoted string: '{}'", raw))
    })?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// RFC 2045 token: printable ASCII minus spaces and tspecials.
fn is_token(s: &str) -> bool {
    const TSPECIALS: &[u8] = b"()<>@,;:\\\"/[]?=";
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_graphic() && !TSPECIALS.contains(&b))
}
