//! Utility functions for the DICOMweb client.
//!
//! - `Authorization` header values
//! - Status code classification and status lines

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;

/// Build an HTTP Basic `Authorization` value.
///
/// # Examples
///
/// ```
/// use dicomweb_client::client::basic_authorization;
///
/// assert_eq!(basic_authorization("user", "password"), "Basic dXNlcjpwYXNzd29yZA==");
/// ```
pub fn basic_authorization(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}

/// Check if status code is 2xx
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Status line as servers print it, e.g. `500 Internal Server Error`
pub fn status_line(status: StatusCode) -> String {
    status.to_string()
}
