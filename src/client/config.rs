//! Client configuration.
//!
//! [`ClientConfig`] is an immutable value: builder methods consume and return
//! it, and [`DicomwebClient::new`](crate::DicomwebClient::new) takes ownership
//! of it. Variants such as insecure TLS are plain fields rather than calls that
//! mutate a live client.
//!
//! # Examples
//!
//! ```
//! use dicomweb_client::client::ClientConfig;
//!
//! let config = ClientConfig::new("https://pacs.example/dicom-web")
//!     .with_basic_auth("user", "password")
//!     .with_timeout_ms(30_000);
//! assert_eq!(config.authorization.as_deref(), Some("Basic dXNlcjpwYXNzd29yZA=="));
//!
//! let config = ClientConfig::from_toml_str(r#"
//!     qido_endpoint = "https://pacs.example/qido"
//!     wado_endpoint = "https://pacs.example/wado"
//!     insecure = true
//! "#).unwrap();
//! assert!(config.insecure);
//! ```

use super::hooks::{RequestHook, RequestHooks};
use super::utils::basic_authorization;
use crate::error::{DicomwebError, Result};
use crate::protocol::constants::DEFAULT_BOUNDARY;
use crate::protocol::is_valid_boundary;
use crate::router::FilterPolicy;
use serde::Deserialize;

/// What to do with a retrieval response that is not multipart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinglePartPolicy {
    /// Return the whole body as a one-element payload list
    #[default]
    Accept,
    /// Fail with `UnsupportedContentType`
    Reject,
}

/// Configuration of a [`DicomwebClient`](crate::DicomwebClient).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for QIDO-RS searches
    pub qido_endpoint: String,
    /// Base URL for WADO-RS retrievals
    pub wado_endpoint: String,
    /// Base URL for STOW-RS uploads
    pub stow_endpoint: String,
    /// Value of the `Authorization` header; not sent when empty
    pub authorization: Option<String>,
    /// Skip TLS certificate verification. Do not use in production.
    pub insecure: bool,
    /// Boundary token for STOW-RS bodies
    pub boundary: String,
    /// Per-request timeout; none by default
    pub request_timeout_ms: Option<u64>,
    /// QIDO-RS filter exclusion table
    pub filter_policy: FilterPolicy,
    /// Handling of non-multipart retrieval responses
    pub single_part: SinglePartPolicy,
    /// Emit `tracing` events for requests and responses
    pub enable_logging: bool,
    /// Request hooks, applied in order before each request is sent
    #[serde(skip)]
    pub hooks: RequestHooks,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            qido_endpoint: String::new(),
            wado_endpoint: String::new(),
            stow_endpoint: String::new(),
            authorization: None,
            insecure: false,
            boundary: DEFAULT_BOUNDARY.to_string(),
            request_timeout_ms: None,
            filter_policy: FilterPolicy::default(),
            single_part: SinglePartPolicy::default(),
            enable_logging: true,
            hooks: RequestHooks::default(),
        }
    }
}

impl ClientConfig {
    /// Use the same base URL for QIDO-RS, WADO-RS and STOW-RS
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        ClientConfig {
            qido_endpoint: endpoint.clone(),
            wado_endpoint: endpoint.clone(),
            stow_endpoint: endpoint,
            ..Default::default()
        }
    }

    /// Load configuration from TOML and validate it
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DicomwebError::Config`] if the boundary is not a valid RFC 2046
    /// boundary.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_boundary(&self.boundary) {
            return Err(DicomwebError::config(format!(
                "invalid multipart boundary: '{}'",
                self.boundary
            )));
        }
        Ok(())
    }

    /// Set the QIDO-RS base URL
    pub fn with_qido_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.qido_endpoint = endpoint.into();
        self
    }

    /// Set the WADO-RS base URL
    pub fn with_wado_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.wado_endpoint = endpoint.into();
        self
    }

    /// Set the STOW-RS base URL
    pub fn with_stow_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.stow_endpoint = endpoint.into();
        self
    }

    /// Send `value` verbatim as the `Authorization` header
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// HTTP Basic authentication
    pub fn with_basic_auth(self, user: &str, password: &str) -> Self {
        self.with_authorization(basic_authorization(user, password))
    }

    /// Bearer token authentication
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_authorization(format!("Bearer {}", token))
    }

    /// Skip TLS certificate verification
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Use a different STOW-RS boundary token
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Set a per-request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    /// Replace the QIDO-RS filter exclusion table
    pub fn with_filter_policy(mut self, policy: FilterPolicy) -> Self {
        self.filter_policy = policy;
        self
    }

    /// Choose how non-multipart retrieval responses are handled
    pub fn with_single_part_policy(mut self, policy: SinglePartPolicy) -> Self {
        self.single_part = policy;
        self
    }

    /// Enable or disable request logging
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Append a request hook
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(reqwest::Request) -> Result<reqwest::Request> + Send + Sync + 'static,
    {
        self.hooks.push(hook);
        self
    }

    /// Append an already shared request hook
    pub fn with_shared_hook(mut self, hook: RequestHook) -> Self {
        self.hooks.push_shared(hook);
        self
    }
}
