//! Request hooks.
//!
//! A hook is a function `Request -> Result<Request>` run just before a request
//! is transmitted. Hooks run in registration order; the first error aborts the
//! request and later hooks do not run. They see the request after the
//! configured `Authorization` header has been attached, so a hook can replace
//! it.
//!
//! # Examples
//!
//! ```
//! use dicomweb_client::client::{ClientConfig, RequestHooks};
//! use reqwest::header::{HeaderValue, AUTHORIZATION};
//!
//! let config = ClientConfig::new("https://pacs.example").with_hook(|mut req| {
//!     req.headers_mut()
//!         .insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
//!     Ok(req)
//! });
//! assert_eq!(config.hooks.len(), 1);
//! ```

use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// A shared request hook
pub type RequestHook = Arc<dyn Fn(reqwest::Request) -> Result<reqwest::Request> + Send + Sync>;

/// Ordered list of request hooks.
#[derive(Clone, Default)]
pub struct RequestHooks {
    hooks: Vec<RequestHook>,
}

impl RequestHooks {
    /// Create an empty hook list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook
    pub fn push<F>(&mut self, hook: F)
    where
        F: Fn(reqwest::Request) -> Result<reqwest::Request> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    /// Append an already shared hook
    pub fn push_shared(&mut self, hook: RequestHook) {
        self.hooks.push(hook);
    }

    /// Number of hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether there are no hooks
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook in order, stopping at the first error
    pub fn apply(&self, request: reqwest::Request) -> Result<reqwest::Request> {
        self.hooks.iter().try_fold(request, |req, hook| hook(req))
    }
}

impl fmt::Debug for RequestHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHooks")
            .field("len", &self.hooks.len())
            .finish()
    }
}
