//! Resource routing for QIDO-RS, WADO-RS and STOW-RS.
//!
//! Maps typed requests onto canonical resource paths and query strings. Every
//! check happens here, before the transport sees the request, so a malformed
//! request never reaches the network.
//!
//! # Paths
//!
//! | Request | Path |
//! |---------|------|
//! | QIDO study | `{base}/studies` |
//! | QIDO series | `{base}/studies/{study}/series` |
//! | QIDO instance | `{base}/studies/{study}/series/{series}/instances` |
//! | WADO raw | `{base}/studies/{study}[/series/{series}[/instances/{instance}]]` |
//! | WADO rendered | raw path + `/rendered` |
//! | WADO metadata | raw path + `/metadata` |
//! | WADO frame | instance path + `/frames/{frame}` |
//! | WADO URI reference | the retrieve URL, verbatim |
//! | STOW | `{base}/studies[/{study}]` |
//!
//! # Examples
//!
//! ```
//! use dicomweb_client::router::{route_query, route_retrieve, FilterPolicy};
//! use dicomweb_client::{QidoRequest, WadoRequest};
//!
//! let route = route_query("", &QidoRequest::series("study-id"), &FilterPolicy::default()).unwrap();
//! assert_eq!(route.path, "/studies/study-id/series");
//! assert!(route.query.is_empty());
//!
//! let route = route_retrieve("", &WadoRequest::frame("s", "se", "i", 1)).unwrap();
//! assert_eq!(route.path, "/studies/s/series/se/instances/i/frames/1");
//! ```

use crate::error::{DicomwebError, Result};
use crate::protocol::constants::paths;
use crate::protocol::tags;
use crate::types::{QidoRequest, QueryLevel, RetrieveKind, WadoRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::form_urlencoded;
use url::Url;

/// Filter keys that are never sent as QIDO-RS query parameters.
///
/// The default excludes the [echo attributes](tags::ECHO_ATTRIBUTES): the UIDs
/// that identify a resource in the path and are only used to match result
/// objects back to the request. [`FilterPolicy::pass_through`] excludes nothing.
/// The query level is a typed field and is never a filter under any policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeSet<String>", into = "BTreeSet<String>")]
pub struct FilterPolicy {
    excluded: BTreeSet<String>,
}

impl From<BTreeSet<String>> for FilterPolicy {
    fn from(keys: BTreeSet<String>) -> Self {
        FilterPolicy {
            excluded: keys.iter().map(|k| k.to_ascii_uppercase()).collect(),
        }
    }
}

impl From<FilterPolicy> for BTreeSet<String> {
    fn from(policy: FilterPolicy) -> Self {
        policy.excluded
    }
}

impl FilterPolicy {
    /// Exclude the echo attributes
    pub fn echo_attributes() -> Self {
        FilterPolicy {
            excluded: tags::ECHO_ATTRIBUTES
                .iter()
                .map(|tag| tag.to_ascii_uppercase())
                .collect(),
        }
    }

    /// Exclude nothing; every filter is sent
    pub fn pass_through() -> Self {
        FilterPolicy {
            excluded: BTreeSet::new(),
        }
    }

    /// Add a key to the exclusion table
    pub fn with_excluded(mut self, key: impl AsRef<str>) -> Self {
        self.excluded.insert(key.as_ref().to_ascii_uppercase());
        self
    }

    /// Whether `key` is dropped from the query string
    pub fn excludes(&self, key: &str) -> bool {
        self.excluded.contains(&key.to_ascii_uppercase())
    }

    /// Excluded keys, upper-cased
    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::echo_attributes()
    }
}

/// A routed request: full path plus encoded query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Base path joined with the resource path, or a verbatim URL
    pub path: String,
    /// `application/x-www-form-urlencoded` query, without the leading `?`
    pub query: String,
}

impl Route {
    /// Parse the route into an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`DicomwebError::Transport`] if the path is not a valid URL.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.path)?;
        if !self.query.is_empty() {
            url.set_query(Some(&self.query));
        }
        Ok(url)
    }
}

/// Route a QIDO-RS search.
///
/// # Errors
///
/// - [`DicomwebError::MissingQueryType`] if `level` is unset; checked first.
/// - [`DicomwebError::InvalidRequestShape`] if a series search has no study, or
///   an instance search has no study or series.
pub fn route_query(base: &str, request: &QidoRequest, policy: &FilterPolicy) -> Result<Route> {
    let level = request.level.ok_or(DicomwebError::MissingQueryType)?;

    let mut path = String::from(base);
    path.push_str(paths::STUDIES);
    match level {
        QueryLevel::Study => {}
        QueryLevel::Series => {
            require(&request.study_instance_uid, "series search requires a study")?;
            push_segment(&mut path, &request.study_instance_uid);
            path.push_str(paths::SERIES);
        }
        QueryLevel::Instance => {
            require(&request.study_instance_uid, "instance search requires a study")?;
            require(&request.series_instance_uid, "instance search requires a series")?;
            push_segment(&mut path, &request.study_instance_uid);
            path.push_str(paths::SERIES);
            push_segment(&mut path, &request.series_instance_uid);
            path.push_str(paths::INSTANCES);
        }
    }

    Ok(Route {
        path,
        query: query_string(request, policy),
    })
}

/// Encode the filters of a QIDO-RS search, skipping excluded keys.
///
/// Keys are emitted in sorted order.
pub fn query_string(request: &QidoRequest, policy: &FilterPolicy) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &request.filters {
        if policy.excludes(key) {
            continue;
        }
        serializer.append_pair(key, &value.render());
    }
    serializer.finish()
}

/// Route a WADO-RS retrieval.
///
/// Rendered kinds carry their [`RenderOptions`](crate::types::RenderOptions) in
/// the query string. A URI reference bypasses `base` entirely.
///
/// # Errors
///
/// Returns [`DicomwebError::InvalidRequestShape`] if
/// [`WadoRequest::validate`] fails.
pub fn route_retrieve(base: &str, request: &WadoRequest) -> Result<Route> {
    if !request.validate() {
        return Err(DicomwebError::InvalidRequestShape(request.kind.to_string()));
    }

    if request.kind == RetrieveKind::UriReference {
        return Ok(Route {
            path: request.retrieve_url.clone().unwrap_or_default(),
            query: String::new(),
        });
    }

    let rule = request.kind.shape();
    let mut path = String::from(base);
    path.push_str(paths::STUDIES);
    push_segment(&mut path, &request.study_instance_uid);
    if !request.series_instance_uid.is_empty() {
        path.push_str(paths::SERIES);
        push_segment(&mut path, &request.series_instance_uid);
    }
    if !request.sop_instance_uid.is_empty() {
        path.push_str(paths::INSTANCES);
        push_segment(&mut path, &request.sop_instance_uid);
    }
    if rule.frame {
        path.push_str(paths::FRAMES);
        push_segment(&mut path, &request.frame.to_string());
    }
    path.push_str(suffix(request.kind));

    let query = if request.kind.is_rendered() {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(request.render.query_pairs())
            .finish()
    } else {
        String::new()
    };

    Ok(Route { path, query })
}

/// Route a STOW-RS upload.
pub fn route_store(base: &str, study: Option<&str>) -> Route {
    let mut path = String::from(base);
    path.push_str(paths::STUDIES);
    if let Some(study) = study.filter(|s| !s.is_empty()) {
        push_segment(&mut path, study);
    }
    Route {
        path,
        query: String::new(),
    }
}

/// Path suffix appended after the resource identifiers.
fn suffix(kind: RetrieveKind) -> &'static str {
    match kind {
        RetrieveKind::StudyRendered
        | RetrieveKind::SeriesRendered
        | RetrieveKind::InstanceRendered => paths::RENDERED,
        RetrieveKind::SeriesMetadata | RetrieveKind::InstanceMetadata => paths::METADATA,
        RetrieveKind::StudyRaw
        | RetrieveKind::SeriesRaw
        | RetrieveKind::InstanceRaw
        | RetrieveKind::Frame
        | RetrieveKind::UriReference => "",
    }
}

fn push_segment(path: &mut String, segment: &str) {
    path.push('/');
    path.push_str(segment);
}

fn require(value: &str, msg: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DicomwebError::InvalidRequestShape(msg.to_string()));
    }
    Ok(())
}
