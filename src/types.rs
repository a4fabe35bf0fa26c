//! Request and response types for QIDO-RS, WADO-RS and STOW-RS.
//!
//! | Type | Service | Description |
//! |------|---------|-------------|
//! | [`QidoRequest`] | QIDO-RS | Catalog search at study, series or instance level |
//! | [`QidoMatch`] | QIDO-RS | One DICOM JSON result object |
//! | [`WadoRequest`] | WADO-RS | Retrieval of one of ten [`RetrieveKind`]s |
//! | [`StowRequest`] | STOW-RS | Upload of one or more DICOM payloads |
//!
//! All values are built per call and carry no state across requests.
//!
//! # Examples
//!
//! ```
//! use dicomweb_client::{QidoRequest, RetrieveKind, WadoRequest};
//!
//! let query = QidoRequest::studies().accession_number("an").limit(1);
//! assert_eq!(query.filters.len(), 2);
//!
//! let frame = WadoRequest::frame("s", "se", "i", 1);
//! assert_eq!(frame.kind, RetrieveKind::Frame);
//! assert!(frame.validate());
//! ```

use crate::protocol::tags;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Level of a QIDO-RS catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryLevel {
    /// `/studies`
    Study,
    /// `/studies/{study}/series`
    Series,
    /// `/studies/{study}/series/{series}/instances`
    Instance,
}

/// Scalar value of a QIDO-RS filter parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Rendered without a fractional component
    Number(f64),
    /// Rendered as `true` / `false`
    Bool(bool),
    /// Passed through as-is before URL encoding
    Text(String),
}

impl FilterValue {
    /// Render the value as it appears in the query string (before encoding)
    pub fn render(&self) -> String {
        match self {
            FilterValue::Number(n) => format!("{:.0}", n),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Number(n)
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        FilterValue::Number(f64::from(n))
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Number(f64::from(n))
    }
}

/// A QIDO-RS catalog search.
///
/// `level` must be set before the request can be routed. The identifiers only
/// select the path; everything else travels in `filters`, keyed by the
/// protocol attribute name (a `ggggeeee` tag or a query keyword).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QidoRequest {
    /// Search level
    pub level: Option<QueryLevel>,
    /// Study Instance UID, required for series and instance searches
    pub study_instance_uid: String,
    /// Series Instance UID, required for instance searches
    pub series_instance_uid: String,
    /// Query parameters
    pub filters: BTreeMap<String, FilterValue>,
}

impl QidoRequest {
    /// Create a search at the given level
    pub fn new(level: QueryLevel) -> Self {
        QidoRequest {
            level: Some(level),
            ..Default::default()
        }
    }

    /// Search all studies
    pub fn studies() -> Self {
        Self::new(QueryLevel::Study)
    }

    /// Search the series of a study
    pub fn series(study: impl Into<String>) -> Self {
        Self::new(QueryLevel::Series).with_study(study)
    }

    /// Search the instances of a series
    pub fn instances(study: impl Into<String>, series: impl Into<String>) -> Self {
        Self::new(QueryLevel::Instance)
            .with_study(study)
            .with_series(series)
    }

    /// Set the Study Instance UID
    pub fn with_study(mut self, study: impl Into<String>) -> Self {
        self.study_instance_uid = study.into();
        self
    }

    /// Set the Series Instance UID
    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series_instance_uid = series.into();
        self
    }

    /// Add an arbitrary filter parameter
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Match on Accession Number
    pub fn accession_number(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::ACCESSION_NUMBER, value.into())
    }

    /// Match on Patient's Name
    pub fn patient_name(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::PATIENT_NAME, value.into())
    }

    /// Match on Patient ID
    pub fn patient_id(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::PATIENT_ID, value.into())
    }

    /// Match on Study Date (`YYYYMMDD` or a `YYYYMMDD-YYYYMMDD` range)
    pub fn study_date(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::STUDY_DATE, value.into())
    }

    /// Match on Modality (series and instance level)
    pub fn modality(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::MODALITY, value.into())
    }

    /// Match on Modalities in Study (study level)
    pub fn modalities_in_study(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::MODALITIES_IN_STUDY, value.into())
    }

    /// Match on Study Description
    pub fn study_description(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::STUDY_DESCRIPTION, value.into())
    }

    /// Match on Referring Physician's Name
    pub fn referring_physician_name(self, value: impl Into<String>) -> Self {
        self.with_filter(tags::REFERRING_PHYSICIAN_NAME, value.into())
    }

    /// Limit the number of results
    pub fn limit(self, limit: u32) -> Self {
        self.with_filter(tags::LIMIT, limit)
    }

    /// Skip the first `offset` results
    pub fn offset(self, offset: u32) -> Self {
        self.with_filter(tags::OFFSET, offset)
    }

    /// Enable or disable fuzzy person-name matching
    pub fn fuzzy_matching(self, enabled: bool) -> Self {
        self.with_filter(tags::FUZZY_MATCHING, enabled)
    }

    /// Ask for additional attributes (a tag, a keyword or `all`)
    pub fn include_field(self, field: impl Into<String>) -> Self {
        self.with_filter(tags::INCLUDE_FIELD, field.into())
    }
}

/// The ten WADO-RS retrieval shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrieveKind {
    /// All instances of a study
    StudyRaw,
    /// Rendered study
    StudyRendered,
    /// All instances of a series
    SeriesRaw,
    /// Rendered series
    SeriesRendered,
    /// DICOM JSON metadata of a series
    SeriesMetadata,
    /// A single instance
    InstanceRaw,
    /// Rendered instance
    InstanceRendered,
    /// DICOM JSON metadata of an instance
    InstanceMetadata,
    /// One frame of a multi-frame instance
    Frame,
    /// A URL taken verbatim, e.g. from a Retrieve URL attribute
    UriReference,
}

impl RetrieveKind {
    /// All retrieval kinds
    pub const ALL: [RetrieveKind; 10] = [
        RetrieveKind::StudyRaw,
        RetrieveKind::StudyRendered,
        RetrieveKind::SeriesRaw,
        RetrieveKind::SeriesRendered,
        RetrieveKind::SeriesMetadata,
        RetrieveKind::InstanceRaw,
        RetrieveKind::InstanceRendered,
        RetrieveKind::InstanceMetadata,
        RetrieveKind::Frame,
        RetrieveKind::UriReference,
    ];

    /// Field rule for this kind.
    pub fn shape(self) -> ShapeRule {
        use Presence::{Forbidden, Ignored, Required};
        let (study, series, instance, frame, direct_url) = match self {
            RetrieveKind::StudyRaw | RetrieveKind::StudyRendered => {
                (Required, Forbidden, Forbidden, false, false)
            }
            RetrieveKind::SeriesRaw
            | RetrieveKind::SeriesRendered
            | RetrieveKind::SeriesMetadata => (Required, Required, Forbidden, false, false),
            RetrieveKind::InstanceRaw
            | RetrieveKind::InstanceRendered
            | RetrieveKind::InstanceMetadata => (Required, Required, Required, false, false),
            RetrieveKind::Frame => (Required, Required, Required, true, false),
            RetrieveKind::UriReference => (Ignored, Ignored, Ignored, false, true),
        };
        ShapeRule {
            study,
            series,
            instance,
            frame,
            direct_url,
        }
    }

    /// Whether this kind asks for a rendered representation
    pub fn is_rendered(self) -> bool {
        matches!(
            self,
            RetrieveKind::StudyRendered
                | RetrieveKind::SeriesRendered
                | RetrieveKind::InstanceRendered
        )
    }
}

impl fmt::Display for RetrieveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetrieveKind::StudyRaw => "study",
            RetrieveKind::StudyRendered => "study rendered",
            RetrieveKind::SeriesRaw => "series",
            RetrieveKind::SeriesRendered => "series rendered",
            RetrieveKind::SeriesMetadata => "series metadata",
            RetrieveKind::InstanceRaw => "instance",
            RetrieveKind::InstanceRendered => "instance rendered",
            RetrieveKind::InstanceMetadata => "instance metadata",
            RetrieveKind::Frame => "frame",
            RetrieveKind::UriReference => "URI reference",
        };
        f.write_str(name)
    }
}

/// Whether an identifier must, must not, or may be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be non-empty
    Required,
    /// Must be empty
    Forbidden,
    /// Not checked
    Ignored,
}

impl Presence {
    fn admits(self, value: &str) -> bool {
        match self {
            Presence::Required => !value.is_empty(),
            Presence::Forbidden => value.is_empty(),
            Presence::Ignored => true,
        }
    }
}

/// Identifier rule of a [`RetrieveKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeRule {
    /// Study Instance UID
    pub study: Presence,
    /// Series Instance UID
    pub series: Presence,
    /// SOP Instance UID
    pub instance: Presence,
    /// Frame number must be non-zero
    pub frame: bool,
    /// Retrieve URL must be set
    pub direct_url: bool,
}

/// Query parameters of a rendered retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Burned-in annotation, e.g. `patient,technique`
    pub annotation: Option<String>,
    /// Lossy quality, 1-100
    pub quality: Option<u8>,
    /// Viewport, `vw,vh[,sx,sy,sw,sh]`
    pub viewport: Option<String>,
    /// Windowing, `center,width,function`
    pub window: Option<String>,
}

impl RenderOptions {
    /// Query pairs in a stable order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(annotation) = &self.annotation {
            pairs.push(("annotation", annotation.clone()));
        }
        if let Some(quality) = self.quality {
            pairs.push(("quality", quality.to_string()));
        }
        if let Some(viewport) = &self.viewport {
            pairs.push(("viewport", viewport.clone()));
        }
        if let Some(window) = &self.window {
            pairs.push(("window", window.clone()));
        }
        pairs
    }

    /// Whether no option is set
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

/// A WADO-RS retrieval.
///
/// Identifiers are empty strings when absent; [`WadoRequest::validate`]
/// checks them against the kind's [`ShapeRule`].
#[derive(Debug, Clone, PartialEq)]
pub struct WadoRequest {
    /// Retrieval shape
    pub kind: RetrieveKind,
    /// Study Instance UID
    pub study_instance_uid: String,
    /// Series Instance UID
    pub series_instance_uid: String,
    /// SOP Instance UID
    pub sop_instance_uid: String,
    /// Frame number, 1-based; 0 means unset
    pub frame: u32,
    /// Verbatim URL for [`RetrieveKind::UriReference`]
    pub retrieve_url: Option<String>,
    /// Options for rendered kinds
    pub render: RenderOptions,
}

impl WadoRequest {
    /// Create an empty request of the given kind
    pub fn new(kind: RetrieveKind) -> Self {
        WadoRequest {
            kind,
            study_instance_uid: String::new(),
            series_instance_uid: String::new(),
            sop_instance_uid: String::new(),
            frame: 0,
            retrieve_url: None,
            render: RenderOptions::default(),
        }
    }

    /// Retrieve a whole study
    pub fn study(study: impl Into<String>) -> Self {
        Self::new(RetrieveKind::StudyRaw).with_study(study)
    }

    /// Retrieve a whole series
    pub fn series(study: impl Into<String>, series: impl Into<String>) -> Self {
        Self::new(RetrieveKind::SeriesRaw)
            .with_study(study)
            .with_series(series)
    }

    /// Retrieve one instance
    pub fn instance(
        study: impl Into<String>,
        series: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self::new(RetrieveKind::InstanceRaw)
            .with_study(study)
            .with_series(series)
            .with_instance(instance)
    }

    /// Retrieve one frame
    pub fn frame(
        study: impl Into<String>,
        series: impl Into<String>,
        instance: impl Into<String>,
        frame: u32,
    ) -> Self {
        Self::instance(study, series, instance)
            .with_kind(RetrieveKind::Frame)
            .with_frame(frame)
    }

    /// Retrieve from a verbatim URL
    pub fn uri_reference(url: impl Into<String>) -> Self {
        Self::new(RetrieveKind::UriReference).with_retrieve_url(url)
    }

    /// Change the retrieval kind
    pub fn with_kind(mut self, kind: RetrieveKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the Study Instance UID
    pub fn with_study(mut self, study: impl Into<String>) -> Self {
        self.study_instance_uid = study.into();
        self
    }

    /// Set the Series Instance UID
    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series_instance_uid = series.into();
        self
    }

    /// Set the SOP Instance UID
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.sop_instance_uid = instance.into();
        self
    }

    /// Set the frame number
    pub fn with_frame(mut self, frame: u32) -> Self {
        self.frame = frame;
        self
    }

    /// Set the verbatim retrieve URL
    pub fn with_retrieve_url(mut self, url: impl Into<String>) -> Self {
        self.retrieve_url = Some(url.into());
        self
    }

    /// Set rendering options
    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Check the identifiers against the kind's [`ShapeRule`].
    ///
    /// Pure; called before any URL is built.
    pub fn validate(&self) -> bool {
        let rule = self.kind.shape();
        rule.study.admits(&self.study_instance_uid)
            && rule.series.admits(&self.series_instance_uid)
            && rule.instance.admits(&self.sop_instance_uid)
            && (!rule.frame || self.frame != 0)
            && (!rule.direct_url || self.retrieve_url.as_deref().is_some_and(|u| !u.is_empty()))
    }
}

/// A STOW-RS upload.
///
/// `parts` may be empty; the encoded body is then a multipart body with zero
/// parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StowRequest {
    /// Target study, if the upload is restricted to one
    pub study_instance_uid: Option<String>,
    /// DICOM payloads in transmission order
    pub parts: Vec<Bytes>,
}

impl StowRequest {
    /// Create an empty upload
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an upload from a list of payloads
    pub fn from_parts<I, B>(parts: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        StowRequest {
            study_instance_uid: None,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Restrict the upload to a study
    pub fn with_study(mut self, study: impl Into<String>) -> Self {
        self.study_instance_uid = Some(study.into());
        self
    }

    /// Append a payload
    pub fn with_part(mut self, part: impl Into<Bytes>) -> Self {
        self.parts.push(part.into());
        self
    }
}

/// One attribute of a DICOM JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DicomAttribute {
    /// Value representation, e.g. `UI`, `PN`
    pub vr: String,
    /// Values; absent for empty attributes
    #[serde(rename = "Value", default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<serde_json::Value>,
}

/// One QIDO-RS result: a DICOM JSON object keyed by tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QidoMatch(pub BTreeMap<String, DicomAttribute>);

impl QidoMatch {
    /// Look up an attribute by tag (case-insensitive hex)
    pub fn attribute(&self, tag: &str) -> Option<&DicomAttribute> {
        self.0
            .get(tag)
            .or_else(|| self.0.get(&tag.to_ascii_uppercase()))
    }

    /// First value of an attribute if it is a string
    pub fn first_string(&self, tag: &str) -> Option<&str> {
        self.attribute(tag)?.value.first()?.as_str()
    }

    /// Study Instance UID of the match
    pub fn study_instance_uid(&self) -> Option<&str> {
        self.first_string(tags::STUDY_INSTANCE_UID)
    }

    /// Series Instance UID of the match
    pub fn series_instance_uid(&self) -> Option<&str> {
        self.first_string(tags::SERIES_INSTANCE_UID)
    }

    /// SOP Instance UID of the match
    pub fn sop_instance_uid(&self) -> Option<&str> {
        self.first_string(tags::SOP_INSTANCE_UID)
    }
}
