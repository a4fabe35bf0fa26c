//! DICOM attribute keys and QIDO-RS keywords.
//!
//! QIDO-RS filters are keyed either by an eight-digit hexadecimal tag
//! (`ggggeeee`) or by one of the reserved query keywords. Result objects use the
//! same tag keys in DICOM JSON.

/// Study Instance UID (0020,000D)
pub const STUDY_INSTANCE_UID: &str = "0020000D";
/// Series Instance UID (0020,000E)
pub const SERIES_INSTANCE_UID: &str = "0020000E";
/// SOP Instance UID (0008,0018)
pub const SOP_INSTANCE_UID: &str = "00080018";

/// Accession Number (0008,0050)
pub const ACCESSION_NUMBER: &str = "00080050";
/// Study Date (0008,0020)
pub const STUDY_DATE: &str = "00080020";
/// Modality (0008,0060)
pub const MODALITY: &str = "00080060";
/// Modalities in Study (0008,0061)
pub const MODALITIES_IN_STUDY: &str = "00080061";
/// Referring Physician's Name (0008,0090)
pub const REFERRING_PHYSICIAN_NAME: &str = "00080090";
/// Study Description (0008,1030)
pub const STUDY_DESCRIPTION: &str = "00081030";
/// Patient's Name (0010,0010)
pub const PATIENT_NAME: &str = "00100010";
/// Patient ID (0010,0020)
pub const PATIENT_ID: &str = "00100020";

/// Maximum number of results
pub const LIMIT: &str = "limit";
/// Number of results to skip
pub const OFFSET: &str = "offset";
/// Enable fuzzy matching of person names
pub const FUZZY_MATCHING: &str = "fuzzymatching";
/// Additional attributes to include in results
pub const INCLUDE_FIELD: &str = "includefield";

/// Attributes used to match result objects back to a request.
///
/// These identify the resource in the path and are never sent as filters by the
/// default [`FilterPolicy`](crate::router::FilterPolicy).
pub const ECHO_ATTRIBUTES: &[&str] = &[STUDY_INSTANCE_UID, SERIES_INSTANCE_UID, SOP_INSTANCE_UID];
