//! Authority response parser
//!
//! altool reports notarization state as free text, one `Field = value`
//! line per field. Extraction is best-effort: each field is matched
//! independently against its own line pattern and a missing or malformed
//! field is simply absent from the result. No single field aborts the
//! parse of the others.

use chrono::{DateTime, FixedOffset};
use regex_lite::Regex;

/// The literal altool prints for an absent log URL
const NULL_MARKER: &str = "(null)";

/// Timestamp format altool uses for the submission date
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Notarization state as reported by the authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotarizationStatus {
    InProgress,
    Success,
    Invalid,
    /// Any status string this client does not recognize
    Other(String),
}

impl NotarizationStatus {
    fn from_raw(raw: &str) -> Self {
        match raw {
            "in progress" => Self::InProgress,
            "success" => Self::Success,
            "invalid" => Self::Invalid,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for NotarizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in progress"),
            Self::Success => write!(f, "success"),
            Self::Invalid => write!(f, "invalid"),
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Parsed notarization record.
///
/// Transient: reconstructed from authority output on every poll, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotarizationInfo {
    pub request_uuid: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub status: Option<NotarizationStatus>,
    pub log_file_url: Option<String>,
    pub status_code: Option<i64>,
    pub status_message: Option<String>,
}

/// Extract the value of one `Field = value` (or `Field: value`) line.
///
/// Anchored to line starts so that `Status` never matches the
/// `Status Code` or `Status Message` lines.
fn capture_field(text: &str, field: &str) -> Option<String> {
    let pattern = format!(r"(?m)^\s*{}\s*[=:]\s*(.+?)\s*$", field);
    let re = Regex::new(&pattern).expect("field pattern is valid");
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse an altool response into a notarization record.
///
/// Field table per the authority's text format; each entry is applied
/// independently.
pub fn parse_notarization_info(text: &str) -> NotarizationInfo {
    NotarizationInfo {
        request_uuid: capture_field(text, "RequestUUID"),
        date: capture_field(text, "Date")
            .and_then(|v| DateTime::parse_from_str(&v, DATE_FORMAT).ok()),
        status: capture_field(text, "Status").map(|v| NotarizationStatus::from_raw(&v)),
        log_file_url: capture_field(text, "LogFileURL").filter(|v| v != NULL_MARKER),
        status_code: capture_field(text, "Status Code").and_then(|v| v.parse::<i64>().ok()),
        status_message: capture_field(text, "Status Message"),
    }
}
