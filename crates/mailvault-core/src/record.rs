//! Input record model: one JSON document per exported email.

use serde::Deserialize;

/// Raw email-export record as found in the corpus.
///
/// Every field is optional in practice: absent fields deserialize to
/// empty/false/`None` rather than failing the record. `text_header`
/// is the free-text block the reconciliation pipeline extracts
/// identities from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    /// Free-text header block carrying the `From:`/`To:` conventions.
    #[serde(default)]
    pub text_header: String,
    /// Structured sender name.
    #[serde(default)]
    pub sender: String,
    /// Structured recipient names.
    #[serde(default)]
    pub recipients_to: Vec<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Full text of the exported email.
    #[serde(default)]
    pub text_full: String,
    /// Body text without the header block.
    #[serde(default)]
    pub text_body: String,
    /// Epoch seconds or a date-time string.
    #[serde(default)]
    pub timestamp: Option<TimestampValue>,
    /// Attachment filenames.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Sequence ids of records this one duplicates, or (for a
    /// canonical record) of its cluster members.
    #[serde(default)]
    pub duplicates: Vec<SequenceRef>,
    /// Explicit canonical flag.
    #[serde(default)]
    pub canonical: bool,
    /// Department attributed to the email itself.
    #[serde(default)]
    pub department: String,
    /// Source PDF reference from the export tooling.
    #[serde(default)]
    pub pdf: String,
    /// Bookmark reference from the export tooling.
    #[serde(default)]
    pub bookmark: String,
    /// Bookmark title from the export tooling.
    #[serde(default)]
    pub bookmark_title: String,
    /// Position of the email within its bookmark.
    #[serde(default)]
    pub email_n_in_bm: Option<String>,
}

/// Timestamp as written in the corpus: epoch seconds or date-time text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    /// Epoch seconds.
    Seconds(i64),
    /// Epoch seconds with a fractional part.
    Fractional(f64),
    /// A date-time string.
    Text(String),
}

/// A sequence-id reference written as a string or a bare number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SequenceRef {
    /// Zero-padded literal form, e.g. `"00042"`.
    Text(String),
    /// Bare numeric form.
    Number(i64),
}

impl SequenceRef {
    /// Literal text form used for duplicate linkage.
    #[must_use]
    pub fn as_literal(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(number) => number.to_string(),
        }
    }
}
