//! Participant model: a deduplicated sender/recipient identity.

/// Identifier of a participant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub i64);

/// A deduplicated identity that sends or receives archived email.
///
/// Identity is keyed by exact name or exact address: a lookup that
/// matches either refers to the same participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Row id.
    pub id: ParticipantId,
    /// Cleaned display name.
    pub name: String,
    /// Address, when one was supplied and passed syntax validation.
    pub email: Option<String>,
    /// Whether a syntactically valid address is stored.
    pub email_valid: bool,
    /// Department tag, if known.
    pub department: Option<String>,
}
