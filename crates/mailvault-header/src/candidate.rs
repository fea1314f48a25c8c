//! Extracted participant candidates and the shared name guard.

/// A participant identity extracted from a free-text header block.
///
/// The name is always present and trimmed; `email` and `department`
/// are only present when the matched format carried them and (for the
/// address) the value passed syntax validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantCandidate {
    /// Display name as written in the header.
    pub name: String,
    /// Validated address, if the format carried one.
    pub email: Option<String>,
    /// Department tag, if the format carried one.
    pub department: Option<String>,
}

/// Returns `true` when an extracted name is usable as a participant name.
///
/// Over-long names, names containing `@`, and names containing the
/// literal `Subject:` indicate a pattern misfire (the match swallowed
/// an adjacent header line or an address) and are never accepted.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    name.chars().count() <= 100 && !name.contains('@') && !name.contains("Subject:")
}
