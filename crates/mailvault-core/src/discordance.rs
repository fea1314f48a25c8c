//! Disagreement reports between structured fields and header text.
//!
//! The export corpus carries identities twice: once as structured
//! fields and once inside the free-text header block. When the two
//! disagree, the disagreement is recorded on the email rather than
//! silently resolved.

use serde::{Deserialize, Serialize};

use mailvault_header::ParticipantCandidate;

/// Identity as extracted from the header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedParty {
    /// Extracted display name.
    pub name: String,
    /// Extracted address, if present.
    pub email: Option<String>,
}

impl From<&ParticipantCandidate> for ExtractedParty {
    fn from(candidate: &ParticipantCandidate) -> Self {
        Self {
            name: candidate.name.clone(),
            email: candidate.email.clone(),
        }
    }
}

/// Disagreement between the structured sender and the extracted sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderDiscordance {
    /// Sender name as given in the structured field.
    pub json_sender: String,
    /// Sender as extracted from the header block.
    pub extracted_sender: ExtractedParty,
}

/// Header-extracted recipients with no structured counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDiscordance {
    /// Extracted recipients absent from the structured list.
    pub missing_from_json: Vec<ExtractedParty>,
}

/// Compares the structured sender name against the extracted candidate.
///
/// Only evaluated when both exist; the comparison is raw and
/// case-sensitive, and equal strings produce no report.
#[must_use]
pub fn detect_sender(
    json_name: Option<&str>,
    candidate: Option<&ParticipantCandidate>,
) -> Option<SenderDiscordance> {
    let json_name = json_name?;
    let candidate = candidate?;
    if json_name == candidate.name {
        return None;
    }
    Some(SenderDiscordance {
        json_sender: json_name.to_string(),
        extracted_sender: ExtractedParty::from(candidate),
    })
}

/// Reports header-extracted recipients the structured list never
/// mentions.
///
/// Matching is a case-insensitive substring test of the extracted name
/// against each structured entry, and only runs when both lists are
/// non-empty. Intentionally one-directional: structured-only
/// recipients are not reported, because the failure mode this targets
/// is the header carrying more recipients than the structured field.
#[must_use]
pub fn detect_recipients(
    json_names: &[String],
    candidates: &[ParticipantCandidate],
) -> Option<RecipientDiscordance> {
    if json_names.is_empty() || candidates.is_empty() {
        return None;
    }

    let missing: Vec<ExtractedParty> = candidates
        .iter()
        .filter(|candidate| {
            let needle = candidate.name.trim().to_lowercase();
            !json_names
                .iter()
                .any(|json| json.trim().to_lowercase().contains(&needle))
        })
        .map(ExtractedParty::from)
        .collect();

    (!missing.is_empty()).then_some(RecipientDiscordance {
        missing_from_json: missing,
    })
}
