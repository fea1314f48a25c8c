//! Email record model and its owned links.

use chrono::{DateTime, Utc};

use crate::discordance::{RecipientDiscordance, SenderDiscordance};
use crate::participant::ParticipantId;

/// Identifier of an email row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmailId(pub i64);

/// A normalized email record.
///
/// Created once per input file; after creation only the discordance
/// reports and canonical flag are ever touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRecord {
    /// Row id.
    pub id: EmailId,
    /// Zero-padded sequence id from the source filename.
    pub seq_id: String,
    /// Subject line.
    pub subject: String,
    /// Full text of the exported email.
    pub text_full: String,
    /// Body text without the header block.
    pub text_body: String,
    /// Free-text header block.
    pub text_header: String,
    /// The one resolved sender.
    pub sender_id: ParticipantId,
    /// Parsed timestamp, or the import-time fallback.
    pub timestamp: DateTime<Utc>,
    /// Whether the record listed any attachments. Derived, never set
    /// independently.
    pub has_attachments: bool,
    /// Department attributed to the email itself.
    pub department: String,
    /// Source PDF reference from the export tooling.
    pub pdf: String,
    /// Bookmark reference from the export tooling.
    pub bookmark: String,
    /// Bookmark title from the export tooling.
    pub bookmark_title: String,
    /// Position of the email within its bookmark.
    pub email_n_in_bm: Option<String>,
    /// Whether this email is the canonical representative of its
    /// duplicate cluster.
    pub is_canonical: bool,
    /// Recorded sender disagreement, if any.
    pub sender_discordance: Option<SenderDiscordance>,
    /// Recorded recipient disagreement, if any.
    pub recipient_discordance: Option<RecipientDiscordance>,
    /// Filename the record was imported from.
    pub source_file: String,
}

/// Field values for a new email row, produced by the record builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmail {
    /// Zero-padded sequence id from the source filename.
    pub seq_id: String,
    /// Subject line, trimmed.
    pub subject: String,
    /// Full text, trimmed.
    pub text_full: String,
    /// Body text, trimmed.
    pub text_body: String,
    /// Header block, trimmed.
    pub text_header: String,
    /// The one resolved sender.
    pub sender_id: ParticipantId,
    /// Parsed timestamp, or the clock fallback.
    pub timestamp: DateTime<Utc>,
    /// Whether the record listed any attachments.
    pub has_attachments: bool,
    /// Department attributed to the email itself.
    pub department: String,
    /// Source PDF reference.
    pub pdf: String,
    /// Bookmark reference.
    pub bookmark: String,
    /// Bookmark title.
    pub bookmark_title: String,
    /// Position of the email within its bookmark.
    pub email_n_in_bm: Option<String>,
    /// Canonical flag as carried by the input record.
    pub is_canonical: bool,
    /// Sender disagreement to record, if any.
    pub sender_discordance: Option<SenderDiscordance>,
    /// Recipient disagreement to record, if any.
    pub recipient_discordance: Option<RecipientDiscordance>,
    /// Filename the record is being imported from.
    pub source_file: String,
}

impl NewEmail {
    /// Completes the row with its assigned id.
    #[must_use]
    pub fn into_record(self, id: EmailId) -> EmailRecord {
        EmailRecord {
            id,
            seq_id: self.seq_id,
            subject: self.subject,
            text_full: self.text_full,
            text_body: self.text_body,
            text_header: self.text_header,
            sender_id: self.sender_id,
            timestamp: self.timestamp,
            has_attachments: self.has_attachments,
            department: self.department,
            pdf: self.pdf,
            bookmark: self.bookmark,
            bookmark_title: self.bookmark_title,
            email_n_in_bm: self.email_n_in_bm,
            is_canonical: self.is_canonical,
            sender_discordance: self.sender_discordance,
            recipient_discordance: self.recipient_discordance,
            source_file: self.source_file,
        }
    }
}

/// Link between an email and one recipient participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientLink {
    /// Owning email.
    pub email_id: EmailId,
    /// Linked participant.
    pub participant_id: ParticipantId,
    /// Whether the participant was carbon-copied.
    pub is_cc: bool,
}

/// Attachment filename recorded against an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Owning email.
    pub email_id: EmailId,
    /// Attachment filename, trimmed.
    pub filename: String,
}
