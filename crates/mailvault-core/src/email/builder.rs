//! Assembly of the normalized email row from a raw record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use super::model::NewEmail;
use crate::discordance::{RecipientDiscordance, SenderDiscordance};
use crate::participant::Participant;
use crate::record::{RawRecord, TimestampValue};
use crate::time::Clock;

/// Maps a raw export record onto email row values.
///
/// Every text field is trimmed; `has_attachments` is derived from the
/// attachments list; a timestamp that fails to parse falls back to the
/// injected clock with a logged warning, never an error.
pub struct EmailRecordBuilder<'a> {
    clock: &'a dyn Clock,
}

impl<'a> EmailRecordBuilder<'a> {
    /// Creates a builder using the given clock for the timestamp
    /// fallback.
    #[must_use]
    pub const fn new(clock: &'a dyn Clock) -> Self {
        Self { clock }
    }

    /// Builds the row values for one record.
    #[must_use]
    pub fn build(
        &self,
        record: &RawRecord,
        sender: &Participant,
        filename: &str,
        seq_id: &str,
        sender_discordance: Option<SenderDiscordance>,
        recipient_discordance: Option<RecipientDiscordance>,
    ) -> NewEmail {
        NewEmail {
            seq_id: seq_id.trim().to_string(),
            subject: record.subject.trim().to_string(),
            text_full: record.text_full.trim().to_string(),
            text_body: record.text_body.trim().to_string(),
            text_header: record.text_header.trim().to_string(),
            sender_id: sender.id,
            timestamp: self.parse_timestamp(record.timestamp.as_ref(), filename),
            has_attachments: !record.attachments.is_empty(),
            department: record.department.trim().to_string(),
            pdf: record.pdf.trim().to_string(),
            bookmark: record.bookmark.trim().to_string(),
            bookmark_title: record.bookmark_title.trim().to_string(),
            email_n_in_bm: record.email_n_in_bm.as_ref().map(|n| n.trim().to_string()),
            is_canonical: record.canonical,
            sender_discordance,
            recipient_discordance,
            source_file: filename.trim().to_string(),
        }
    }

    fn parse_timestamp(&self, value: Option<&TimestampValue>, filename: &str) -> DateTime<Utc> {
        let Some(value) = value else {
            return self.clock.now();
        };
        if let TimestampValue::Text(text) = value
            && text.trim().is_empty()
        {
            return self.clock.now();
        }
        parse_timestamp_value(value).unwrap_or_else(|| {
            warn!(file = filename, ?value, "invalid timestamp, using current time");
            self.clock.now()
        })
    }
}

fn parse_timestamp_value(value: &TimestampValue) -> Option<DateTime<Utc>> {
    match value {
        TimestampValue::Seconds(secs) => DateTime::from_timestamp(*secs, 0),
        #[allow(clippy::cast_possible_truncation)]
        TimestampValue::Fractional(secs) => {
            DateTime::from_timestamp_millis((secs * 1000.0) as i64)
        }
        TimestampValue::Text(text) => parse_timestamp_text(text.trim()),
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = text.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::participant::{Participant, ParticipantId};
    use crate::time::FixedClock;

    fn sender() -> Participant {
        Participant {
            id: ParticipantId(1),
            name: "Jane Doe".to_string(),
            email: None,
            email_valid: false,
            department: None,
        }
    }

    fn fixed_clock() -> FixedClock {
        FixedClock(
            DateTime::parse_from_rfc3339("2004-07-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn test_text_fields_trimmed() {
        let clock = fixed_clock();
        let builder = EmailRecordBuilder::new(&clock);
        let record = RawRecord {
            subject: "  Q3 results  ".to_string(),
            text_body: "\nbody\n".to_string(),
            ..RawRecord::default()
        };

        let new_email = builder.build(&record, &sender(), "00001.json", "00001", None, None);
        assert_eq!(new_email.subject, "Q3 results");
        assert_eq!(new_email.text_body, "body");
        assert_eq!(new_email.source_file, "00001.json");
        assert_eq!(new_email.seq_id, "00001");
    }

    #[test]
    fn test_has_attachments_derived() {
        let clock = fixed_clock();
        let builder = EmailRecordBuilder::new(&clock);

        let record = RawRecord::default();
        assert!(!builder.build(&record, &sender(), "f", "1", None, None).has_attachments);

        let record = RawRecord {
            attachments: vec!["deal.pdf".to_string()],
            ..RawRecord::default()
        };
        assert!(builder.build(&record, &sender(), "f", "1", None, None).has_attachments);
    }

    #[test]
    fn test_timestamp_epoch_seconds() {
        let clock = fixed_clock();
        let builder = EmailRecordBuilder::new(&clock);
        let record = RawRecord {
            timestamp: Some(TimestampValue::Seconds(990_867_600)),
            ..RawRecord::default()
        };

        let new_email = builder.build(&record, &sender(), "f", "1", None, None);
        assert_eq!(new_email.timestamp.timestamp(), 990_867_600);
    }

    #[test]
    fn test_timestamp_text_forms() {
        for text in [
            "2001-05-26T09:00:00Z",
            "Sat, 26 May 2001 09:00:00 +0000",
            "2001-05-26 09:00:00",
            "2001/05/26 09:00:00",
            "990867600",
        ] {
            let parsed = parse_timestamp_text(text).unwrap();
            assert_eq!(parsed.date_naive().to_string(), "2001-05-26", "form: {text}");
        }

        let midnight = parse_timestamp_text("2001-05-26").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2001-05-26T00:00:00+00:00");
    }

    #[test]
    fn test_invalid_timestamp_falls_back_to_clock() {
        let clock = fixed_clock();
        let builder = EmailRecordBuilder::new(&clock);
        let record = RawRecord {
            timestamp: Some(TimestampValue::Text("sometime in May".to_string())),
            ..RawRecord::default()
        };

        let new_email = builder.build(&record, &sender(), "f", "1", None, None);
        assert_eq!(new_email.timestamp, clock.0);
    }

    #[test]
    fn test_missing_timestamp_uses_clock_without_warning_path() {
        let clock = fixed_clock();
        let builder = EmailRecordBuilder::new(&clock);

        let new_email = builder.build(&RawRecord::default(), &sender(), "f", "1", None, None);
        assert_eq!(new_email.timestamp, clock.0);
    }

    #[test]
    fn test_canonical_flag_carried() {
        let clock = fixed_clock();
        let builder = EmailRecordBuilder::new(&clock);
        let record = RawRecord {
            canonical: true,
            ..RawRecord::default()
        };

        assert!(builder.build(&record, &sender(), "f", "1", None, None).is_canonical);
    }
}
