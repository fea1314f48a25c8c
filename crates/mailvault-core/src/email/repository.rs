//! Email storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{Attachment, EmailId, EmailRecord, NewEmail, RecipientLink};
use crate::Result;
use crate::db::Database;
use crate::participant::ParticipantId;

/// Repository for email rows and their recipient/attachment links.
#[derive(Debug, Clone)]
pub struct EmailRepository {
    pool: SqlitePool,
}

impl EmailRepository {
    /// Creates a repository over the shared archive database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Inserts a new email row.
    ///
    /// Discordance reports are serialized into their JSON columns at
    /// insert; the row is not revisited afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails.
    pub async fn create(&self, new_email: NewEmail) -> Result<EmailRecord> {
        let sender_discordance = new_email
            .sender_discordance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let recipient_discordance = new_email
            .recipient_discordance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let done = sqlx::query(
            r"
            INSERT INTO emails (
                seq_id, subject, text_full, text_body, text_header,
                sender_id, timestamp, has_attachments, department,
                pdf, bookmark, bookmark_title, email_n_in_bm,
                is_canonical, sender_discordance, recipient_discordance,
                source_file
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&new_email.seq_id)
        .bind(&new_email.subject)
        .bind(&new_email.text_full)
        .bind(&new_email.text_body)
        .bind(&new_email.text_header)
        .bind(new_email.sender_id.0)
        .bind(new_email.timestamp.to_rfc3339())
        .bind(new_email.has_attachments)
        .bind(&new_email.department)
        .bind(&new_email.pdf)
        .bind(&new_email.bookmark)
        .bind(&new_email.bookmark_title)
        .bind(&new_email.email_n_in_bm)
        .bind(new_email.is_canonical)
        .bind(&sender_discordance)
        .bind(&recipient_discordance)
        .bind(&new_email.source_file)
        .execute(&self.pool)
        .await?;

        Ok(new_email.into_record(EmailId(done.last_insert_rowid())))
    }

    /// Adds a recipient link.
    ///
    /// A repeat link for the same (email, participant) pair is a
    /// no-op: the unique constraint absorbs it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn add_recipient(
        &self,
        email_id: EmailId,
        participant_id: ParticipantId,
        is_cc: bool,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT OR IGNORE INTO email_recipients (email_id, participant_id, is_cc)
            VALUES (?, ?, ?)
            ",
        )
        .bind(email_id.0)
        .bind(participant_id.0)
        .bind(is_cc)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records an attachment filename against an email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn add_attachment(&self, email_id: EmailId, filename: &str) -> Result<()> {
        sqlx::query("INSERT INTO email_attachments (email_id, filename) VALUES (?, ?)")
            .bind(email_id.0)
            .bind(filename)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Email with the given sequence id, if imported.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_seq(&self, seq_id: &str) -> Result<Option<EmailRecord>> {
        let row = sqlx::query("SELECT * FROM emails WHERE seq_id = ? LIMIT 1")
            .bind(seq_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(email_from_row))
    }

    /// Recipient links of an email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recipients(&self, email_id: EmailId) -> Result<Vec<RecipientLink>> {
        let rows = sqlx::query(
            r"
            SELECT email_id, participant_id, is_cc
            FROM email_recipients
            WHERE email_id = ?
            ORDER BY id
            ",
        )
        .bind(email_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| RecipientLink {
                email_id: EmailId(row.get("email_id")),
                participant_id: ParticipantId(row.get("participant_id")),
                is_cc: row.get("is_cc"),
            })
            .collect())
    }

    /// Attachment rows of an email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn attachments(&self, email_id: EmailId) -> Result<Vec<Attachment>> {
        let rows = sqlx::query(
            r"
            SELECT email_id, filename
            FROM email_attachments
            WHERE email_id = ?
            ORDER BY id
            ",
        )
        .bind(email_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Attachment {
                email_id: EmailId(row.get("email_id")),
                filename: row.get("filename"),
            })
            .collect())
    }
}

/// Maps an `emails` row back to its record.
pub(crate) fn email_from_row(row: &SqliteRow) -> EmailRecord {
    let timestamp: String = row.get("timestamp");
    let sender_discordance: Option<String> = row.get("sender_discordance");
    let recipient_discordance: Option<String> = row.get("recipient_discordance");

    EmailRecord {
        id: EmailId(row.get("id")),
        seq_id: row.get("seq_id"),
        subject: row.get("subject"),
        text_full: row.get("text_full"),
        text_body: row.get("text_body"),
        text_header: row.get("text_header"),
        sender_id: ParticipantId(row.get("sender_id")),
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or_default(),
        has_attachments: row.get("has_attachments"),
        department: row.get("department"),
        pdf: row.get("pdf"),
        bookmark: row.get("bookmark"),
        bookmark_title: row.get("bookmark_title"),
        email_n_in_bm: row.get("email_n_in_bm"),
        is_canonical: row.get("is_canonical"),
        sender_discordance: sender_discordance.and_then(|text| serde_json::from_str(&text).ok()),
        recipient_discordance: recipient_discordance
            .and_then(|text| serde_json::from_str(&text).ok()),
        source_file: row.get("source_file"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::discordance::{ExtractedParty, SenderDiscordance};
    use crate::participant::ParticipantRepository;

    async fn fixtures() -> (Database, EmailRepository, ParticipantId) {
        let db = Database::in_memory().await.unwrap();
        let participants = ParticipantRepository::new(&db);
        let sender = participants
            .create("Jane Doe", Some("jane@x.com"), true, None)
            .await
            .unwrap()
            .unwrap();
        (db.clone(), EmailRepository::new(&db), sender.id)
    }

    fn new_email(sender_id: ParticipantId, seq_id: &str) -> NewEmail {
        NewEmail {
            seq_id: seq_id.to_string(),
            subject: "Q3 results".to_string(),
            text_full: String::new(),
            text_body: String::new(),
            text_header: String::new(),
            sender_id,
            timestamp: DateTime::parse_from_rfc3339("2001-05-26T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            has_attachments: false,
            department: String::new(),
            pdf: String::new(),
            bookmark: String::new(),
            bookmark_title: String::new(),
            email_n_in_bm: None,
            is_canonical: false,
            sender_discordance: None,
            recipient_discordance: None,
            source_file: format!("{seq_id}.json"),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_seq() {
        let (_db, repo, sender_id) = fixtures().await;

        let created = repo.create(new_email(sender_id, "00001")).await.unwrap();
        let found = repo.find_by_seq("00001").await.unwrap().unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.subject, "Q3 results");
        assert_eq!(found.sender_id, sender_id);
        assert_eq!(found.timestamp, created.timestamp);
        assert!(!found.is_canonical);
    }

    #[tokio::test]
    async fn test_discordance_round_trips_through_storage() {
        let (_db, repo, sender_id) = fixtures().await;

        let mut email = new_email(sender_id, "00002");
        email.sender_discordance = Some(SenderDiscordance {
            json_sender: "J. Doe".to_string(),
            extracted_sender: ExtractedParty {
                name: "Jane Doe".to_string(),
                email: Some("jane@x.com".to_string()),
            },
        });
        repo.create(email).await.unwrap();

        let found = repo.find_by_seq("00002").await.unwrap().unwrap();
        let report = found.sender_discordance.unwrap();
        assert_eq!(report.json_sender, "J. Doe");
        assert_eq!(report.extracted_sender.name, "Jane Doe");
        assert_eq!(found.recipient_discordance, None);
    }

    #[tokio::test]
    async fn test_repeat_recipient_link_is_noop() {
        let (_db, repo, sender_id) = fixtures().await;
        let email = repo.create(new_email(sender_id, "00003")).await.unwrap();

        repo.add_recipient(email.id, sender_id, false).await.unwrap();
        repo.add_recipient(email.id, sender_id, false).await.unwrap();

        let links = repo.recipients(email.id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].participant_id, sender_id);
        assert!(!links[0].is_cc);
    }

    #[tokio::test]
    async fn test_attachments_recorded_in_order() {
        let (_db, repo, sender_id) = fixtures().await;
        let email = repo.create(new_email(sender_id, "00004")).await.unwrap();

        repo.add_attachment(email.id, "deal.pdf").await.unwrap();
        repo.add_attachment(email.id, "terms.doc").await.unwrap();

        let attachments = repo.attachments(email.id).await.unwrap();
        let names: Vec<&str> = attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["deal.pdf", "terms.doc"]);
    }
}
