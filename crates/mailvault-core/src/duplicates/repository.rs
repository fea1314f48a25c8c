//! Duplicate link storage and canonical resolution.

use std::collections::HashSet;

use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::warn;

use super::DuplicateError;
use crate::Result;
use crate::db::Database;
use crate::email::{EmailId, EmailRecord, email_from_row};

/// Tracks which emails duplicate which, by literal sequence reference.
///
/// References are recorded as supplied by the input record: the
/// referent does not have to exist yet (an email may be imported
/// before the email it duplicates), and linking never changes which
/// email is canonical. Canonical promotion is a separate, explicit
/// operation.
#[derive(Debug, Clone)]
pub struct DuplicateTracker {
    pool: SqlitePool,
}

impl DuplicateTracker {
    /// Creates a tracker over the shared archive database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Records that `email` duplicates the record with sequence id
    /// `duplicate_ref`.
    ///
    /// Append-only and idempotent: re-linking the same reference is a
    /// no-op. Never mutates `is_canonical`.
    ///
    /// # Errors
    ///
    /// Refuses a self-reference and refuses to mark a canonical email
    /// as a duplicate; database failures are passed through.
    pub async fn link_duplicate(
        &self,
        email: &EmailRecord,
        duplicate_ref: &str,
    ) -> std::result::Result<(), DuplicateError> {
        let reference = duplicate_ref.trim();
        if reference == email.seq_id {
            return Err(DuplicateError::SelfReference {
                seq: email.seq_id.clone(),
            });
        }
        if email.is_canonical {
            return Err(DuplicateError::AlreadyCanonical {
                seq: email.seq_id.clone(),
            });
        }

        self.insert_reference(email.id, reference).await?;
        Ok(())
    }

    /// Promotes `email` to the canonical representative of its cluster
    /// and records the listed member references.
    ///
    /// Invoked only for records carrying an explicit canonical flag;
    /// content matching never triggers promotion.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn promote_canonical(
        &self,
        email: &EmailRecord,
        member_refs: &[String],
    ) -> Result<()> {
        sqlx::query("UPDATE emails SET is_canonical = 1 WHERE id = ?")
            .bind(email.id.0)
            .execute(&self.pool)
            .await?;

        for member in member_refs {
            let reference = member.trim();
            if reference == email.seq_id {
                continue;
            }
            self.insert_reference(email.id, reference).await?;
        }

        Ok(())
    }

    /// Resolves a sequence id to the root of its duplicate cluster.
    ///
    /// Chases duplicate references hop by hop until it reaches a
    /// canonical email or an email with no outgoing reference. Returns
    /// `None` while the sequence id itself, or any referent along the
    /// chain, has not been imported yet — a pending forward reference,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn resolve_canonical(&self, seq_id: &str) -> Result<Option<EmailRecord>> {
        let Some(mut current) = self.email_by_seq(seq_id).await? else {
            return Ok(None);
        };

        let mut visited = HashSet::new();
        loop {
            if current.is_canonical {
                return Ok(Some(current));
            }
            if !visited.insert(current.seq_id.clone()) {
                warn!(seq = %current.seq_id, "duplicate reference cycle");
                return Ok(Some(current));
            }

            let Some(reference) = self.first_reference(current.id).await? else {
                return Ok(Some(current));
            };
            match self.email_by_seq(&reference).await? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
    }

    /// References recorded against an email, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn references(&self, email_id: EmailId) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r"
            SELECT duplicate_seq_id
            FROM email_duplicates
            WHERE email_id = ?
            ORDER BY id
            ",
        )
        .bind(email_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("duplicate_seq_id")).collect())
    }

    async fn insert_reference(
        &self,
        email_id: EmailId,
        reference: &str,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r"
            INSERT OR IGNORE INTO email_duplicates (email_id, duplicate_seq_id)
            VALUES (?, ?)
            ",
        )
        .bind(email_id.0)
        .bind(reference)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn first_reference(&self, email_id: EmailId) -> Result<Option<String>> {
        let row = sqlx::query(
            r"
            SELECT duplicate_seq_id
            FROM email_duplicates
            WHERE email_id = ?
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(email_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("duplicate_seq_id")))
    }

    async fn email_by_seq(&self, seq_id: &str) -> Result<Option<EmailRecord>> {
        let row = sqlx::query("SELECT * FROM emails WHERE seq_id = ? LIMIT 1")
            .bind(seq_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(email_from_row))
    }
}
