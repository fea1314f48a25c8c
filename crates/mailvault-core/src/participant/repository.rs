//! Participant storage repository.

use sqlx::Row;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{Participant, ParticipantId};
use crate::Result;
use crate::db::Database;

/// Repository for participant storage and identity lookup.
#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: SqlitePool,
}

impl ParticipantRepository {
    /// Creates a repository over the shared archive database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Looks up a participant by identity key: exact name match, or
    /// exact address match when an address is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_identity(
        &self,
        name: &str,
        email: Option<&str>,
    ) -> Result<Option<Participant>> {
        let row = match email {
            Some(address) => {
                sqlx::query(
                    r"
                    SELECT id, name, email, email_valid, department
                    FROM participants
                    WHERE name = ? OR email = ?
                    LIMIT 1
                    ",
                )
                .bind(name)
                .bind(address)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r"
                    SELECT id, name, email, email_valid, department
                    FROM participants
                    WHERE name = ?
                    LIMIT 1
                    ",
                )
                .bind(name)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(row.as_ref().map(participant_from_row))
    }

    /// Inserts a new participant.
    ///
    /// Returns `None` when another worker created a matching identity
    /// concurrently (unique-index conflict); the caller should re-run
    /// the identity lookup and use the winner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails for any reason
    /// other than an identity conflict.
    pub async fn create(
        &self,
        name: &str,
        email: Option<&str>,
        email_valid: bool,
        department: Option<&str>,
    ) -> Result<Option<Participant>> {
        let result = sqlx::query(
            r"
            INSERT INTO participants (name, email, email_valid, department)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(name)
        .bind(email)
        .bind(email_valid)
        .bind(department)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Some(Participant {
                id: ParticipantId(done.last_insert_rowid()),
                name: name.to_string(),
                email: email.map(ToString::to_string),
                email_valid,
                department: department.map(ToString::to_string),
            })),
            Err(sqlx::Error::Database(db_err))
                if matches!(db_err.kind(), ErrorKind::UniqueViolation) =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Overwrites or backfills the stored department.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update_department(&self, id: ParticipantId, department: &str) -> Result<()> {
        sqlx::query("UPDATE participants SET department = ? WHERE id = ?")
            .bind(department)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Fetches a participant by row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: ParticipantId) -> Result<Option<Participant>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, email_valid, department
            FROM participants
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(participant_from_row))
    }

    /// Number of stored participants.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM participants")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("n"))
    }
}

fn participant_from_row(row: &SqliteRow) -> Participant {
    Participant {
        id: ParticipantId(row.get("id")),
        name: row.get("name"),
        email: row.get("email"),
        email_valid: row.get("email_valid"),
        department: row.get("department"),
    }
}
