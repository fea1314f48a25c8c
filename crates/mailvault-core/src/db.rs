//! Shared SQLite handle and schema provisioning.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::Result;

/// Shared database handle for the archive schema.
///
/// Emails, recipient links, attachments, and duplicate references all
/// carry foreign keys into `participants`, so the repositories share
/// one pool instead of each owning their own.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the archive database at the given path, creating the file
    /// and schema if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema
    /// creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Create an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema
    /// creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Pool shared with the repositories.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT,
                email_valid INTEGER NOT NULL DEFAULT 0,
                department TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // The identity key: a resolution lookup matches on exact name
        // or exact address, so both must be unique. The indexes double
        // as the cross-worker race guard (create-then-retry-find).
        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_participants_name
            ON participants(name)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_participants_email
            ON participants(email) WHERE email IS NOT NULL
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS emails (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                seq_id TEXT NOT NULL,
                subject TEXT NOT NULL DEFAULT '',
                text_full TEXT NOT NULL DEFAULT '',
                text_body TEXT NOT NULL DEFAULT '',
                text_header TEXT NOT NULL DEFAULT '',
                sender_id INTEGER NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
                timestamp TEXT NOT NULL,
                has_attachments INTEGER NOT NULL DEFAULT 0,
                department TEXT NOT NULL DEFAULT '',
                pdf TEXT NOT NULL DEFAULT '',
                bookmark TEXT NOT NULL DEFAULT '',
                bookmark_title TEXT NOT NULL DEFAULT '',
                email_n_in_bm TEXT,
                is_canonical INTEGER NOT NULL DEFAULT 0,
                sender_discordance TEXT,
                recipient_discordance TEXT,
                source_file TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Duplicate references address emails by sequence id.
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_emails_seq ON emails(seq_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS email_recipients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id INTEGER NOT NULL REFERENCES emails(id) ON DELETE CASCADE,
                participant_id INTEGER NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
                is_cc INTEGER NOT NULL DEFAULT 0,
                UNIQUE(email_id, participant_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS email_attachments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id INTEGER NOT NULL REFERENCES emails(id) ON DELETE CASCADE,
                filename TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS email_duplicates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id INTEGER NOT NULL REFERENCES emails(id) ON DELETE CASCADE,
                duplicate_seq_id TEXT NOT NULL,
                UNIQUE(email_id, duplicate_seq_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_initializes() {
        let db = Database::in_memory().await.unwrap();
        // Initialization is idempotent.
        db.initialize().await.unwrap();

        sqlx::query("SELECT id FROM participants")
            .fetch_all(db.pool())
            .await
            .unwrap();
        sqlx::query("SELECT id FROM emails").fetch_all(db.pool()).await.unwrap();
        sqlx::query("SELECT id FROM email_duplicates")
            .fetch_all(db.pool())
            .await
            .unwrap();
    }
}
