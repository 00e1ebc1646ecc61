//! Notes Storage Layer
//!
//! SQLite-backed persistence for captured notes. The store is an owned value:
//! whoever opens it (the capture worker, or a CLI command) holds the only
//! connection.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::{Category, Note};

pub struct NoteStore {
    conn: Connection,
}

impl NoteStore {
    /// Open (or create) the notes database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create notes db directory")?;
        }

        let conn = Connection::open(path).context("Failed to open notes database")?;

        // Enable WAL mode for better write performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL mode")?;

        let store = Self::with_connection(conn)?;
        info!(db_path = %path.display(), "Notes database initialized");
        Ok(store)
    }

    /// In-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                category TEXT NOT NULL,
                context TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_notes_category ON notes(category);
            "#,
        )
        .context("Failed to create notes tables")?;

        Ok(Self { conn })
    }

    /// Insert a note (ids are unique, so a repeat insert replaces)
    pub fn add_note(&self, note: &Note) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO notes (id, text, category, context, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    note.id.to_string(),
                    note.text,
                    note.category.name(),
                    note.context,
                    note.timestamp.to_rfc3339(),
                ],
            )
            .context("Failed to save note")?;

        debug!(note_id = %note.id, category = %note.category, "Note saved");
        Ok(())
    }

    /// Delete a note by id. Returns whether a row was removed.
    pub fn delete_note(&self, id: Uuid) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete note")?;
        Ok(removed > 0)
    }

    pub fn get_note(&self, id: Uuid) -> Result<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, text, category, context, created_at FROM notes WHERE id = ?1",
            )
            .context("Failed to prepare get_note query")?;

        stmt.query_row(params![id.to_string()], row_to_note)
            .optional()
            .context("Failed to get note")
    }

    /// All notes, newest first
    pub fn all_notes(&self) -> Result<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, text, category, context, created_at FROM notes ORDER BY created_at DESC",
            )
            .context("Failed to prepare all_notes query")?;

        let notes = stmt
            .query_map([], row_to_note)
            .context("Failed to query notes")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to collect notes")?;

        debug!(count = notes.len(), "Retrieved all notes");
        Ok(notes)
    }

    /// Notes in one category, newest first
    pub fn notes_in_category(&self, category: &Category) -> Result<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT id, text, category, context, created_at FROM notes
                WHERE category = ?1
                ORDER BY created_at DESC
                "#,
            )
            .context("Failed to prepare notes_in_category query")?;

        let notes = stmt
            .query_map(params![category.name()], row_to_note)
            .context("Failed to query notes by category")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to collect notes")?;
        Ok(notes)
    }

    /// Built-in categories plus every category in use, sorted by name
    pub fn all_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM notes")
            .context("Failed to prepare categories query")?;

        let used = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("Failed to query categories")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to collect categories")?;

        let all: BTreeSet<Category> = Category::defaults()
            .into_iter()
            .chain(used.iter().map(Category::new))
            .collect();
        Ok(all.into_iter().collect())
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .context("Failed to count notes")?;
        Ok(count as usize)
    }
}

/// Convert a database row to a Note
fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
    let id_str: String = row.get(0)?;
    let text: String = row.get(1)?;
    let category: String = row.get(2)?;
    let context: Option<String> = row.get(3)?;
    let created_at_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).unwrap_or_else(|e| {
        warn!(id = %id_str, error = %e, "Stored note has an invalid id");
        Uuid::nil()
    });

    let timestamp = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Note {
        id,
        text,
        timestamp,
        category: Category::new(category),
        context,
    })
}
