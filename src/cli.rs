//! Command line interface.
//!
//! With no subcommand (or `run`) the capture daemon starts. The other
//! subcommands work directly against the notes database.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::capture::CaptureSink;
use crate::notes::{group_by_day, Category, NoteStore, StoreSink};

/// stack - capture ideas from anywhere with a global hotkey
#[derive(Parser, Debug)]
#[command(name = "stack")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Config file (default: ~/.stack/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the capture daemon (default)
    Run,
    /// Capture a note without the overlay, e.g. `stack add fix login bug: work`
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List notes grouped by day, newest first
    List {
        /// Only show notes in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List categories (built-ins plus any in use)
    Categories,
    /// Delete a note by id
    Delete { id: Uuid },
}

impl Args {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Run)
    }
}

/// Capture `text` through the same sink the overlay uses.
pub fn add(store: NoteStore, text: &[String], out: &mut impl Write) -> Result<()> {
    let before = store.count()?;
    let sink = StoreSink::spawn(store).context("Failed to start note writer")?;
    sink.commit(text.join(" "));
    let store = sink
        .shutdown()
        .context("Note writer stopped unexpectedly")?;

    if store.count()? == before {
        writeln!(out, "nothing to save")?;
        return Ok(());
    }
    if let Some(note) = store.all_notes()?.first() {
        writeln!(out, "saved [{}] {}", note.category, note.text)?;
    }
    Ok(())
}

pub fn list(store: &NoteStore, category: Option<&str>, out: &mut impl Write) -> Result<()> {
    let notes = match category {
        Some(name) => store.notes_in_category(&Category::new(name))?,
        None => store.all_notes()?,
    };
    if notes.is_empty() {
        writeln!(out, "no ideas yet")?;
        return Ok(());
    }

    let today = Local::now().date_naive();
    for group in group_by_day(&notes, today) {
        writeln!(out, "{}", group.label)?;
        for note in &group.notes {
            let time = note.timestamp.with_timezone(&Local).format("%H:%M");
            writeln!(
                out,
                "  {}  {:<10} {}  ({})",
                time, note.category, note.text, note.id
            )?;
        }
    }
    Ok(())
}

pub fn categories(store: &NoteStore, out: &mut impl Write) -> Result<()> {
    for category in store.all_categories()? {
        writeln!(out, "{}", category)?;
    }
    Ok(())
}

pub fn delete(store: &NoteStore, id: Uuid, out: &mut impl Write) -> Result<()> {
    if store.delete_note(id)? {
        writeln!(out, "deleted {}", id)?;
    } else {
        writeln!(out, "no note with id {}", id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::Note;

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn no_subcommand_means_run() {
        let args = Args::try_parse_from(["stack"]).unwrap();
        assert_eq!(args.command(), &Command::Run);
    }

    #[test]
    fn add_collects_words() {
        let args = Args::try_parse_from(["stack", "add", "fix", "login:", "work"]).unwrap();
        assert_eq!(
            args.command(),
            &Command::Add {
                text: vec!["fix".into(), "login:".into(), "work".into()]
            }
        );
        assert!(Args::try_parse_from(["stack", "add"]).is_err());
    }

    #[test]
    fn delete_requires_uuid() {
        assert!(Args::try_parse_from(["stack", "delete", "nope"]).is_err());
    }

    #[test]
    fn add_parses_category_through_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.sqlite");

        let text = output(|out| {
            add(
                NoteStore::open(&path)?,
                &["fix".into(), "login:".into(), "work".into()],
                out,
            )
        });
        assert_eq!(text, "saved [work] fix login\n");

        let store = NoteStore::open(&path).unwrap();
        assert_eq!(store.notes_in_category(&Category::work()).unwrap().len(), 1);
    }

    #[test]
    fn list_groups_under_today() {
        let store = NoteStore::open_in_memory().unwrap();
        store.add_note(&Note::new("buy milk", Category::random())).unwrap();

        let text = output(|out| list(&store, None, out));
        assert!(text.starts_with("today\n"), "{}", text);
        assert!(text.contains("buy milk"));
    }

    #[test]
    fn list_filters_by_category() {
        let store = NoteStore::open_in_memory().unwrap();
        store.add_note(&Note::new("standup", Category::work())).unwrap();
        store.add_note(&Note::new("dentist", Category::personal())).unwrap();

        let text = output(|out| list(&store, Some("Work"), out));
        assert!(text.contains("standup"));
        assert!(!text.contains("dentist"));
    }

    #[test]
    fn list_empty_store() {
        let store = NoteStore::open_in_memory().unwrap();
        assert_eq!(output(|out| list(&store, None, out)), "no ideas yet\n");
    }

    #[test]
    fn categories_and_delete() {
        let store = NoteStore::open_in_memory().unwrap();
        let note = Note::new("sketch", Category::new("design"));
        store.add_note(&note).unwrap();

        assert_eq!(
            output(|out| categories(&store, out)),
            "design\npersonal\nrandom\nwork\n"
        );
        assert_eq!(
            output(|out| delete(&store, note.id, out)),
            format!("deleted {}\n", note.id)
        );
        assert_eq!(
            output(|out| delete(&store, note.id, out)),
            format!("no note with id {}\n", note.id)
        );
    }
}
