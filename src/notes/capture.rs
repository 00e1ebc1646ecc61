//! Persistence worker behind the overlay's CaptureSink.
//!
//! The overlay hands text off and moves on; parsing and the SQLite write
//! happen on a dedicated thread that owns the [`NoteStore`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use super::model::Note;
use super::storage::NoteStore;
use crate::capture::CaptureSink;

enum PersistRequest {
    Commit(String),
    Shutdown,
}

/// CaptureSink that persists notes on a background worker.
pub struct StoreSink {
    sender: Sender<PersistRequest>,
    worker: Option<JoinHandle<NoteStore>>,
}

impl StoreSink {
    /// Move `store` onto a new worker thread.
    pub fn spawn(store: NoteStore) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("stack-persist".to_string())
            .spawn(move || persist_loop(store, receiver))?;

        info!("Note persistence worker started");
        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    /// Drain pending commits, stop the worker and hand the store back.
    pub fn shutdown(mut self) -> Option<NoteStore> {
        self.stop()
    }

    fn stop(&mut self) -> Option<NoteStore> {
        let worker = self.worker.take()?;
        let _ = self.sender.send(PersistRequest::Shutdown);
        match worker.join() {
            Ok(store) => Some(store),
            Err(_) => {
                error!("Note persistence worker panicked");
                None
            }
        }
    }
}

impl CaptureSink for StoreSink {
    fn commit(&self, raw_text: String) {
        if self.sender.send(PersistRequest::Commit(raw_text)).is_err() {
            error!("Note persistence worker is gone, capture dropped");
        }
    }
}

impl Drop for StoreSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn persist_loop(store: NoteStore, receiver: Receiver<PersistRequest>) -> NoteStore {
    while let Ok(request) = receiver.recv() {
        match request {
            PersistRequest::Commit(raw) => persist(&store, &raw),
            PersistRequest::Shutdown => break,
        }
    }
    debug!("Note persistence worker stopped");
    store
}

/// Parse and store one capture. Exposed for synchronous callers (CLI `add`).
pub fn persist(store: &NoteStore, raw: &str) {
    let Some(note) = Note::from_capture(raw) else {
        debug!("Blank capture ignored");
        return;
    };
    match store.add_note(&note) {
        Ok(()) => info!(
            note_id = %note.id,
            category = %note.category,
            "Idea saved"
        ),
        Err(e) => error!(error = ?e, "Failed to save idea"),
    }
}
