//! Terminal stand-in for the overlay on platforms without AppKit.
//!
//! "Presenting" prints a prompt; each stdin line is delivered as the field's
//! contents followed by Enter. EOF only stops the reader; the daemon keeps
//! its hotkey until it is told to quit.

use std::io::{self, BufRead, Write};
use std::thread;

use tracing::{info, warn};

use crate::dispatch::UiSender;
use crate::focus::{FieldHandle, FocusArbiter, FocusClaim, SurfaceHandle};
use crate::overlay::OverlayEvent;

const PROMPT: &str = "what's the idea? ";

pub struct ConsoleArbiter<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleArbiter {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleArbiter<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Console write failed");
        }
    }
}

impl<W: Write> FocusArbiter for ConsoleArbiter<W> {
    fn present_above_all(&mut self, _surface: SurfaceHandle) {
        self.write(PROMPT);
    }

    fn claim_keyboard_focus(&mut self, _surface: SurfaceHandle, _field: FieldHandle) -> FocusClaim {
        FocusClaim::Granted
    }

    fn dismiss(&mut self, _surface: SurfaceHandle) {
        self.write("\n");
    }
}

/// Feed stdin lines to the UI queue as text + submit until EOF.
pub fn spawn_stdin_reader(sender: UiSender) -> io::Result<()> {
    thread::Builder::new()
        .name("stack-stdin".to_string())
        .spawn(move || read_lines(io::stdin().lock(), &sender))?;
    Ok(())
}

fn read_lines(input: impl BufRead, sender: &UiSender) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        let delivered = sender.post_overlay(OverlayEvent::TextChanged(line))
            && sender.post_overlay(OverlayEvent::Submit);
        if !delivered {
            return;
        }
    }
    info!("stdin closed, console input stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{ui_queue, UiEvent};
    use crate::focus::{OVERLAY_FIELD, OVERLAY_SURFACE};

    #[test]
    fn arbiter_prints_prompt_and_ends_line() {
        let mut arbiter = ConsoleArbiter::with_writer(Vec::new());
        arbiter.present_above_all(OVERLAY_SURFACE);
        assert_eq!(
            arbiter.claim_keyboard_focus(OVERLAY_SURFACE, OVERLAY_FIELD),
            FocusClaim::Granted
        );
        arbiter.dismiss(OVERLAY_SURFACE);
        assert_eq!(String::from_utf8(arbiter.out).unwrap(), "what's the idea? \n");
    }

    #[test]
    fn lines_become_text_then_submit() {
        let (sender, queue) = ui_queue();
        read_lines(io::Cursor::new("buy milk\nfix bug: work\n"), &sender);

        assert_eq!(
            queue.drain(),
            vec![
                UiEvent::Overlay(OverlayEvent::TextChanged("buy milk".into())),
                UiEvent::Overlay(OverlayEvent::Submit),
                UiEvent::Overlay(OverlayEvent::TextChanged("fix bug: work".into())),
                UiEvent::Overlay(OverlayEvent::Submit),
            ]
        );
    }

    #[test]
    fn closed_stdin_posts_nothing_and_leaves_queue_open() {
        let (sender, queue) = ui_queue();
        read_lines(io::Cursor::new(""), &sender);

        assert!(queue.drain().is_empty());
        assert!(sender.post(UiEvent::PermissionRecheck));
        assert_eq!(queue.drain(), vec![UiEvent::PermissionRecheck]);
    }
}
