use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use tracing::{info, warn};

use stack_capture::app::CaptureApp;
use stack_capture::cli::{self, Args, Command};
use stack_capture::config::{self, Config};
use stack_capture::dispatch::{ui_queue, UiEvent};
use stack_capture::error::ResultExt;
use stack_capture::hotkeys::{GlobalHotkeyBackend, HotkeyBinding, HotkeyRegistry};
use stack_capture::logging;
use stack_capture::notes::{NoteStore, StoreSink};
use stack_capture::overlay::{FocusRetryPolicy, OverlayController};
use stack_capture::permissions::SystemPermissionPrompt;
use stack_capture::platform;

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init();

    let config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };

    let mut stdout = io::stdout();
    match args.command() {
        Command::Run => run_daemon(&config),
        Command::Add { text } => cli::add(open_store(&config)?, text, &mut stdout),
        Command::List { category } => {
            cli::list(&open_store(&config)?, category.as_deref(), &mut stdout)
        }
        Command::Categories => cli::categories(&open_store(&config)?, &mut stdout),
        Command::Delete { id } => cli::delete(&open_store(&config)?, *id, &mut stdout),
    }
}

fn open_store(config: &Config) -> Result<NoteStore> {
    let path = config.get_notes_path();
    NoteStore::open(&path).with_context(|| format!("Failed to open notes at {}", path.display()))
}

fn run_daemon(config: &Config) -> Result<()> {
    // AppKit and the Carbon hotkey manager both want the main thread, set up
    // before anything else touches the window system
    platform::init();

    let binding = HotkeyBinding::from_config(&config.hotkey).unwrap_or_else(|e| {
        warn!(
            error = %e,
            configured = %config.hotkey.display(),
            "Invalid hotkey in config, falling back to default"
        );
        HotkeyBinding::default()
    });

    let (sender, queue) = ui_queue();

    // Ctrl-C and SIGTERM end the run loop so the hotkey is released cleanly
    ctrlc::set_handler({
        let sender = sender.clone();
        move || {
            info!("Shutdown signal received");
            sender.post(UiEvent::Quit);
        }
    })
    .context("Failed to set shutdown signal handler")?;

    let backend = GlobalHotkeyBackend::new().context("Global hotkeys are unavailable")?;
    let registry = HotkeyRegistry::new(Box::new(backend));

    let sink = StoreSink::spawn(open_store(config)?).context("Failed to start note writer")?;
    let arbiter = platform::create_arbiter(sender.clone()).context("Failed to create overlay")?;
    let controller = OverlayController::new(
        arbiter,
        sink,
        sender.clone(),
        FocusRetryPolicy::from_config(config),
    );

    let mut app = CaptureApp::new(registry, controller, SystemPermissionPrompt, sender, binding);
    app.start();
    // Without the timer a later permission grant needs a restart
    app.schedule_permission_checks(config.get_permission_poll_interval())
        .log_err();

    info!(
        event_type = "app_lifecycle",
        action = "ready",
        binding = %binding.display(),
        "stack is running"
    );
    app.run(&queue, platform::event_pump());
    Ok(())
}
