//! ClipQueue host entry point.
//!
//! Loads the configuration, wires the queue controller to the clipboard
//! backend, installs the hotkey bindings and starts the global input hook.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config_from()     -- TOML config, defaults on first run
//!  └─ QueueController::new() -- history, queue, self-event suppression
//!  └─ start services
//!       ├─ ClipboardWatcher   (Tokio task, coalesces change notifications)
//!       ├─ change monitor     (Windows: polls the clipboard sequence number)
//!       ├─ install_bindings() (toggle / paste-next / macro hotkeys)
//!       └─ input hook         (Windows hook thread → InputDispatcher)
//! ```
//!
//! With `--assign <binding>` the host instead waits for one key or mouse
//! event, stores its signature for that binding in the config file and
//! exits.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clipqueue_core::{CaptureSession, QueueStatus, SignatureMatcher};
use clipqueue_host::application::bindings::install_bindings;
use clipqueue_host::application::clipboard_watch::ClipboardWatcher;
use clipqueue_host::application::dispatch::{HotkeyAction, InputDispatcher};
use clipqueue_host::application::queue_controller::{InputInjector, QueueController};
use clipqueue_host::infrastructure::input_capture::InputSource;
use clipqueue_host::infrastructure::storage::config::{self, AppConfig};
use tokio::task::JoinHandle;

#[cfg(target_os = "windows")]
use clipqueue_host::infrastructure::clipboard::windows::WindowsClipboard as PlatformClipboard;
#[cfg(not(target_os = "windows"))]
use clipqueue_host::infrastructure::clipboard::MemoryClipboard as PlatformClipboard;

/// How long `--assign` waits for the hotkey to be pressed.
const ASSIGN_TIMEOUT: Duration = Duration::from_secs(15);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Clipboard queue and global hotkey host.
#[derive(Debug, Parser)]
#[command(
    name = "clipqueue",
    about = "Clipboard history, paste queue and hotkey macros",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// Defaults to `config.toml` in the platform config directory.
    #[arg(long, env = "CLIPQUEUE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter such as `debug` or `clipqueue_host=trace`.
    ///
    /// `RUST_LOG` takes precedence; the config file's `app.log_level` is
    /// used when neither is given.
    #[arg(long, env = "CLIPQUEUE_LOG")]
    log_level: Option<String>,

    /// Record the next key or mouse event as the hotkey for BINDING and exit.
    ///
    /// BINDING is `toggle_queue`, `paste_next` or the name of a macro.
    #[arg(long, value_name = "BINDING")]
    assign: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_file_path().context("failed to locate config directory")?,
    };
    let mut app_config = config::load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    let level = cli
        .log_level
        .unwrap_or_else(|| app_config.app.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(path = %config_path.display(), "ClipQueue starting");

    app_config
        .ensure_signatures()
        .context("failed to derive hotkey signatures")?;
    app_config.validate().context("invalid configuration")?;

    if let Some(binding) = cli.assign {
        return assign_hotkey(&config_path, &mut app_config, &binding).await;
    }

    // ── Queue controller ──────────────────────────────────────────────────────
    let (clipboard, injector) = platform_backends();
    let controller = Arc::new(QueueController::new(
        clipboard.clone(),
        injector,
        app_config.controller_settings(),
    ));
    controller.set_status_listener(Arc::new(|status: QueueStatus| {
        info!(%status, "queue status changed")
    }));

    // ── Clipboard watcher ─────────────────────────────────────────────────────
    let watcher = if app_config.features.enable_clipboard {
        let (watcher, task) =
            ClipboardWatcher::spawn(Arc::clone(&controller), app_config.watch_debounce());
        let hook = watcher.clone();
        clipboard.set_change_listener(Arc::new(move || hook.notify()));
        let monitor = start_change_monitor(&clipboard);
        Some((watcher, task, monitor))
    } else {
        info!("clipboard watching disabled");
        None
    };

    // ── Hotkeys and input hook ────────────────────────────────────────────────
    let matcher: Arc<SignatureMatcher<HotkeyAction>> = Arc::new(SignatureMatcher::new());
    let report = install_bindings(&matcher, &controller, &app_config.bindings());
    for (id, error) in &report.skipped {
        warn!(id = %id, error = %error, "hotkey not installed");
    }

    let dispatcher = Arc::new(InputDispatcher::new(
        matcher,
        Arc::new(CaptureSession::new()),
        tokio::runtime::Handle::current(),
    ));
    let input_source = start_input_source(dispatcher)?;
    if input_source.is_none() {
        warn!("no global input hook on this platform; hotkeys are inactive");
    }

    info!("ClipQueue ready.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    // ── Shutdown ──────────────────────────────────────────────────────────────
    if let Some(source) = input_source {
        source.stop();
    }
    if let Some((watcher, task, monitor)) = watcher {
        if let Some(monitor) = monitor {
            monitor.abort();
        }
        clipboard.set_change_listener(Arc::new(|| {}));
        drop(watcher);
        if let Err(e) = task.await {
            warn!(error = %e, "clipboard watcher ended abnormally");
        }
    }

    info!("ClipQueue stopped");
    Ok(())
}

/// Captures one event through the input hook and stores it for `binding`.
async fn assign_hotkey(
    config_path: &Path,
    app_config: &mut AppConfig,
    binding: &str,
) -> anyhow::Result<()> {
    let dispatcher = Arc::new(InputDispatcher::new(
        Arc::new(SignatureMatcher::new()),
        Arc::new(CaptureSession::new()),
        tokio::runtime::Handle::current(),
    ));
    let Some(source) = start_input_source(Arc::clone(&dispatcher))? else {
        anyhow::bail!("hotkey capture needs the global input hook, which this platform lacks");
    };

    info!(binding, "press the new hotkey");
    let captured = dispatcher.capture_next(ASSIGN_TIMEOUT).await;
    source.stop();
    let (signature, stored) = captured.context("no hotkey pressed")?;

    app_config
        .assign_hotkey(binding, stored)
        .context("failed to assign hotkey")?;
    config::save_config_to(config_path, app_config)
        .with_context(|| format!("failed to save config to {}", config_path.display()))?;
    info!(binding, hotkey = %signature.display_hint(), "hotkey saved");
    Ok(())
}

#[cfg(target_os = "windows")]
fn platform_backends() -> (Arc<PlatformClipboard>, Arc<dyn InputInjector>) {
    use clipqueue_host::infrastructure::clipboard::windows::SendInputInjector;

    (
        Arc::new(PlatformClipboard::new()),
        Arc::new(SendInputInjector::new()),
    )
}

#[cfg(not(target_os = "windows"))]
fn platform_backends() -> (Arc<PlatformClipboard>, Arc<dyn InputInjector>) {
    use clipqueue_host::infrastructure::clipboard::LoggingInjector;

    warn!("no system clipboard backend on this platform; using an in-memory clipboard");
    (
        Arc::new(PlatformClipboard::new()),
        Arc::new(LoggingInjector::new()),
    )
}

#[cfg(target_os = "windows")]
fn start_change_monitor(clipboard: &Arc<PlatformClipboard>) -> Option<JoinHandle<()>> {
    use clipqueue_host::infrastructure::clipboard::windows::DEFAULT_POLL_INTERVAL;

    Some(clipboard.spawn_change_monitor(DEFAULT_POLL_INTERVAL))
}

#[cfg(not(target_os = "windows"))]
fn start_change_monitor(_clipboard: &Arc<PlatformClipboard>) -> Option<JoinHandle<()>> {
    None
}

#[cfg(target_os = "windows")]
fn start_input_source(
    dispatcher: Arc<InputDispatcher>,
) -> anyhow::Result<Option<Box<dyn InputSource>>> {
    use clipqueue_host::infrastructure::input_capture::dispatch_handler;
    use clipqueue_host::infrastructure::input_capture::windows::WindowsInputHook;

    let hook = WindowsInputHook::new();
    hook.start(dispatch_handler(dispatcher))
        .context("failed to install input hooks")?;
    Ok(Some(Box::new(hook)))
}

#[cfg(not(target_os = "windows"))]
fn start_input_source(
    _dispatcher: Arc<InputDispatcher>,
) -> anyhow::Result<Option<Box<dyn InputSource>>> {
    Ok(None)
}
