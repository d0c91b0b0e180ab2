//! TOML-based configuration persistence.
//!
//! Reads and writes [`AppConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\ClipQueue\config.toml`
//! - Linux:    `~/.config/clipqueue/config.toml`
//! - macOS:    `~/Library/Application Support/ClipQueue/config.toml`
//!
//! Example:
//!
//! ```toml
//! [hotkeys]
//! toggle_queue = "sig:AQADCgBDAC4AAAAAAAAB"
//! paste_next = "Ctrl+Alt+V"
//!
//! [queue]
//! default_order = "FIFO"
//!
//! [[macros]]
//! name = "signature"
//! hotkey = "Ctrl+Alt+S"
//! text = "Best regards"
//! mode = "paste"
//! ```
//!
//! # Serde default values
//!
//! Every section and field falls back to its default when absent, so the
//! app works on first run (before a config file exists) and with files
//! written by older versions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clipqueue_core::{format_hotkey, parse_hotkey, OrderStrategy, ParseError, QueueSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::bindings::{HotkeyBindings, MacroBinding};
use crate::application::queue_controller::{ControllerSettings, MacroMode};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A hotkey string could not be turned into a signature.
    #[error("invalid hotkey for {field}: {source}")]
    InvalidHotkey {
        field: String,
        #[source]
        source: ParseError,
    },

    /// A macro entry is unusable.
    #[error("macro {index} is invalid: {reason}")]
    InvalidMacro { index: usize, reason: String },

    /// No hotkey or macro goes by this name.
    #[error("unknown binding {0:?}; expected toggle_queue, paste_next or a macro name")]
    UnknownBinding(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub hotkeys: HotkeysConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub macros: Vec<MacroConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSection {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Global hotkeys.  Each accepts `"sig:<base64>"` or `"Ctrl+Alt+C"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotkeysConfig {
    #[serde(default = "default_toggle_queue")]
    pub toggle_queue: String,
    #[serde(default = "default_paste_next")]
    pub paste_next: String,
    /// Human-readable label; also the source for an empty `toggle_queue`.
    #[serde(default = "default_toggle_queue_display")]
    pub toggle_queue_display: String,
    #[serde(default = "default_paste_next_display")]
    pub paste_next_display: String,
}

/// Clipboard timing and capacity settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipboardConfig {
    /// Coalescing window for change notifications.
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
    /// Settle delay between writing an item and the paste keystroke.
    #[serde(default = "default_paste_delay_ms")]
    pub paste_delay_ms: u64,
    /// Settle delay between the paste keystroke and restoring the clipboard.
    #[serde(default = "default_restore_delay_ms")]
    pub restore_delay_ms: u64,
    /// Two identical updates closer than this are one echo.
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,
    #[serde(default = "default_self_event_capacity")]
    pub self_event_capacity: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueConfig {
    /// `"LIFO"` or `"FIFO"`.  Anything else falls back to LIFO.
    #[serde(default = "default_order")]
    pub default_order: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeaturesConfig {
    /// Toggle-queue and paste-next hotkeys.
    #[serde(default = "default_true")]
    pub enable_queue: bool,
    /// Clipboard watching (history and queue capture).
    #[serde(default = "default_true")]
    pub enable_clipboard: bool,
    /// Macro hotkeys.
    #[serde(default = "default_true")]
    pub enable_macros: bool,
}

/// A text macro bound to a hotkey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MacroConfig {
    #[serde(default)]
    pub name: String,
    /// `"Ctrl+Alt+S"` or `"sig:<base64>"`.
    #[serde(default)]
    pub hotkey: String,
    /// Captured `"sig:<base64>"` form; takes precedence over `hotkey`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mode: MacroMode,
}

impl MacroConfig {
    /// The hotkey string actually registered.
    pub fn effective_hotkey(&self) -> &str {
        if self.signature.is_empty() {
            &self.hotkey
        } else {
            &self.signature
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_toggle_queue() -> String {
    "sig:AQADCgBDAC4AAAAAAAAB".to_string()
}
fn default_paste_next() -> String {
    "sig:AQADCgBWAC8AAAAAAAAB".to_string()
}
fn default_toggle_queue_display() -> String {
    "Ctrl+Alt+C".to_string()
}
fn default_paste_next_display() -> String {
    "Ctrl+Alt+V".to_string()
}
fn default_watch_debounce_ms() -> u64 {
    30
}
fn default_paste_delay_ms() -> u64 {
    100
}
fn default_restore_delay_ms() -> u64 {
    250
}
fn default_dedup_window_ms() -> u64 {
    1000
}
fn default_self_event_capacity() -> usize {
    8
}
fn default_history_capacity() -> usize {
    50
}
fn default_order() -> String {
    "LIFO".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for HotkeysConfig {
    fn default() -> Self {
        Self {
            toggle_queue: default_toggle_queue(),
            paste_next: default_paste_next(),
            toggle_queue_display: default_toggle_queue_display(),
            paste_next_display: default_paste_next_display(),
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            watch_debounce_ms: default_watch_debounce_ms(),
            paste_delay_ms: default_paste_delay_ms(),
            restore_delay_ms: default_restore_delay_ms(),
            dedup_window_ms: default_dedup_window_ms(),
            self_event_capacity: default_self_event_capacity(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_order: default_order(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enable_queue: true,
            enable_clipboard: true,
            enable_macros: true,
        }
    }
}

// ── Derived settings ──────────────────────────────────────────────────────────

impl AppConfig {
    /// Fills empty signature fields from their human-readable counterparts.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidHotkey`] if a display string cannot be parsed.
    pub fn ensure_signatures(&mut self) -> Result<(), ConfigError> {
        if self.hotkeys.toggle_queue.is_empty() && !self.hotkeys.toggle_queue_display.is_empty() {
            self.hotkeys.toggle_queue =
                derive_signature("hotkeys.toggle_queue", &self.hotkeys.toggle_queue_display)?;
        }
        if self.hotkeys.paste_next.is_empty() && !self.hotkeys.paste_next_display.is_empty() {
            self.hotkeys.paste_next =
                derive_signature("hotkeys.paste_next", &self.hotkeys.paste_next_display)?;
        }
        for (index, entry) in self.macros.iter_mut().enumerate() {
            if entry.signature.is_empty() && !entry.hotkey.is_empty() {
                entry.signature = derive_signature(&format!("macros[{index}]"), &entry.hotkey)?;
            }
        }
        Ok(())
    }

    /// Checks every macro: non-empty hotkey, and a hotkey that parses.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidMacro`] for the first offending entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, entry) in self.macros.iter().enumerate() {
            if entry.hotkey.trim().is_empty() && entry.signature.trim().is_empty() {
                return Err(ConfigError::InvalidMacro {
                    index,
                    reason: "empty hotkey".to_string(),
                });
            }
            if let Err(e) = parse_hotkey(entry.effective_hotkey()) {
                return Err(ConfigError::InvalidMacro {
                    index,
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Configured order strategy; an unknown value falls back to LIFO.
    pub fn default_order(&self) -> OrderStrategy {
        self.queue.default_order.parse().unwrap_or_else(|_| {
            warn!(
                value = %self.queue.default_order,
                "unknown default_order, falling back to LIFO"
            );
            OrderStrategy::Lifo
        })
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        let clipboard = &self.clipboard;
        ControllerSettings {
            queue: QueueSettings {
                history_capacity: clipboard.history_capacity,
                dedup_window: Duration::from_millis(clipboard.dedup_window_ms),
                self_event_capacity: clipboard.self_event_capacity,
            },
            default_order: self.default_order(),
            paste_delay: Duration::from_millis(clipboard.paste_delay_ms),
            restore_delay: Duration::from_millis(clipboard.restore_delay_ms),
        }
    }

    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.clipboard.watch_debounce_ms)
    }

    /// The hotkeys to install, with disabled features left out.
    pub fn bindings(&self) -> HotkeyBindings {
        let hotkeys = &self.hotkeys;
        let queue_hotkey = |primary: &str, display: &str| {
            if !self.features.enable_queue {
                return None;
            }
            [primary, display]
                .into_iter()
                .find(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        let macros = if self.features.enable_macros {
            self.macros
                .iter()
                .map(|entry| MacroBinding {
                    name: entry.name.clone(),
                    hotkey: entry.effective_hotkey().to_string(),
                    text: entry.text.clone(),
                    mode: entry.mode,
                })
                .collect()
        } else {
            Vec::new()
        };

        HotkeyBindings {
            toggle_queue: queue_hotkey(&hotkeys.toggle_queue, &hotkeys.toggle_queue_display),
            paste_next: queue_hotkey(&hotkeys.paste_next, &hotkeys.paste_next_display),
            macros,
        }
    }
}

impl AppConfig {
    /// Stores a captured `"sig:<base64>"` hotkey for `binding`.
    ///
    /// `binding` is `toggle_queue`, `paste_next` or a macro name.  Macros
    /// keep their display `hotkey` and get the capture as `signature`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownBinding`] if nothing goes by that name.
    pub fn assign_hotkey(&mut self, binding: &str, stored: String) -> Result<(), ConfigError> {
        match binding {
            "toggle_queue" => self.hotkeys.toggle_queue = stored,
            "paste_next" => self.hotkeys.paste_next = stored,
            name => {
                let entry = self
                    .macros
                    .iter_mut()
                    .find(|entry| entry.name == name)
                    .ok_or_else(|| ConfigError::UnknownBinding(name.to_string()))?;
                entry.signature = stored;
            }
        }
        info!(binding, "hotkey assigned");
        Ok(())
    }
}

fn derive_signature(field: &str, hotkey: &str) -> Result<String, ConfigError> {
    let signature = parse_hotkey(hotkey).map_err(|source| ConfigError::InvalidHotkey {
        field: field.to_string(),
        source,
    })?;
    info!(field, hotkey, "derived signature from hotkey string");
    Ok(format_hotkey(&signature))
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the `ClipQueue` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ClipQueue"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("clipqueue"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ClipQueue")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
