//! Hotkey bindings: turns configured hotkey strings into matcher registrations.
//!
//! Registration ids are stable so the UI can list and replace them:
//! `"toggle_queue"`, `"paste_next"` and `"macro:<index>:<name>"`.
//! [`install_bindings`] always starts from an empty matcher, so calling it
//! again is a reload.

use std::sync::Arc;

use clipqueue_core::{parse_hotkey, ParseError, SignatureMatcher};
use futures_util::FutureExt;
use tracing::{error, info, warn};

use super::dispatch::HotkeyAction;
use super::queue_controller::{MacroMode, QueueController};

pub const TOGGLE_QUEUE_ID: &str = "toggle_queue";
pub const PASTE_NEXT_ID: &str = "paste_next";

/// The hotkeys to install.  `None` means the binding is switched off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub toggle_queue: Option<String>,
    pub paste_next: Option<String>,
    pub macros: Vec<MacroBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroBinding {
    pub name: String,
    /// `"sig:<base64>"` or `"Ctrl+Alt+S"`.
    pub hotkey: String,
    pub text: String,
    pub mode: MacroMode,
}

/// What [`install_bindings`] did.
#[derive(Debug, Default, PartialEq)]
pub struct BindingReport {
    /// Ids registered, in registration order.
    pub registered: Vec<String>,
    /// Ids whose hotkey failed to parse.
    pub skipped: Vec<(String, ParseError)>,
}

pub fn macro_binding_id(index: usize, name: &str) -> String {
    format!("macro:{index}:{name}")
}

/// Clears `matcher` and registers every configured binding.
///
/// A hotkey that fails to parse is logged and skipped; the remaining
/// bindings are still installed.
pub fn install_bindings(
    matcher: &SignatureMatcher<HotkeyAction>,
    controller: &Arc<QueueController>,
    bindings: &HotkeyBindings,
) -> BindingReport {
    matcher.unregister_all();
    let mut report = BindingReport::default();

    if let Some(hotkey) = &bindings.toggle_queue {
        register(matcher, &mut report, TOGGLE_QUEUE_ID, hotkey, toggle_action(controller));
    }
    if let Some(hotkey) = &bindings.paste_next {
        register(matcher, &mut report, PASTE_NEXT_ID, hotkey, paste_next_action(controller));
    }
    for (index, binding) in bindings.macros.iter().enumerate() {
        register(
            matcher,
            &mut report,
            &macro_binding_id(index, &binding.name),
            &binding.hotkey,
            macro_action(controller, binding),
        );
    }

    info!(
        registered = report.registered.len(),
        skipped = report.skipped.len(),
        "hotkey bindings installed"
    );
    report
}

fn register(
    matcher: &SignatureMatcher<HotkeyAction>,
    report: &mut BindingReport,
    id: &str,
    hotkey: &str,
    action: HotkeyAction,
) {
    match parse_hotkey(hotkey) {
        Ok(signature) => {
            info!(id, hotkey = %signature.display_hint(), "registered hotkey");
            matcher.register(signature, id, action);
            report.registered.push(id.to_string());
        }
        Err(e) => {
            warn!(id, hotkey, error = %e, "skipping hotkey that failed to parse");
            report.skipped.push((id.to_string(), e));
        }
    }
}

fn toggle_action(controller: &Arc<QueueController>) -> HotkeyAction {
    let controller = Arc::clone(controller);
    Arc::new(move || {
        let controller = Arc::clone(&controller);
        async move {
            if let Err(e) = controller.toggle_queue().await {
                error!(error = %e, "toggle queue failed");
            }
        }
        .boxed()
    })
}

fn paste_next_action(controller: &Arc<QueueController>) -> HotkeyAction {
    let controller = Arc::clone(controller);
    Arc::new(move || {
        let controller = Arc::clone(&controller);
        async move {
            if let Err(e) = controller.paste_next().await {
                error!(error = %e, "paste next failed");
            }
        }
        .boxed()
    })
}

fn macro_action(controller: &Arc<QueueController>, binding: &MacroBinding) -> HotkeyAction {
    let controller = Arc::clone(controller);
    let text: Arc<str> = Arc::from(binding.text.as_str());
    let name: Arc<str> = Arc::from(binding.name.as_str());
    let mode = binding.mode;
    Arc::new(move || {
        let controller = Arc::clone(&controller);
        let text = Arc::clone(&text);
        let name = Arc::clone(&name);
        async move {
            if let Err(e) = controller.execute_macro(&text, mode).await {
                error!(name = %name, error = %e, "macro failed");
            }
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::queue_controller::ControllerSettings;
    use crate::infrastructure::clipboard::{LoggingInjector, MemoryClipboard};
    use clipqueue_core::signature::layout;
    use clipqueue_core::{InputSignature, ModifierState};

    const CTRL_ALT: ModifierState = ModifierState(ModifierState::CTRL | ModifierState::ALT);

    fn make_controller() -> (Arc<QueueController>, Arc<LoggingInjector>) {
        let injector = Arc::new(LoggingInjector::new());
        let controller = Arc::new(QueueController::new(
            Arc::new(MemoryClipboard::new()),
            injector.clone(),
            ControllerSettings::default(),
        ));
        (controller, injector)
    }

    fn defaults() -> HotkeyBindings {
        HotkeyBindings {
            toggle_queue: Some("sig:AQADCgBDAC4AAAAAAAAB".to_string()),
            paste_next: Some("Ctrl+Alt+V".to_string()),
            macros: vec![MacroBinding {
                name: "greeting".to_string(),
                hotkey: "Ctrl+Alt+G".to_string(),
                text: "Hello".to_string(),
                mode: MacroMode::Type,
            }],
        }
    }

    #[tokio::test]
    async fn test_install_registers_stable_ids() {
        // Arrange
        let (controller, _) = make_controller();
        let matcher = SignatureMatcher::new();

        // Act
        let report = install_bindings(&matcher, &controller, &defaults());

        // Assert
        assert_eq!(
            report.registered,
            vec!["toggle_queue", "paste_next", "macro:0:greeting"]
        );
        assert!(report.skipped.is_empty());
        assert_eq!(matcher.len(), 3);
    }

    #[tokio::test]
    async fn test_reinstall_replaces_previous_bindings() {
        // Arrange
        let (controller, _) = make_controller();
        let matcher = SignatureMatcher::new();
        install_bindings(&matcher, &controller, &defaults());
        let reduced = HotkeyBindings {
            toggle_queue: None,
            paste_next: None,
            ..defaults()
        };

        // Act
        let report = install_bindings(&matcher, &controller, &reduced);

        // Assert
        assert_eq!(report.registered, vec!["macro:0:greeting"]);
        let ids: Vec<String> = matcher.registrations().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["macro:0:greeting"]);
    }

    #[tokio::test]
    async fn test_bad_hotkey_is_skipped_and_others_still_installed() {
        // Arrange
        let (controller, _) = make_controller();
        let matcher = SignatureMatcher::new();
        let bindings = HotkeyBindings {
            paste_next: Some("Ctrl+Banana".to_string()),
            ..defaults()
        };

        // Act
        let report = install_bindings(&matcher, &controller, &bindings);

        // Assert
        assert_eq!(
            report.skipped,
            vec![(
                "paste_next".to_string(),
                ParseError::UnknownKey("Banana".to_string())
            )]
        );
        assert_eq!(report.registered.len(), 2);
    }

    #[tokio::test]
    async fn test_macro_action_runs_macro() {
        // Arrange
        let (controller, injector) = make_controller();
        let matcher = SignatureMatcher::new();
        install_bindings(&matcher, &controller, &defaults());
        let press = InputSignature::legacy_key(0x47, CTRL_ALT);

        // Act
        let action = matcher.match_signature(&press).expect("macro should be bound");
        action().await;

        // Assert
        assert_eq!(injector.typed_count(), 1);
        assert_eq!(injector.last_typed().as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_toggle_action_toggles_queue() {
        // Arrange
        let (controller, _) = make_controller();
        let matcher = SignatureMatcher::new();
        install_bindings(&matcher, &controller, &defaults());
        let press = InputSignature::keyboard(0x43, 0x2E, 0, layout::WM_KEYDOWN, CTRL_ALT);

        // Act
        let action = matcher.match_signature(&press).expect("toggle should be bound");
        action().await;

        // Assert
        assert!(controller.is_enabled());
    }
}
