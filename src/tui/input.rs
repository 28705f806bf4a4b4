//! Key routing for the dashboard: overlay keys first, then global keys, then
//! keys owned by the current view.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::model::{DashboardMsg, Overlay, View};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputContext {
    pub view: View,
    pub overlay: Option<Overlay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    SwitchView(View),
    NextView,
    PrevView,
    ToggleHelp,
    CloseOverlay,
    DismissNotices,
    RefreshHistory,
    SettingsUp,
    SettingsDown,
    ApplyRate,
    RequestClear,
    ConfirmClear,
    CancelClear,
}

impl InputAction {
    /// Message the update function handles for this action.
    #[must_use]
    pub fn into_msg(self) -> DashboardMsg {
        match self {
            Self::Quit => DashboardMsg::Quit,
            Self::SwitchView(view) => DashboardMsg::SwitchView(view),
            Self::NextView => DashboardMsg::NextView,
            Self::PrevView => DashboardMsg::PrevView,
            Self::ToggleHelp => DashboardMsg::ToggleHelp,
            Self::CloseOverlay => DashboardMsg::CloseOverlay,
            Self::DismissNotices => DashboardMsg::DismissNotices,
            Self::RefreshHistory => DashboardMsg::RefreshHistory,
            Self::SettingsUp => DashboardMsg::SettingsCursorUp,
            Self::SettingsDown => DashboardMsg::SettingsCursorDown,
            Self::ApplyRate => DashboardMsg::ApplySelectedRate,
            Self::RequestClear => DashboardMsg::RequestClearHistory,
            Self::ConfirmClear => DashboardMsg::ConfirmClear,
            Self::CancelClear => DashboardMsg::CancelClear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputResolution {
    pub action: Option<InputAction>,
    pub consumed: bool,
}

impl InputResolution {
    const fn action(action: InputAction) -> Self {
        Self {
            action: Some(action),
            consumed: true,
        }
    }

    const fn consumed_without_action() -> Self {
        Self {
            action: None,
            consumed: true,
        }
    }

    const fn passthrough() -> Self {
        Self {
            action: None,
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

/// Resolve a key event using deterministic precedence rules.
#[must_use]
pub fn resolve_key_event(key: &KeyEvent, context: InputContext) -> InputResolution {
    if let Some(overlay) = context.overlay {
        return resolve_overlay_key(key, overlay);
    }
    let global = resolve_global_key(key);
    if global.consumed {
        return global;
    }
    resolve_view_key(key, context.view)
}

/// Bindings listed in the help overlay for `view`.
#[must_use]
pub fn help_bindings(view: View) -> Vec<HelpBinding> {
    let mut bindings = GLOBAL_HELP_BINDINGS.to_vec();
    match view {
        View::Alerts => bindings.push(HelpBinding {
            keys: "r",
            description: "Reload alert history",
        }),
        View::Settings => bindings.extend_from_slice(&SETTINGS_HELP_BINDINGS),
        View::Dashboard | View::Models => {}
    }
    bindings
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn resolve_overlay_key(key: &KeyEvent, overlay: Overlay) -> InputResolution {
    if is_ctrl_c(key) {
        return InputResolution::action(InputAction::Quit);
    }
    match overlay {
        Overlay::Help => match key.code {
            KeyCode::Esc | KeyCode::Char('?') => {
                InputResolution::action(InputAction::CloseOverlay)
            }
            _ => InputResolution::consumed_without_action(),
        },
        Overlay::ConfirmClear => match key.code {
            KeyCode::Char('y' | 'Y') => InputResolution::action(InputAction::ConfirmClear),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                InputResolution::action(InputAction::CancelClear)
            }
            _ => InputResolution::consumed_without_action(),
        },
    }
}

fn resolve_global_key(key: &KeyEvent) -> InputResolution {
    if is_ctrl_c(key) {
        return InputResolution::action(InputAction::Quit);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => InputResolution::action(InputAction::Quit),
        KeyCode::Char(c @ '1'..='4') => match View::from_number(c as u8 - b'0') {
            Some(view) => InputResolution::action(InputAction::SwitchView(view)),
            None => InputResolution::passthrough(),
        },
        KeyCode::Tab | KeyCode::Char(']') => InputResolution::action(InputAction::NextView),
        KeyCode::BackTab | KeyCode::Char('[') => InputResolution::action(InputAction::PrevView),
        KeyCode::Char('?') => InputResolution::action(InputAction::ToggleHelp),
        KeyCode::Char('x') => InputResolution::action(InputAction::DismissNotices),
        _ => InputResolution::passthrough(),
    }
}

fn resolve_view_key(key: &KeyEvent, view: View) -> InputResolution {
    match (view, key.code) {
        (View::Alerts, KeyCode::Char('r')) => {
            InputResolution::action(InputAction::RefreshHistory)
        }
        (View::Settings, KeyCode::Up | KeyCode::Char('k')) => {
            InputResolution::action(InputAction::SettingsUp)
        }
        (View::Settings, KeyCode::Down | KeyCode::Char('j')) => {
            InputResolution::action(InputAction::SettingsDown)
        }
        (View::Settings, KeyCode::Enter) => InputResolution::action(InputAction::ApplyRate),
        (View::Settings, KeyCode::Char('c')) => InputResolution::action(InputAction::RequestClear),
        _ => InputResolution::passthrough(),
    }
}

const GLOBAL_HELP_BINDINGS: [HelpBinding; 6] = [
    HelpBinding {
        keys: "1..4",
        description: "Jump directly to view",
    },
    HelpBinding {
        keys: "Tab / ]",
        description: "Next view",
    },
    HelpBinding {
        keys: "S-Tab / [",
        description: "Previous view",
    },
    HelpBinding {
        keys: "x",
        description: "Dismiss messages",
    },
    HelpBinding {
        keys: "?",
        description: "Toggle this help",
    },
    HelpBinding {
        keys: "q / Esc",
        description: "Quit",
    },
];

const SETTINGS_HELP_BINDINGS: [HelpBinding; 3] = [
    HelpBinding {
        keys: "Up / Down",
        description: "Choose refresh rate",
    },
    HelpBinding {
        keys: "Enter",
        description: "Apply refresh rate",
    },
    HelpBinding {
        keys: "c",
        description: "Clear alert history",
    },
];
