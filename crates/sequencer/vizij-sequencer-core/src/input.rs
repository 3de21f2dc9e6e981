//! Input model and key-binding table.
//!
//! Hosts translate their window events into `InputEvent`s and hand them to
//! `EditorSession::handle_input`. Keys resolve to an `Action` through
//! `KeyBindings`; the session owns the dispatch from action to operation.
//!
//! Bindings serialize as a TOML table of key name to action:
//! ```toml
//! [bindings]
//! space = "toggle_playback"
//! k = "add_keyframe"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SequencerError;

/// Editor operations that can be bound to keys or buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TogglePlayback,
    DeleteSelected,
    AddKeyframe,
    RemoveLastKeyframe,
    PlaySequence,
    ClearKeyframes,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::TogglePlayback,
        Action::DeleteSelected,
        Action::AddKeyframe,
        Action::RemoveLastKeyframe,
        Action::PlaySequence,
        Action::ClearKeyframes,
    ];

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TogglePlayback => "toggle_playback",
            Self::DeleteSelected => "delete_selected",
            Self::AddKeyframe => "add_keyframe",
            Self::RemoveLastKeyframe => "remove_last_keyframe",
            Self::PlaySequence => "play_sequence",
            Self::ClearKeyframes => "clear_keyframes",
        }
    }
}

/// Raw input, already in timeline-view coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Primary button pressed at `x` pixels from the left of the view.
    PointerDown { x: f32 },
    PointerMove { x: f32 },
    PointerUp,
    PointerEnter { x: f32 },
    PointerLeave,
    /// Key name as reported by the host, e.g. `"space"` or `"k"`.
    KeyDown { key: String },
    /// Timeline view resized.
    Resize { pixel_length: u32 },
}

impl InputEvent {
    #[inline]
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Self::PointerDown { .. }
                | Self::PointerMove { .. }
                | Self::PointerUp
                | Self::PointerEnter { .. }
                | Self::PointerLeave
        )
    }
}

/// Key name → action. Names are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    bindings: IndexMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = IndexMap::from([
            ("space".to_string(), Action::TogglePlayback),
            ("delete".to_string(), Action::DeleteSelected),
            ("backspace".to_string(), Action::DeleteSelected),
            ("k".to_string(), Action::AddKeyframe),
            ("p".to_string(), Action::PlaySequence),
        ]);
        Self { bindings }
    }
}

impl KeyBindings {
    /// No bindings at all.
    pub fn empty() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    /// Look up the action bound to `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Action> {
        self.bindings.get(&normalize_key(key)).copied()
    }

    /// Bind `key` to `action`, returning the action it replaced.
    pub fn bind(&mut self, key: &str, action: Action) -> Option<Action> {
        self.bindings.insert(normalize_key(key), action)
    }

    pub fn unbind(&mut self, key: &str) -> Option<Action> {
        self.bindings.shift_remove(&normalize_key(key))
    }

    /// Keys bound to `action`, in binding order.
    pub fn keys_for(&self, action: Action) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Action)> {
        self.bindings.iter().map(|(k, a)| (k.as_str(), *a))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Parse a bindings table. Key names are normalized; missing table means defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, SequencerError> {
        let raw: Self = toml::from_str(s)?;
        let mut out = Self::empty();
        for (key, action) in raw.bindings {
            if key.trim().is_empty() {
                return Err(SequencerError::InvalidConfig {
                    reason: format!("empty key name bound to {}", action.name()),
                });
            }
            out.bind(&key, action);
        }
        Ok(out)
    }

    pub fn to_toml_string(&self) -> Result<String, SequencerError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lookup() {
        let b = KeyBindings::default();
        assert_eq!(b.lookup("space"), Some(Action::TogglePlayback));
        assert_eq!(b.lookup("Delete"), Some(Action::DeleteSelected));
        assert_eq!(b.lookup("BACKSPACE"), Some(Action::DeleteSelected));
        assert_eq!(b.lookup("K"), Some(Action::AddKeyframe));
        assert_eq!(b.lookup("z"), None);
        assert_eq!(b.keys_for(Action::DeleteSelected), vec!["delete", "backspace"]);
    }

    #[test]
    fn rebinding_replaces() {
        let mut b = KeyBindings::default();
        assert_eq!(b.bind("K", Action::RemoveLastKeyframe), Some(Action::AddKeyframe));
        assert_eq!(b.lookup("k"), Some(Action::RemoveLastKeyframe));
        assert_eq!(b.unbind("k"), Some(Action::RemoveLastKeyframe));
        assert_eq!(b.lookup("k"), None);
    }

    #[test]
    fn parses_partial_table() {
        let b = KeyBindings::from_toml_str(
            r#"
[bindings]
Space = "play_sequence"
x = "clear_keyframes"
"#,
        )
        .unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.lookup("space"), Some(Action::PlaySequence));
        assert_eq!(b.lookup("x"), Some(Action::ClearKeyframes));
    }

    #[test]
    fn missing_table_keeps_defaults() {
        let b = KeyBindings::from_toml_str("").unwrap();
        assert_eq!(b, KeyBindings::default());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = KeyBindings::from_toml_str("[bindings]\nq = \"explode\"\n").unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn pointer_classification() {
        assert!(InputEvent::PointerUp.is_pointer());
        assert!(!InputEvent::KeyDown { key: "k".into() }.is_pointer());
        assert!(!InputEvent::Resize { pixel_length: 10 }.is_pointer());
    }
}
