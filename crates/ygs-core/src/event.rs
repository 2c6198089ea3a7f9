//! Click events from the host and the per-widget rules that react to them.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Modifier names the host reports in `modifiers`.
pub const MODIFIERS: [&str; 7] = [
    "Shift", "Control", "Mod1", "Mod2", "Mod3", "Mod4", "Mod5",
];

/// A click event as emitted by i3bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub button: u8,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

impl ClickEvent {
    fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// A configured reaction to clicks on a widget's blocks.
///
/// Empty `name`/`instance` and `button == 0` match anything. A modifier
/// prefixed with `!` must not be held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRule {
    #[serde(default)]
    pub button: u8,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    /// Parse the command's stdout as the widget's new output.
    #[serde(default)]
    pub output: bool,
}

impl EventRule {
    /// Checks the command and modifier names.
    ///
    /// # Errors
    /// Returns an error for an empty command or an unknown modifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command.trim().is_empty() {
            return Err(ConfigError::MissingParam("command".to_string()));
        }
        for modifier in &self.modifiers {
            let bare = modifier.trim_start_matches('!');
            if !MODIFIERS.contains(&bare) {
                return Err(ConfigError::UnknownModifier(bare.to_string()));
            }
        }
        Ok(())
    }

    /// Returns whether this rule fires for a de-namespaced event.
    pub fn matches(&self, event: &ClickEvent) -> bool {
        (self.button == 0 || self.button == event.button)
            && (self.name.is_empty() || self.name == event.name)
            && (self.instance.is_empty() || self.instance == event.instance)
            && self.modifiers.iter().all(|modifier| {
                match modifier.strip_prefix('!') {
                    Some(excluded) => !event.has_modifier(excluded),
                    None => event.has_modifier(modifier),
                }
            })
    }
}
