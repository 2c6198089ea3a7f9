//! i3bar block model and the template merge.
//!
//! A [`Block`] is one displayable element of the status line. The well-known
//! i3bar attributes are typed fields; anything else (custom `_foo` keys and
//! attributes newer than this model) lands in [`Block::extra`] so it survives
//! the round trip from widget to host unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `min_width` accepts either a pixel count or a sample string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinWidth {
    Pixels(u32),
    Text(String),
}

/// One element of the i3bar status line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Text shown on the bar. An empty value counts as unset when merging.
    #[serde(default)]
    pub full_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_top: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_right: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_left: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<MinWidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator_block_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    /// Attributes not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// Creates a block showing `full_text`.
    pub fn text(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            ..Self::default()
        }
    }

    /// Creates the urgent block used to surface a failure on the bar.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            full_text: message.into(),
            urgent: Some(true),
            ..Self::default()
        }
    }

    /// Returns `self` with unset fields filled in from `template`.
    ///
    /// Fields set on `self` always win. The merge is one level deep: extra
    /// attributes are overridden key by key, their values are never merged.
    #[must_use]
    pub fn merge(mut self, template: &Block) -> Self {
        if self.full_text.is_empty() {
            self.full_text.clone_from(&template.full_text);
        }

        macro_rules! inherit {
            ($($field:ident),* $(,)?) => {
                $(
                    if self.$field.is_none() {
                        self.$field.clone_from(&template.$field);
                    }
                )*
            };
        }

        inherit!(
            short_text,
            color,
            background,
            border,
            border_top,
            border_right,
            border_bottom,
            border_left,
            min_width,
            align,
            name,
            instance,
            urgent,
            separator,
            separator_block_width,
            markup,
        );

        for (key, value) in &template.extra {
            self.extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        self
    }
}
