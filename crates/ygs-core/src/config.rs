//! Configuration loading.
//!
//! ```yaml
//! widgets:
//!   - widget: static
//!     blocks: '[{"full_text": "hello"}]'
//!     template: '{"color": "#ff0000"}'
//!     events:
//!       - button: 1
//!         command: notify-send clicked
//! ```
//!
//! `widget`, `workspaces`, `template` and `events` belong to the core; every
//! other key is handed to the widget factory untouched. `workspaces` filters
//! by i3 workspace, which needs i3 IPC, so it is accepted and ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::block::Block;
use crate::error::ConfigError;
use crate::event::EventRule;
use crate::registry::WidgetRegistry;
use crate::status::WidgetSlot;
use crate::widget::WidgetParams;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "yagostatus.yml";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub widgets: Vec<WidgetConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    /// Registry kind, the `widget` key.
    pub kind: String,
    pub template: Block,
    pub events: Vec<EventRule>,
    pub params: WidgetParams,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    widgets: Vec<RawWidget>,
}

#[derive(Deserialize)]
struct RawWidget {
    #[serde(default)]
    widget: String,
    #[serde(default)]
    workspaces: Vec<String>,
    #[serde(default)]
    template: Option<Value>,
    #[serde(default)]
    events: Vec<EventRule>,
    #[serde(flatten)]
    params: Map<String, Value>,
}

impl Config {
    /// Reads and validates a config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parses and validates config text.
    ///
    /// # Errors
    /// Returns an error on malformed YAML, a missing widget name, an invalid
    /// template or an invalid event rule.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(raw)?;

        let widgets = raw
            .widgets
            .into_iter()
            .enumerate()
            .map(|(index, widget)| WidgetConfig::from_raw(index, widget))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { widgets })
    }

    /// Instantiates every configured widget, in configuration order.
    ///
    /// # Errors
    /// Returns the first widget that fails to configure.
    pub fn build_slots(&self, registry: &WidgetRegistry) -> Result<Vec<WidgetSlot>, ConfigError> {
        self.widgets
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let widget = registry
                    .create(&config.kind, &config.params)
                    .map_err(|cause| ConfigError::Widget {
                        index,
                        kind: config.kind.clone(),
                        cause: Box::new(cause),
                    })?;
                Ok(WidgetSlot::new(
                    widget,
                    config.events.clone(),
                    config.template.clone(),
                ))
            })
            .collect()
    }
}

impl WidgetConfig {
    fn from_raw(index: usize, raw: RawWidget) -> Result<Self, ConfigError> {
        let kind = raw.widget.trim().to_string();
        if kind.is_empty() {
            return Err(ConfigError::MissingWidgetName { index });
        }

        let template = match raw.template {
            None | Some(Value::Null) => Ok(Block::default()),
            Some(Value::String(json)) => serde_json::from_str(&json),
            Some(value) => serde_json::from_value(value),
        }
        .map_err(|e| ConfigError::InvalidTemplate {
            index,
            message: e.to_string(),
        })?;

        if !raw.workspaces.is_empty() {
            warn!(
                index,
                kind = %kind,
                workspaces = ?raw.workspaces,
                "workspace filter is not supported, showing widget everywhere"
            );
        }

        for rule in &raw.events {
            rule.validate().map_err(|cause| ConfigError::Widget {
                index,
                kind: kind.clone(),
                cause: Box::new(cause),
            })?;
        }

        Ok(Self {
            kind,
            template,
            events: raw.events,
            params: WidgetParams::new(raw.params),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const SAMPLE: &str = r##"
widgets:
  - widget: static
    blocks: '[{"full_text": "hello"}]'
    template: '{"color": "#ff0000", "separator": false}'
    events:
      - button: 1
        command: echo clicked
        output: true
        modifiers: [Shift, "!Control"]
  - widget: exec
    command: date
    interval: 5
    template:
      color: "#00ff00"
"##;

    #[test]
    fn parses_widgets_in_order() {
        let config = Config::parse(SAMPLE).unwrap();

        assert_eq!(config.widgets.len(), 2);
        let first = &config.widgets[0];
        assert_eq!(first.kind, "static");
        assert_eq!(first.template.color.as_deref(), Some("#ff0000"));
        assert_eq!(first.template.separator, Some(false));
        assert_eq!(first.events.len(), 1);
        assert!(first.events[0].output);
        assert!(first.params.get("blocks").is_some());
        assert!(first.params.get("template").is_none());
        assert!(first.params.get("events").is_none());

        let second = &config.widgets[1];
        assert_eq!(second.template.color.as_deref(), Some("#00ff00"));
        assert_eq!(second.params.require_str("command").unwrap(), "date");
        assert_eq!(second.params.f64("interval").unwrap(), Some(5.0));
    }

    #[test]
    fn workspaces_key_is_not_a_widget_param() {
        let raw = "widgets:\n  - widget: static\n    blocks: '[]'\n    workspaces: ['1', web]\n";
        let config = Config::parse(raw).unwrap();

        let params = &config.widgets[0].params;
        assert!(params.get("workspaces").is_none());
        assert!(params.get("blocks").is_some());
    }

    #[test]
    fn missing_widget_name_is_rejected() {
        let err = Config::parse("widgets:\n  - blocks: '[]'\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingWidgetName { index: 0 }));
    }

    #[test]
    fn invalid_template_is_rejected() {
        let err = Config::parse("widgets:\n  - widget: static\n    template: '{oops'\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { index: 0, .. }));
    }

    #[test]
    fn unknown_modifier_is_rejected() {
        let raw = "widgets:\n  - widget: static\n    events:\n      - command: x\n        modifiers: [Hyper]\n";
        let err = Config::parse(raw).unwrap_err();
        assert!(err.to_string().contains("unknown 'Hyper' modifier"));
    }

    #[test]
    fn build_slots_reports_widget_errors() {
        let config = Config::parse("widgets:\n  - widget: static\n  - widget: nope\n").unwrap();
        let err = config.build_slots(&WidgetRegistry::builtins()).err().unwrap();

        assert!(matches!(err, ConfigError::Widget { index: 0, .. }));
        assert!(err.to_string().contains("missing 'blocks' setting"));
    }

    #[test]
    fn build_slots_creates_one_slot_per_widget() {
        let config = Config::parse(SAMPLE).unwrap();
        let slots = config.build_slots(&WidgetRegistry::builtins()).unwrap();
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, SAMPLE).unwrap();

        assert_eq!(Config::load(&path).unwrap().widgets.len(), 2);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
