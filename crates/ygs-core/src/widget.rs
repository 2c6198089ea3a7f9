//! The contract every widget implements.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::block::Block;
use crate::error::ConfigError;
use crate::event::ClickEvent;

/// Boxed future returned by widget methods.
pub type WidgetFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Channel a widget publishes its block-lists on. An empty list clears its
/// output.
pub type BlockSender = mpsc::UnboundedSender<Vec<Block>>;
pub type BlockReceiver = mpsc::UnboundedReceiver<Vec<Block>>;

/// An independent producer of block-lists.
///
/// Widgets are shared between the runner, the event router and the shutdown
/// path, so every method takes `&self` and may be called concurrently.
pub trait Widget: Send + Sync {
    /// Publishes block-lists on `output` until the widget terminates.
    ///
    /// An error is shown on the bar as an urgent block; the widget is not
    /// restarted.
    fn run(&self, output: BlockSender) -> WidgetFuture<'_, anyhow::Result<()>>;

    /// Notifies the widget of a click on one of its blocks.
    fn event(&self, _event: &ClickEvent) {}

    /// Requests termination and resolves once cleanup is complete.
    fn stop(&self) -> WidgetFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Widget-specific settings from the configuration, opaque to the core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetParams(Map<String, Value>);

impl WidgetParams {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns an optional string setting.
    ///
    /// # Errors
    /// Returns an error if the value is present but not a string.
    pub fn str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(invalid(key, "expected a string", other)),
        }
    }

    /// Returns a required, non-empty string setting.
    ///
    /// # Errors
    /// Returns an error if the value is missing, empty or not a string.
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.str(key)? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(ConfigError::MissingParam(key.to_string())),
        }
    }

    /// Returns an optional non-negative number setting.
    ///
    /// # Errors
    /// Returns an error if the value is present but not a non-negative number.
    pub fn f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match value.as_f64() {
                Some(v) if v >= 0.0 => Ok(Some(v)),
                _ => Err(invalid(key, "expected a non-negative number", value)),
            },
        }
    }

    /// Returns an optional boolean setting.
    ///
    /// # Errors
    /// Returns an error if the value is present but not a boolean.
    pub fn bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(invalid(key, "expected a boolean", other)),
        }
    }
}

impl From<Map<String, Value>> for WidgetParams {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

fn invalid(key: &str, expected: &str, got: &Value) -> ConfigError {
    ConfigError::InvalidParam {
        key: key.to_string(),
        message: format!("{expected}, got {got}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> WidgetParams {
        match value {
            Value::Object(map) => WidgetParams::new(map),
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn typed_accessors() {
        let p = params(json!({
            "command": "date",
            "interval": 1.5,
            "silent": true,
            "empty": ""
        }));

        assert_eq!(p.require_str("command").unwrap(), "date");
        assert_eq!(p.f64("interval").unwrap(), Some(1.5));
        assert_eq!(p.bool("silent").unwrap(), Some(true));
        assert_eq!(p.str("missing").unwrap(), None);
    }

    #[test]
    fn required_string_must_be_present_and_non_empty() {
        let p = params(json!({ "empty": "", "number": 3 }));

        assert!(matches!(
            p.require_str("empty"),
            Err(ConfigError::MissingParam(key)) if key == "empty"
        ));
        assert!(matches!(p.require_str("absent"), Err(ConfigError::MissingParam(_))));
        assert!(matches!(p.require_str("number"), Err(ConfigError::InvalidParam { .. })));
    }

    #[test]
    fn negative_numbers_are_rejected() {
        let p = params(json!({ "interval": -1 }));
        assert!(matches!(p.f64("interval"), Err(ConfigError::InvalidParam { .. })));
    }
}
