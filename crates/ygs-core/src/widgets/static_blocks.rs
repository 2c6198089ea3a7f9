//! `static` widget: shows a fixed block-list.
//!
//! ```yaml
//! - widget: static
//!   blocks: '[{"full_text": "hello"}]'
//! ```
//!
//! `blocks` may be a JSON string or an inline YAML list.

use std::sync::Arc;

use serde_json::Value;

use crate::block::Block;
use crate::error::ConfigError;
use crate::widget::{BlockSender, Widget, WidgetFuture, WidgetParams};

pub const KIND: &str = "static";

#[derive(Debug, Clone)]
pub struct StaticWidget {
    blocks: Vec<Block>,
}

/// Registry entry point.
///
/// # Errors
/// Returns an error if `blocks` is missing or is not a block-list.
pub fn factory(params: &WidgetParams) -> Result<Arc<dyn Widget>, ConfigError> {
    Ok(Arc::new(StaticWidget::new(params)?))
}

impl StaticWidget {
    /// # Errors
    /// Returns an error if `blocks` is missing or is not a block-list.
    pub fn new(params: &WidgetParams) -> Result<Self, ConfigError> {
        let blocks = match params.get("blocks") {
            None | Some(Value::Null) => return Err(ConfigError::MissingParam("blocks".to_string())),
            Some(Value::String(raw)) if raw.trim().is_empty() => {
                return Err(ConfigError::MissingParam("blocks".to_string()));
            }
            Some(Value::String(raw)) => serde_json::from_str(raw),
            Some(value) => serde_json::from_value(value.clone()),
        }
        .map_err(|e| ConfigError::InvalidParam {
            key: "blocks".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { blocks })
    }
}

impl Widget for StaticWidget {
    fn run(&self, output: BlockSender) -> WidgetFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            // Receiver gone means the bar is shutting down.
            let _ = output.send(self.blocks.clone());
            Ok(())
        })
    }
}
