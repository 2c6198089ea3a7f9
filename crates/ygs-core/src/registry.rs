//! Widget registry (kind name -> factory).
//!
//! Built once by the composition layer and handed to the config loader; the
//! core never looks widgets up anywhere else.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::widget::{Widget, WidgetParams};
use crate::widgets;

/// Builds a configured widget, validating its settings.
pub type WidgetFactory =
    Arc<dyn Fn(&WidgetParams) -> Result<Arc<dyn Widget>, ConfigError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    factories: BTreeMap<String, WidgetFactory>,
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the widgets shipped in this crate.
    pub fn builtins() -> Self {
        let mut registry = Self::new();
        registry.register(widgets::static_blocks::KIND, Arc::new(widgets::static_blocks::factory));
        registry.register(widgets::exec::KIND, Arc::new(widgets::exec::factory));
        registry
    }

    /// Registers `factory` under `kind`, replacing any previous entry.
    pub fn register(&mut self, kind: &str, factory: WidgetFactory) {
        self.factories.insert(kind.to_string(), factory);
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Creates a widget of the given kind.
    ///
    /// # Errors
    /// Returns an error if the kind is unknown or the factory rejects `params`.
    pub fn create(&self, kind: &str, params: &WidgetParams) -> Result<Arc<dyn Widget>, ConfigError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownWidget(kind.to_string()))?;
        factory(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{BlockSender, WidgetFuture};

    struct Nop;

    impl Widget for Nop {
        fn run(&self, _output: BlockSender) -> WidgetFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = WidgetRegistry::builtins();
        assert_eq!(registry.kinds(), vec!["exec", "static"]);
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        let registry = WidgetRegistry::builtins();
        let err = registry
            .create("clock", &WidgetParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnknownWidget(kind) if kind == "clock"));
    }

    #[test]
    fn factory_errors_are_propagated() {
        let registry = WidgetRegistry::builtins();
        let err = registry
            .create("static", &WidgetParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingParam(key) if key == "blocks"));
    }

    #[test]
    fn custom_widgets_can_be_added() {
        let mut registry = WidgetRegistry::new();
        registry.register(
            "nop",
            Arc::new(|_: &WidgetParams| -> Result<Arc<dyn Widget>, ConfigError> {
                Ok(Arc::new(Nop))
            }),
        );
        assert_eq!(registry.kinds(), vec!["nop"]);
        assert!(registry.create("nop", &WidgetParams::default()).is_ok());
    }
}
