//! Widget shutdown.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::widget::Widget;

/// Stops all widgets concurrently and waits until every one has returned.
pub async fn stop_all<'a>(widgets: impl IntoIterator<Item = &'a Arc<dyn Widget>>) {
    join_all(widgets.into_iter().map(|widget| widget.stop())).await;
}
