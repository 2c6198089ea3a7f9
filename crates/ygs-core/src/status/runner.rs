//! Widget runners.
//!
//! Each widget gets two tasks: a feed task driving `Widget::run` and a
//! processor task that drains the widget's channel into the
//! [`Publisher`]. A slow widget only ever blocks its own feed task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::state::Publisher;
use crate::block::Block;
use crate::widget::{BlockReceiver, BlockSender, Widget};

/// Starts the feed and processor tasks for widget `index` on `tasks`.
pub fn spawn(
    tasks: &mut JoinSet<()>,
    index: usize,
    widget: Arc<dyn Widget>,
    publisher: Publisher,
) {
    let (sender, receiver) = mpsc::unbounded_channel();
    tasks.spawn(feed(index, widget, sender));
    tasks.spawn(process(index, receiver, publisher));
}

async fn feed(index: usize, widget: Arc<dyn Widget>, output: BlockSender) {
    match widget.run(output.clone()).await {
        Ok(()) => debug!(widget = index, "widget finished"),
        Err(err) => {
            warn!(widget = index, "widget failed: {err:#}");
            let _ = output.send(vec![Block::error(format!("{err:#}"))]);
        }
    }
}

/// Applies publications in the order the widget sent them.
///
/// The widget hands over ownership of each list, so nothing it keeps can
/// alias what ends up in the shared state.
async fn process(index: usize, mut receiver: BlockReceiver, publisher: Publisher) {
    while let Some(blocks) = receiver.recv().await {
        publisher.publish(index, blocks);
    }
    debug!(widget = index, "widget channel closed");
}
