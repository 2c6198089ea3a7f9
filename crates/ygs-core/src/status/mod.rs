//! The status bar: widget runners, aggregated state, output encoder and
//! click event router.
//!
//! - `state`: per-widget publications and the publisher writing them
//! - `runner`: feed/processor task pair per widget
//! - `encoder`: i3bar output stream
//! - `router`: click event dispatch to widgets and event rules
//! - `command`: event command execution
//! - `shutdown`: concurrent widget stop

pub mod command;
pub mod encoder;
pub mod router;
pub mod runner;
pub mod shutdown;
pub mod state;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use self::encoder::Encoder;
use self::router::EventRouter;
use self::state::{AggregationState, Publisher};
use crate::block::Block;
use crate::event::EventRule;
use crate::widget::Widget;

/// How long stopped widgets get to hand over their last publications.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// One configured widget with its event rules and template.
pub struct WidgetSlot {
    pub widget: Arc<dyn Widget>,
    pub rules: Vec<EventRule>,
    pub template: Block,
}

impl WidgetSlot {
    pub fn new(widget: Arc<dyn Widget>, rules: Vec<EventRule>, template: Block) -> Self {
        Self {
            widget,
            rules,
            template,
        }
    }
}

impl std::fmt::Debug for WidgetSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetSlot")
            .field("rules", &self.rules)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct StatusBar {
    slots: Arc<[WidgetSlot]>,
}

impl StatusBar {
    pub fn new(slots: Vec<WidgetSlot>) -> Self {
        Self {
            slots: slots.into(),
        }
    }

    /// Runs the bar until `input` closes or `shutdown` resolves, then stops
    /// every widget and returns the output stream.
    ///
    /// # Errors
    /// Returns an error if the output stream cannot be written.
    pub async fn run<R, W, S>(self, input: R, output: W, shutdown: S) -> Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let state = Arc::new(AggregationState::new(self.slots.len()));
        let templates: Arc<[Block]> = self.slots.iter().map(|s| s.template.clone()).collect();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let publisher = Publisher::new(Arc::clone(&state), templates, updates_tx);

        let encoder = Encoder::start(output)
            .await
            .context("failed to write protocol header")?;
        let mut encoder_task = tokio::spawn(encoder::run(encoder, Arc::clone(&state), updates_rx));

        let mut runners = JoinSet::new();
        for (index, slot) in self.slots.iter().enumerate() {
            runner::spawn(&mut runners, index, Arc::clone(&slot.widget), publisher.clone());
        }

        let router = EventRouter::new(Arc::clone(&self.slots), publisher);
        let encoder_result = tokio::select! {
            result = router.run(input) => {
                match result {
                    Ok(()) => info!("click event input closed"),
                    Err(err) => warn!("failed to read click events: {err}"),
                }
                None
            }
            () = shutdown => {
                info!("shutdown requested");
                None
            }
            result = &mut encoder_task => Some(result),
        };
        drop(router);

        shutdown::stop_all(self.slots.iter().map(|slot| &slot.widget)).await;
        drain(&mut runners).await;

        let encoder_result = match encoder_result {
            Some(result) => result,
            None => encoder_task.await,
        };
        encoder_result
            .context("status encoder task failed")?
            .context("failed to write status output")
    }
}

/// Waits for the runners of stopped widgets, aborting stragglers.
///
/// The encoder finishes once the last runner is gone.
async fn drain(runners: &mut JoinSet<()>) {
    let finished = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while runners.join_next().await.is_some() {}
    })
    .await;

    if finished.is_err() {
        warn!(
            remaining = runners.len(),
            "widgets still running after stop, abandoning them"
        );
        runners.abort_all();
        while runners.join_next().await.is_some() {}
    }
}
