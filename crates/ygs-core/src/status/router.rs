//! Click event routing.
//!
//! Events are handled one at a time, including the commands they trigger.
//! Widget updates keep flowing meanwhile since they never pass through here.

use std::io;
use std::str;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use super::WidgetSlot;
use super::command;
use super::state::Publisher;
use crate::block::Block;
use crate::event::ClickEvent;
use crate::namespace::{self, BlockAddress};

/// Characters wrapping each event line of the host's endless array.
const LINE_DECORATION: &[char] = &['[', ']', ',', ' ', '\t', '\r', '\n'];

pub struct EventRouter {
    slots: Arc<[WidgetSlot]>,
    publisher: Publisher,
}

impl EventRouter {
    pub fn new(slots: Arc<[WidgetSlot]>, publisher: Publisher) -> Self {
        Self { slots, publisher }
    }

    /// Handles click events from `input` until it is closed.
    ///
    /// # Errors
    /// Returns an error if reading `input` fails.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, mut input: R) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(());
            }
            match str::from_utf8(&buf) {
                Ok(line) => self.handle_line(line).await,
                Err(err) => warn!("click event is not valid UTF-8: {err}"),
            }
        }
    }

    /// Parses and dispatches one input line. Malformed lines are skipped.
    pub async fn handle_line(&self, line: &str) {
        let line = line.trim_matches(LINE_DECORATION);
        if line.is_empty() {
            return;
        }
        match serde_json::from_str::<ClickEvent>(line) {
            Ok(event) => {
                self.dispatch(&event).await;
            }
            Err(err) => warn!("malformed click event: {err} ({line})"),
        }
    }

    /// Routes a namespaced event to every block carrying its identity.
    ///
    /// Returns the number of matched blocks.
    pub async fn dispatch(&self, event: &ClickEvent) -> usize {
        let targets = self.find(event);
        if targets.is_empty() {
            warn!(
                name = %event.name,
                instance = %event.instance,
                "click event matches no block"
            );
        }
        for address in &targets {
            self.handle_block(address, event).await;
        }
        targets.len()
    }

    fn find(&self, event: &ClickEvent) -> Vec<BlockAddress> {
        let state = self.publisher.state();
        let mut targets = Vec::new();
        for widget in 0..state.len() {
            for (position, block) in state.get(widget).iter().enumerate() {
                if block.name.as_deref() != Some(event.name.as_str())
                    || block.instance.as_deref() != Some(event.instance.as_str())
                {
                    continue;
                }
                match namespace::decode(&event.name, &event.instance) {
                    Some(address) => targets.push(BlockAddress {
                        widget,
                        position,
                        ..address
                    }),
                    None => warn!(name = %event.name, "block identity is not namespaced"),
                }
            }
        }
        targets
    }

    async fn handle_block(&self, address: &BlockAddress, event: &ClickEvent) {
        let Some(slot) = self.slots.get(address.widget) else {
            return;
        };
        let event = ClickEvent {
            name: address.name.clone(),
            instance: address.instance.clone(),
            ..event.clone()
        };
        debug!(widget = address.widget, position = address.position, "click");

        for rule in slot.rules.iter().filter(|rule| rule.matches(&event)) {
            match command::run(&rule.command, &event).await {
                Ok(stdout) if rule.output => {
                    self.apply_output(address, &stdout);
                }
                Ok(_) => {}
                Err(err) => warn!(widget = address.widget, "event command failed: {err:#}"),
            }
        }

        slot.widget.event(&event);
    }

    fn apply_output(&self, address: &BlockAddress, stdout: &[u8]) {
        match serde_json::from_slice::<Vec<Block>>(stdout) {
            Ok(blocks) => self.publisher.publish(address.widget, blocks),
            Err(err) => {
                debug!("command output is not a block-list ({err}), using it as text");
                let text = String::from_utf8_lossy(stdout);
                let text = text.trim_matches(&['\n', '\r'][..]);
                if !self
                    .publisher
                    .set_full_text(address.widget, address.position, text)
                {
                    warn!(
                        widget = address.widget,
                        position = address.position,
                        "clicked block no longer exists"
                    );
                }
            }
        }
    }
}
