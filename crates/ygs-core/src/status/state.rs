//! Aggregated widget output.
//!
//! One entry per widget, sized at startup. Each entry is swapped as a whole
//! under its own lock, so readers see either the previous or the next
//! publication of a widget and never a mix of both.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

use crate::block::Block;
use crate::namespace;

type Publication = Arc<Vec<Block>>;

#[derive(Debug)]
pub struct AggregationState {
    slots: Vec<RwLock<Publication>>,
}

impl AggregationState {
    pub fn new(widgets: usize) -> Self {
        Self {
            slots: (0..widgets).map(|_| RwLock::default()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current publication of one widget (empty for unknown indices).
    pub fn get(&self, widget: usize) -> Publication {
        self.slots.get(widget).map_or_else(Publication::default, |slot| {
            Arc::clone(&slot.read().unwrap_or_else(PoisonError::into_inner))
        })
    }

    /// Concatenation of all publications in widget order.
    pub fn snapshot(&self) -> Vec<Block> {
        let mut blocks = Vec::new();
        for widget in 0..self.slots.len() {
            blocks.extend(self.get(widget).iter().cloned());
        }
        blocks
    }

    fn replace(&self, widget: usize, blocks: Vec<Block>) -> bool {
        let Some(slot) = self.slots.get(widget) else {
            return false;
        };
        *slot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(blocks);
        true
    }

    /// Read-modify-write of one entry under its lock.
    fn update(&self, widget: usize, f: impl FnOnce(&[Block]) -> Option<Vec<Block>>) -> bool {
        let Some(slot) = self.slots.get(widget) else {
            return false;
        };
        let mut current = slot.write().unwrap_or_else(PoisonError::into_inner);
        match f(&current) {
            Some(blocks) => {
                *current = Arc::new(blocks);
                true
            }
            None => false,
        }
    }
}

/// Write side of [`AggregationState`].
///
/// Applies the widget template and namespacing, replaces the widget's entry
/// and tells the encoder which widget changed.
#[derive(Debug, Clone)]
pub struct Publisher {
    state: Arc<AggregationState>,
    templates: Arc<[Block]>,
    updates: mpsc::UnboundedSender<usize>,
}

impl Publisher {
    pub fn new(
        state: Arc<AggregationState>,
        templates: Arc<[Block]>,
        updates: mpsc::UnboundedSender<usize>,
    ) -> Self {
        Self {
            state,
            templates,
            updates,
        }
    }

    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    /// Publishes a widget's raw block-list.
    pub fn publish(&self, widget: usize, blocks: Vec<Block>) {
        let blocks = self.prepare(widget, blocks);
        debug!(widget, blocks = blocks.len(), "publish");
        if self.state.replace(widget, blocks) {
            self.notify(widget);
        }
    }

    /// Replaces the text of one published block.
    ///
    /// Returns false, leaving the state untouched, when the widget no longer
    /// has a block at `position`.
    pub fn set_full_text(&self, widget: usize, position: usize, text: &str) -> bool {
        let updated = self.state.update(widget, |current| {
            let mut blocks = current.to_vec();
            blocks.get_mut(position)?.full_text = text.to_string();
            Some(blocks)
        });
        if updated {
            self.notify(widget);
        }
        updated
    }

    fn prepare(&self, widget: usize, blocks: Vec<Block>) -> Vec<Block> {
        let template = self.templates.get(widget);
        blocks
            .into_iter()
            .enumerate()
            .map(|(position, block)| {
                let mut block = match template {
                    Some(template) => block.merge(template),
                    None => block,
                };
                namespace::encode(&mut block, widget, position);
                block
            })
            .collect()
    }

    fn notify(&self, widget: usize) {
        // Encoder gone means shutdown is in progress.
        let _ = self.updates.send(widget);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher(templates: Vec<Block>) -> (Publisher, mpsc::UnboundedReceiver<usize>) {
        let state = Arc::new(AggregationState::new(templates.len()));
        let (tx, rx) = mpsc::unbounded_channel();
        (Publisher::new(state, templates.into(), tx), rx)
    }

    #[test]
    fn publish_merges_namespaces_and_signals() {
        let mut template = Block::default();
        template.color = Some("#123456".to_string());
        let (publisher, mut rx) = publisher(vec![Block::default(), template]);

        let mut live = Block::text("b");
        live.instance = Some("eth0".to_string());
        publisher.publish(1, vec![Block::text("a"), live]);

        let published = publisher.state().get(1);
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].color.as_deref(), Some("#123456"));
        assert_eq!(published[0].name.as_deref(), Some("ygs-1-"));
        assert_eq!(published[0].instance.as_deref(), Some("ygs-1-0-"));
        assert_eq!(published[1].instance.as_deref(), Some("ygs-1-1-eth0"));
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[test]
    fn snapshot_is_in_widget_order() {
        let (publisher, _rx) = publisher(vec![Block::default(); 3]);

        publisher.publish(2, vec![Block::text("c")]);
        publisher.publish(0, vec![Block::text("a")]);

        let texts: Vec<_> = publisher
            .state()
            .snapshot()
            .into_iter()
            .map(|b| b.full_text)
            .collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn empty_publication_clears_widget() {
        let (publisher, _rx) = publisher(vec![Block::default()]);
        publisher.publish(0, vec![Block::text("a")]);
        publisher.publish(0, Vec::new());

        assert!(publisher.state().snapshot().is_empty());
    }

    #[test]
    fn out_of_range_widget_is_ignored() {
        let (publisher, mut rx) = publisher(vec![Block::default()]);
        publisher.publish(5, vec![Block::text("x")]);

        assert!(publisher.state().snapshot().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn set_full_text_touches_one_block() {
        let (publisher, mut rx) = publisher(vec![Block::default()]);
        publisher.publish(0, vec![Block::text("a"), Block::text("b")]);
        let _ = rx.try_recv();

        assert!(publisher.set_full_text(0, 1, "clicked"));
        let blocks = publisher.state().get(0);
        assert_eq!(blocks[0].full_text, "a");
        assert_eq!(blocks[1].full_text, "clicked");
        assert_eq!(blocks[1].instance.as_deref(), Some("ygs-0-1-"));
        assert_eq!(rx.try_recv().unwrap(), 0);
    }

    #[test]
    fn set_full_text_out_of_range_is_a_noop() {
        let (publisher, mut rx) = publisher(vec![Block::default()]);
        publisher.publish(0, vec![Block::text("a")]);
        let _ = rx.try_recv();

        assert!(!publisher.set_full_text(0, 3, "lost"));
        assert_eq!(publisher.state().get(0)[0].full_text, "a");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publications_never_tear() {
        const WIDGETS: usize = 6;
        const ROUNDS: usize = 200;

        let (publisher, _rx) = publisher(vec![Block::default(); WIDGETS]);

        let writers: Vec<_> = (0..WIDGETS)
            .map(|widget| {
                let publisher = publisher.clone();
                tokio::spawn(async move {
                    for seq in 0..ROUNDS {
                        let blocks = (0..3).map(|_| Block::text(seq.to_string())).collect();
                        publisher.publish(widget, blocks);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let reader = {
            let publisher = publisher.clone();
            tokio::spawn(async move {
                let mut last_seen = [0usize; WIDGETS];
                for _ in 0..ROUNDS {
                    let mut seen: Vec<Option<usize>> = vec![None; WIDGETS];
                    for block in publisher.state().snapshot() {
                        let address = namespace::decode(
                            block.name.as_deref().unwrap(),
                            block.instance.as_deref().unwrap(),
                        )
                        .unwrap();
                        let seq: usize = block.full_text.parse().unwrap();
                        match seen[address.widget] {
                            Some(prev) => assert_eq!(prev, seq, "torn publication"),
                            None => seen[address.widget] = Some(seq),
                        }
                    }
                    for (widget, seq) in seen.into_iter().enumerate() {
                        if let Some(seq) = seq {
                            assert!(seq >= last_seen[widget], "publication went backwards");
                            last_seen[widget] = seq;
                        }
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        for writer in writers {
            writer.await.unwrap();
        }
        reader.await.unwrap();

        for widget in 0..WIDGETS {
            let blocks = publisher.state().get(widget);
            assert_eq!(blocks.len(), 3);
            assert!(blocks.iter().all(|b| b.full_text == (ROUNDS - 1).to_string()));
        }
    }
}
