//! Block identity namespacing.
//!
//! The host only knows a flat `(name, instance)` pair per block. Every block
//! leaving the core is rewritten to
//!
//! - name: `ygs-<widget>-<name>`
//! - instance: `ygs-<widget>-<position>-<instance>`
//!
//! so a click event can be traced back to the widget and the position in its
//! block-list. The widget's own values survive as suffixes and may contain
//! any characters, dashes included.

use crate::block::Block;

const PREFIX: &str = "ygs-";

/// Where a namespaced block came from, plus its original identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAddress {
    pub widget: usize,
    pub position: usize,
    pub name: String,
    pub instance: String,
}

pub fn encode_name(widget: usize, name: &str) -> String {
    format!("{PREFIX}{widget}-{name}")
}

pub fn encode_instance(widget: usize, position: usize, instance: &str) -> String {
    format!("{PREFIX}{widget}-{position}-{instance}")
}

/// Rewrites the identity of `block` in place.
pub fn encode(block: &mut Block, widget: usize, position: usize) {
    let name = encode_name(widget, block.name.as_deref().unwrap_or_default());
    let instance = encode_instance(widget, position, block.instance.as_deref().unwrap_or_default());
    block.name = Some(name);
    block.instance = Some(instance);
}

/// Recovers the address encoded by [`encode`].
///
/// Returns `None` for identities that were not produced by this module, or
/// when name and instance disagree on the widget index.
pub fn decode(name: &str, instance: &str) -> Option<BlockAddress> {
    let (widget, original_name) = name.strip_prefix(PREFIX)?.split_once('-')?;
    let widget: usize = widget.parse().ok()?;

    let mut parts = instance.strip_prefix(PREFIX)?.splitn(3, '-');
    let instance_widget: usize = parts.next()?.parse().ok()?;
    let position: usize = parts.next()?.parse().ok()?;
    let original_instance = parts.next()?;

    if instance_widget != widget {
        return None;
    }

    Some(BlockAddress {
        widget,
        position,
        name: original_name.to_string(),
        instance: original_instance.to_string(),
    })
}
