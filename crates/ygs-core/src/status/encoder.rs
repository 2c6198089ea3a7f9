//! i3bar output stream.
//!
//! The host reads one endless JSON array whose elements are full snapshots
//! of the bar:
//!
//! ```text
//! {"version":1,"click_events":true}
//! [
//! [],[ ...snapshot... ]
//! ,[ ...snapshot... ]
//! ```

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

use super::state::AggregationState;
use crate::block::Block;

/// Protocol header, the opening bracket and an empty first snapshot.
pub const HEADER: &str = "{\"version\":1,\"click_events\":true}\n[\n[]";

pub struct Encoder<W> {
    out: W,
    buf: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> Encoder<W> {
    /// Writes the protocol header.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written.
    pub async fn start(mut out: W) -> io::Result<Self> {
        out.write_all(HEADER.as_bytes()).await?;
        out.flush().await?;
        Ok(Self {
            out,
            buf: Vec::new(),
        })
    }

    /// Writes one snapshot element.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written.
    pub async fn write_snapshot(&mut self, blocks: &[Block]) -> io::Result<()> {
        self.buf.clear();
        self.buf.push(b',');
        serde_json::to_writer_pretty(&mut self.buf, blocks)?;
        self.buf.push(b'\n');
        self.out.write_all(&self.buf).await?;
        self.out.flush().await
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Writes a snapshot for every change signal until all publishers are gone.
///
/// # Errors
/// Returns an error if the output cannot be written.
pub async fn run<W: AsyncWrite + Unpin>(
    mut encoder: Encoder<W>,
    state: Arc<AggregationState>,
    mut updates: mpsc::UnboundedReceiver<usize>,
) -> io::Result<W> {
    while let Some(widget) = updates.recv().await {
        debug!(widget, "encode");
        encoder.write_snapshot(&state.snapshot()).await?;
    }
    Ok(encoder.into_inner())
}

/// Parses an encoded stream back into its snapshots, skipping the initial
/// empty one.
#[cfg(test)]
pub(crate) fn parse_stream(stream: &str) -> serde_json::Result<Vec<Vec<Block>>> {
    // Drop the header line and close the endless array.
    let body = stream.split_once('\n').map_or("", |(_, rest)| rest);
    let mut snapshots: Vec<Vec<Block>> = serde_json::from_str(&format!("{body}]"))?;
    if !snapshots.is_empty() {
        snapshots.remove(0);
    }
    Ok(snapshots)
}
