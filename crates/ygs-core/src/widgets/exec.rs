//! `exec` widget: shows the output of a shell command.
//!
//! ```yaml
//! - widget: exec
//!   command: date +%H:%M
//!   interval: 1
//!   events_update: true
//! ```
//!
//! Output that parses as a JSON block-list is published as is, anything
//! else becomes a single block with the trimmed text. Without `interval`
//! the command runs once.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::block::Block;
use crate::error::ConfigError;
use crate::event::ClickEvent;
use crate::widget::{BlockSender, Widget, WidgetFuture, WidgetParams};

pub const KIND: &str = "exec";

#[derive(Debug)]
pub struct ExecWidget {
    command: String,
    interval: Option<Duration>,
    events_update: bool,
    refresh: Notify,
    stop: CancellationToken,
}

/// Registry entry point.
///
/// # Errors
/// Returns an error if `command` is missing or another setting is malformed.
pub fn factory(params: &WidgetParams) -> Result<Arc<dyn Widget>, ConfigError> {
    Ok(Arc::new(ExecWidget::new(params)?))
}

impl ExecWidget {
    /// # Errors
    /// Returns an error if `command` is missing or another setting is malformed.
    pub fn new(params: &WidgetParams) -> Result<Self, ConfigError> {
        let command = params.require_str("command")?.to_string();
        let interval = params
            .f64("interval")?
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64);
        let events_update = params.bool("events_update")?.unwrap_or(false);

        Ok(Self {
            command,
            interval,
            events_update,
            refresh: Notify::new(),
            stop: CancellationToken::new(),
        })
    }

    async fn exec_once(&self) -> Result<Vec<Block>> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run `{}`", self.command))?;

        if !output.status.success() {
            bail!("`{}` exited with {}", self.command, output.status);
        }

        Ok(parse_output(&output.stdout))
    }
}

/// Interprets command output as blocks.
pub fn parse_output(stdout: &[u8]) -> Vec<Block> {
    if let Ok(blocks) = serde_json::from_slice::<Vec<Block>>(stdout) {
        return blocks;
    }
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Block::text(text)]
    }
}

impl Widget for ExecWidget {
    fn run(&self, output: BlockSender) -> WidgetFuture<'_, Result<()>> {
        Box::pin(async move {
            loop {
                let result = tokio::select! {
                    () = self.stop.cancelled() => return Ok(()),
                    result = self.exec_once() => result,
                };

                let blocks = match (result, self.interval) {
                    (Ok(blocks), _) => blocks,
                    // One-shot commands have nothing to retry.
                    (Err(err), None) => return Err(err),
                    (Err(err), Some(_)) => {
                        warn!("exec widget: {err:#}");
                        vec![Block::error(format!("{err:#}"))]
                    }
                };

                if output.send(blocks).is_err() {
                    return Ok(());
                }

                match self.interval {
                    Some(interval) => tokio::select! {
                        () = self.stop.cancelled() => return Ok(()),
                        () = tokio::time::sleep(interval) => {}
                        () = self.refresh.notified() => {}
                    },
                    None if self.events_update => tokio::select! {
                        () = self.stop.cancelled() => return Ok(()),
                        () = self.refresh.notified() => {}
                    },
                    None => return Ok(()),
                }
            }
        })
    }

    fn event(&self, _event: &ClickEvent) {
        if self.events_update {
            self.refresh.notify_one();
        }
    }

    fn stop(&self) -> WidgetFuture<'_, ()> {
        self.stop.cancel();
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use super::*;

    fn widget(value: Value) -> ExecWidget {
        match value {
            Value::Object(map) => ExecWidget::new(&WidgetParams::new(map)).unwrap(),
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn parse_output_prefers_json_blocks() {
        assert_eq!(
            parse_output(br#"[{"full_text":"a"},{"full_text":"b"}]"#),
            vec![Block::text("a"), Block::text("b")]
        );
        assert_eq!(parse_output(b"  plain text\n"), vec![Block::text("plain text")]);
        assert_eq!(parse_output(b"\n"), Vec::<Block>::new());
    }

    #[test]
    fn command_is_required() {
        assert!(matches!(
            ExecWidget::new(&WidgetParams::default()),
            Err(ConfigError::MissingParam(key)) if key == "command"
        ));
    }

    #[tokio::test]
    async fn one_shot_publishes_output_and_returns() {
        let w = widget(json!({ "command": "echo hello" }));
        let (tx, mut rx) = mpsc::unbounded_channel();

        w.run(tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(vec![Block::text("hello")]));
    }

    #[tokio::test]
    async fn one_shot_failure_is_returned() {
        let w = widget(json!({ "command": "exit 3" }));
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = w.run(tx).await.unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[tokio::test]
    async fn periodic_failure_is_published_and_retried() {
        let w = Arc::new(widget(json!({ "command": "exit 4", "interval": 0.01 })));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let runner = tokio::spawn({
            let w = Arc::clone(&w);
            async move { w.run(tx).await }
        });

        for _ in 0..2 {
            let blocks = rx.recv().await.unwrap();
            assert_eq!(blocks.len(), 1);
            assert_eq!(blocks[0].urgent, Some(true));
            assert!(blocks[0].full_text.contains("exited with"));
        }

        w.stop().await;
        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn periodic_widget_stops_on_request() {
        let w = Arc::new(widget(json!({ "command": "echo tick", "interval": 60 })));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let runner = tokio::spawn({
            let w = Arc::clone(&w);
            async move { w.run(tx).await }
        });

        assert_eq!(rx.recv().await, Some(vec![Block::text("tick")]));
        w.stop().await;

        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn click_triggers_refresh_when_enabled() {
        let w = Arc::new(widget(json!({ "command": "echo again", "events_update": true })));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let runner = tokio::spawn({
            let w = Arc::clone(&w);
            async move { w.run(tx).await }
        });

        assert_eq!(rx.recv().await, Some(vec![Block::text("again")]));
        w.event(&ClickEvent::default());
        assert_eq!(rx.recv().await, Some(vec![Block::text("again")]));

        w.stop().await;
        runner.await.unwrap().unwrap();
    }
}
