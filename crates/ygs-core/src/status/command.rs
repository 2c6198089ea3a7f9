//! Event command execution.

use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::CommandError;
use crate::event::ClickEvent;

/// Environment handed to event commands.
pub fn event_env(event: &ClickEvent) -> [(&'static str, String); 5] {
    [
        ("I3_NAME", event.name.clone()),
        ("I3_INSTANCE", event.instance.clone()),
        ("I3_BUTTON", event.button.to_string()),
        ("I3_X", event.x.to_string()),
        ("I3_Y", event.y.to_string()),
    ]
}

/// Runs `command` through `sh -c` and returns its stdout.
///
/// The event is written to stdin as one JSON line, then stdin is closed.
/// Stderr is inherited.
///
/// # Errors
/// Returns an error if the command cannot be spawned, its pipes fail, or it
/// exits unsuccessfully.
pub async fn run(command: &str, event: &ClickEvent) -> Result<Vec<u8>, CommandError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .envs(event_env(event))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        let mut line = serde_json::to_vec(event).map_err(|e| CommandError::Stdin {
            command: command.to_string(),
            source: e.into(),
        })?;
        line.push(b'\n');

        match stdin.write_all(&line).await {
            // Commands are free to ignore their input.
            Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                return Err(CommandError::Stdin {
                    command: command.to_string(),
                    source: e,
                });
            }
            _ => {}
        }
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|source| CommandError::Wait {
            command: command.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CommandError::Status {
            command: command.to_string(),
            status: output.status,
        });
    }

    Ok(output.stdout)
}
