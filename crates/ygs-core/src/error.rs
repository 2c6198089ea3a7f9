//! Error types shared by the core.
//!
//! Only [`ConfigError`] is fatal. Everything raised after startup is logged
//! and contained to the widget slot or click event it belongs to.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Invalid or missing configuration. Aborts startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] serde_yaml::Error),

    #[error("widget #{index}: missing widget name")]
    MissingWidgetName { index: usize },

    #[error("unknown widget '{0}'")]
    UnknownWidget(String),

    #[error("widget #{index}: invalid template: {message}")]
    InvalidTemplate { index: usize, message: String },

    #[error("unknown '{0}' modifier")]
    UnknownModifier(String),

    #[error("missing '{0}' setting")]
    MissingParam(String),

    #[error("invalid '{key}' setting: {message}")]
    InvalidParam { key: String, message: String },

    #[error("widget #{index} ({kind}): {cause}")]
    Widget {
        index: usize,
        kind: String,
        cause: Box<ConfigError>,
    },
}

/// Failure running an event command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write event to `{command}`")]
    Stdin {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{command}`")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Status { command: String, status: ExitStatus },
}
