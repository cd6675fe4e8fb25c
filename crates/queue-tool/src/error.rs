use std::io;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

use crate::shutdown::INTERRUPTED_EXIT_CODE;

/// Failures talking to the dispatch service.
#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    #[error("failed to connect {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("dispatch service timed out ({0})")]
    Timeout(&'static str),

    #[error("dispatch service closed connection")]
    Closed,

    #[error("transport error: {0}")]
    Codec(#[from] LinesCodecError),

    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Remote(String),

    #[error("unexpected response: {0}")]
    Protocol(String),
}

#[derive(Debug, Error)]
pub(crate) enum QueueToolError {
    #[error("{message}: {source}")]
    RemoteQuery {
        message: String,
        #[source]
        source: DispatchError,
    },

    #[error("{0}")]
    ProtocolViolation(String),

    #[error("{0}")]
    Validation(String),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("interrupted while {0}")]
    Interrupted(&'static str),
}

impl QueueToolError {
    /// Wraps a dispatch failure with a user-facing message. Malformed replies
    /// surface as protocol violations rather than remote query failures.
    pub(crate) fn remote(message: impl Into<String>, source: DispatchError) -> Self {
        let message = message.into();
        match source {
            DispatchError::Protocol(detail) => {
                QueueToolError::ProtocolViolation(format!("{message}: {detail}"))
            }
            source => QueueToolError::RemoteQuery { message, source },
        }
    }

    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            QueueToolError::Validation(_) => 2,
            QueueToolError::Interrupted(_) => INTERRUPTED_EXIT_CODE,
            _ => 1,
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, QueueToolError>;
