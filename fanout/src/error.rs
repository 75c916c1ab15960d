//! Error types for the `fanout` crate.
//!
//! Follows the same layered pattern as the rest of the workspace: a root `Error`
//! struct carrying an `ErrorKind` tree and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = core::result::Result<T, Error>;

/// Top-level error type for the fan-out core.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors raised by the core.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Codec(CodecErrorKind),
    Action(ActionErrorKind),
    Transport(TransportErrorKind),
}

/// Errors decoding inbound frames or encoding outbound payloads.
#[derive(Debug, PartialEq)]
pub enum CodecErrorKind {
    /// The frame is not a JSON object.
    Malformed,
    /// The frame has no string `action` field.
    MissingAction,
    Encode,
}

/// Errors raised while running an action handler.
#[derive(Debug, PartialEq)]
pub enum ActionErrorKind {
    Failed,
}

/// Errors reported by a `Transport` while delivering a frame.
#[derive(Debug, PartialEq)]
pub enum TransportErrorKind {
    /// The connection is no longer known to the transport.
    Closed,
    Send,
}

impl Error {
    /// Short, stable name of the error kind, used in log lines.
    pub fn kind_name(&self) -> &'static str {
        match &self.error_kind {
            ErrorKind::Codec(CodecErrorKind::Malformed) => "codec.malformed",
            ErrorKind::Codec(CodecErrorKind::MissingAction) => "codec.missing_action",
            ErrorKind::Codec(CodecErrorKind::Encode) => "codec.encode",
            ErrorKind::Action(ActionErrorKind::Failed) => "action.failed",
            ErrorKind::Transport(TransportErrorKind::Closed) => "transport.closed",
            ErrorKind::Transport(TransportErrorKind::Send) => "transport.send",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let detail = self
            .source
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no further info available".to_string());
        match &self.error_kind {
            ErrorKind::Codec(kind) => write!(f, "Codec error: {:?} ({})", kind, detail),
            ErrorKind::Action(kind) => write!(f, "Action error: {:?} ({})", kind, detail),
            ErrorKind::Transport(kind) => write!(f, "Transport error: {:?} ({})", kind, detail),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        let error_kind = if err.is_data() || err.is_syntax() || err.is_eof() {
            ErrorKind::Codec(CodecErrorKind::Malformed)
        } else {
            ErrorKind::Codec(CodecErrorKind::Encode)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create codec errors.
pub fn codec_error(kind: CodecErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Codec(kind),
    }
}

/// Helper function for action handlers to report a failure.
pub fn handler_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Action(ActionErrorKind::Failed),
    }
}

/// Helper function to create transport errors.
pub fn transport_error(kind: TransportErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Transport(kind),
    }
}
