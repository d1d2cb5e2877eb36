//! Error types
//!
//! Every fault in the relay is a value handed back to the immediate caller.
//! Producer and sink implementations report their own failures through
//! [`Error::Source`], [`Error::Sink`] or [`Error::Io`].

use std::io;
use std::process::ExitStatus;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O failure
    Io(io::Error),
    /// Producer failed (header query or packet read)
    Source(String),
    /// Sink failed (header, packet or trailer write)
    Sink(String),
    /// Producer delivered a packet with no payload
    DroppedFeed,
    /// No header became available before the attach timeout
    NoHeader,
    /// Operation aborted by its caller
    Cancelled,
    /// The stream's packet queue has already been closed
    StreamClosed,
    /// External transcoder failed
    Transcode(TranscodeError),
}

impl Error {
    /// Convenience constructor for producer faults
    pub fn source_failed(msg: impl Into<String>) -> Self {
        Error::Source(msg.into())
    }

    /// Convenience constructor for sink faults
    pub fn sink_failed(msg: impl Into<String>) -> Self {
        Error::Sink(msg.into())
    }

    /// Whether this error was caused by caller cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Source(msg) => write!(f, "Source error: {}", msg),
            Error::Sink(msg) => write!(f, "Sink error: {}", msg),
            Error::DroppedFeed => write!(f, "Source stream dropped (empty packet)"),
            Error::NoHeader => write!(f, "End of stream: no header received"),
            Error::Cancelled => write!(f, "Operation cancelled"),
            Error::StreamClosed => write!(f, "Stream already closed"),
            Error::Transcode(e) => write!(f, "Transcode error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Transcode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<TranscodeError> for Error {
    fn from(e: TranscodeError) -> Self {
        Error::Transcode(e)
    }
}

/// Errors from the external transcoding tool
#[derive(Debug)]
pub enum TranscodeError {
    /// No target profiles were configured
    NoProfiles,
    /// The transcoder process could not be started
    Spawn(io::Error),
    /// The transcoder ran but exited unsuccessfully
    Failed {
        status: ExitStatus,
        stderr: String,
    },
}

impl std::fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscodeError::NoProfiles => write!(f, "No transcode profiles configured"),
            TranscodeError::Spawn(e) => write!(f, "Failed to start transcoder: {}", e),
            TranscodeError::Failed { status, stderr } => {
                write!(f, "Transcoder exited with {}: {}", status, stderr.trim())
            }
        }
    }
}

impl std::error::Error for TranscodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranscodeError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}
