//! Base types shared by TTS client code.
//!
//! Defines the error taxonomy, connection state, and the status-reporting
//! surface used by streaming synthesis sessions.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during synthesis.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Input rejected before any network activity (empty or over-length text)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Configuration rejected (bad voice, pitch, rate, or endpoint)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The stream to the synthesis endpoint could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Transport-level failure after the stream was established
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Binary frame without the expected audio separator.
    ///
    /// Non-fatal: the session logs the frame and continues with zero audio
    /// contribution from it. This variant never aborts a session.
    #[error("Malformed binary frame: {0}")]
    MalformedFrame(String),

    /// The stream closed before the turn-end marker was observed
    #[error("Incomplete result: {0}")]
    IncompleteResult(String),

    /// A configured timeout elapsed
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// A chunk of a multi-chunk job failed; the job was aborted
    #[error("chunk {index} failed: {source}")]
    ChunkFailed {
        /// Zero-based index of the failed chunk.
        index: usize,
        /// The underlying per-chunk failure.
        #[source]
        source: Box<TtsError>,
    },
}

/// Result type for synthesis operations.
pub type TtsResult<T> = Result<T, TtsError>;

// =============================================================================
// Status Reporting
// =============================================================================

/// Phase transitions reported to the status callback during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisStatus {
    /// Stream established and configuration sent.
    Connected,
    /// SSML accepted; audio frames are being produced.
    Generating,
    /// Turn ended; audio assembled and returned.
    Completed,
    /// The session failed.
    Failed(String),
}

impl fmt::Display for SynthesisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisStatus::Connected => write!(f, "Connected to synthesis service"),
            SynthesisStatus::Generating => write!(f, "Generating audio"),
            SynthesisStatus::Completed => write!(f, "Audio generated"),
            SynthesisStatus::Failed(reason) => write!(f, "Synthesis failed: {reason}"),
        }
    }
}

/// Status callback invoked at session phase transitions.
///
/// A client holds at most one callback at a time; registering a new one
/// replaces the previous silently.
pub type StatusCallback = Arc<dyn Fn(SynthesisStatus) + Send + Sync>;

// =============================================================================
// Tests
// =============================================================================
