//! Edge read-aloud TTS provider implementation.
//!
//! This module integrates with the Edge read-aloud speech-synthesis service,
//! a WebSocket endpoint that accepts an SSML request and streams back MP3
//! audio as interleaved text and binary frames.
//!
//! # Protocol
//!
//! One WebSocket session per request:
//!
//! 1. Connect with a fresh 32-hex-digit connection id and the embedded client
//!    token as query parameters.
//! 2. Send a `speech.config` text frame declaring the output audio format and
//!    metadata options, then an `ssml` text frame wrapping the input text in
//!    voice/prosody tags.
//! 3. Binary frames carry a header section, the separator `Path:audio\r\n`,
//!    then raw MP3 bytes. Text frames carry control signals; a frame
//!    containing `Path:turn.end` terminates the session.
//!
//! # Example
//!
//! ```rust,ignore
//! use readaloud::tts::edge::{EdgeTts, EdgeTtsConfig};
//!
//! let tts = EdgeTts::new(EdgeTtsConfig::default())?;
//! let audio = tts.synthesize("Hello, world!").await?;
//! ```
//!
//! # Stability
//!
//! The turn-end marker and the client token are not covered by any public
//! contract. Both live only in this module so that protocol drift stays
//! contained here.

pub mod client;
pub mod config;
pub mod messages;

pub use client::EdgeTts;
pub use config::EdgeTtsConfig;
pub use messages::EdgeTtsMessage;

use std::time::Duration;

// =============================================================================
// API Constants
// =============================================================================

/// Edge read-aloud WebSocket synthesis endpoint.
pub const EDGE_TTS_URL: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1";

/// Client token the endpoint expects as a query parameter.
///
/// Static and embedded; the service performs no per-user authentication.
pub const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";

/// Output audio format requested in the `speech.config` message.
pub const OUTPUT_FORMAT: &str = "audio-24khz-96kbitrate-mono-mp3";

/// Byte sequence separating header bytes from raw audio in a binary frame.
pub const AUDIO_PAYLOAD_SEPARATOR: &[u8] = b"Path:audio\r\n";

/// Substring of a text frame that signals the end of the synthesis turn.
pub const TURN_END_MARKER: &str = "Path:turn.end";

// =============================================================================
// Limits and Defaults
// =============================================================================

/// Maximum characters per synthesis request.
///
/// Enforced before any stream is opened; longer input must be segmented
/// upstream.
pub const MAX_TEXT_LENGTH: usize = 3000;

/// Default voice (locale, speaker) pair.
pub const DEFAULT_VOICE: &str = "en-US, JennyNeural";

/// Default pitch offset.
pub const DEFAULT_PITCH: &str = "+0Hz";

/// Default speaking-rate offset.
pub const DEFAULT_RATE: &str = "+0%";

/// Default timeout for establishing the WebSocket connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-frame idle timeout while awaiting audio.
///
/// Resets after each received frame; catches a remote that stops producing
/// without closing the stream.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(60);
