//! Wire message types for the Edge read-aloud synthesis protocol.
//!
//! This module contains everything that touches the wire format:
//!
//! - **Outgoing messages**: built as text frames with `\r\n`-separated
//!   headers, a blank line, and a body
//!   - [`speech_config_message`]: output format and metadata options (JSON)
//!   - [`ssml_message`]: the SSML document carrying the text to synthesize
//! - **Incoming messages**:
//!   - [`EdgeTtsMessage`]: classification of text frames (turn-end vs.
//!     informational)
//!   - [`audio_payload`]: extraction of raw audio from a binary frame
//!     envelope
//! - **Session identity**: [`connection_id`] and [`request_timestamp`]

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use uuid::Uuid;

use serde::Serialize;

use super::{AUDIO_PAYLOAD_SEPARATOR, OUTPUT_FORMAT, TURN_END_MARKER};
use crate::tts::base::{TtsError, TtsResult};

// =============================================================================
// Session Identity
// =============================================================================

/// Generates a fresh per-session connection identifier.
///
/// UUID v4 with hyphens stripped: 32 lowercase hex characters. A collision
/// with a live session on the server side would corrupt both sessions, so the
/// id must be fresh for every connection.
pub fn connection_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Timestamp format the endpoint expects in `X-Timestamp` headers, e.g.
/// `Sat Aug 08 2026 12:34:56`.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[weekday repr:short] [month repr:short] [day] [year] [hour]:[minute]:[second]");

/// Formats an instant the way the endpoint expects: an en-US style date-time
/// with an explicit GMT offset suffix.
pub fn request_timestamp(instant: OffsetDateTime) -> String {
    let formatted = instant
        .to_offset(time::UtcOffset::UTC)
        .format(&TIMESTAMP_FORMAT)
        .expect("timestamp format description is valid");
    format!("{formatted} GMT+0000 (Coordinated Universal Time)")
}

// =============================================================================
// Outgoing Messages (Client to Server)
// =============================================================================

/// JSON body of the `speech.config` message.
///
/// Word boundaries are requested (harmless metadata), sentence boundaries are
/// not; the output format selects frame-concatenable MP3 so multi-chunk
/// results can be joined by plain byte concatenation.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechConfig {
    context: SynthesisContext,
}

#[derive(Debug, Clone, Serialize)]
struct SynthesisContext {
    synthesis: Synthesis,
}

#[derive(Debug, Clone, Serialize)]
struct Synthesis {
    audio: AudioOptions,
}

#[derive(Debug, Clone, Serialize)]
struct AudioOptions {
    metadataoptions: MetadataOptions,
    #[serde(rename = "outputFormat")]
    output_format: String,
}

#[derive(Debug, Clone, Serialize)]
struct MetadataOptions {
    #[serde(rename = "sentenceBoundaryEnabled")]
    sentence_boundary_enabled: bool,
    #[serde(rename = "wordBoundaryEnabled")]
    word_boundary_enabled: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            context: SynthesisContext {
                synthesis: Synthesis {
                    audio: AudioOptions {
                        metadataoptions: MetadataOptions {
                            sentence_boundary_enabled: false,
                            word_boundary_enabled: true,
                        },
                        output_format: OUTPUT_FORMAT.to_string(),
                    },
                },
            },
        }
    }
}

/// Builds the `speech.config` text frame.
///
/// Wire format:
/// `X-Timestamp:<ts>\r\nContent-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n<json>\r\n`
pub fn speech_config_message(timestamp: &str) -> String {
    let body = serde_json::to_string(&SpeechConfig::default())
        .expect("speech.config body serializes");
    format!(
        "X-Timestamp:{timestamp}\r\n\
         Content-Type:application/json; charset=utf-8\r\n\
         Path:speech.config\r\n\r\n\
         {body}\r\n"
    )
}

/// Builds the SSML document wrapping `text` in voice/prosody tags.
///
/// `text` is expected to be pre-normalized (no raw `&`, `<`, `>`); see the
/// segmenter. Single-quoted attributes match what the endpoint accepts.
pub fn ssml_document(text: &str, voice: &str, pitch: &str, rate: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='Microsoft Server Speech Text to Speech Voice ({voice})'>\
         <prosody pitch='{pitch}' rate='{rate}' volume='+0%'>\
         {text}\
         </prosody></voice></speak>"
    )
}

/// Builds the `ssml` text frame.
///
/// Wire format:
/// `X-RequestId:<id>\r\nContent-Type:application/ssml+xml\r\nX-Timestamp:<ts>Z\r\nPath:ssml\r\n\r\n<ssml>`
///
/// The request id is the session's connection id; the timestamp carries a
/// trailing `Z` here (and only here), matching the endpoint's expectation.
pub fn ssml_message(request_id: &str, timestamp: &str, ssml: &str) -> String {
    format!(
        "X-RequestId:{request_id}\r\n\
         Content-Type:application/ssml+xml\r\n\
         X-Timestamp:{timestamp}Z\r\n\
         Path:ssml\r\n\r\n\
         {ssml}"
    )
}

// =============================================================================
// Incoming Messages (Server to Client)
// =============================================================================

/// Classification of an incoming text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTtsMessage {
    /// The server finished producing audio for this turn.
    TurnEnd,
    /// Headers, boundary metadata, or other control content; ignored by the
    /// protocol logic.
    Informational(String),
}

impl EdgeTtsMessage {
    /// Classifies a text frame by scanning for the turn-end control path.
    pub fn parse(text: &str) -> Self {
        if text.contains(TURN_END_MARKER) {
            EdgeTtsMessage::TurnEnd
        } else {
            EdgeTtsMessage::Informational(text.to_string())
        }
    }

    /// Check if this message terminates the session.
    #[inline]
    pub fn is_turn_end(&self) -> bool {
        matches!(self, EdgeTtsMessage::TurnEnd)
    }
}

/// Extracts the raw audio payload from a binary frame envelope.
///
/// A binary frame is arbitrary header bytes, the separator `Path:audio\r\n`,
/// then raw audio through the end of the frame. The first occurrence of the
/// separator is authoritative; everything before it (and the separator
/// itself) is discarded.
///
/// # Returns
/// * `Ok(&[u8])` - The audio bytes after the separator (possibly empty)
/// * `Err(TtsError::MalformedFrame)` - Separator not found; callers must
///   treat this as a zero-contribution frame, not a session failure
pub fn audio_payload(frame: &[u8]) -> TtsResult<&[u8]> {
    match find_separator(frame) {
        Some(index) => Ok(&frame[index + AUDIO_PAYLOAD_SEPARATOR.len()..]),
        None => Err(TtsError::MalformedFrame(format!(
            "no audio separator in {}-byte frame",
            frame.len()
        ))),
    }
}

/// Linear scan for the first occurrence of the audio separator.
fn find_separator(frame: &[u8]) -> Option<usize> {
    frame
        .windows(AUDIO_PAYLOAD_SEPARATOR.len())
        .position(|window| window == AUDIO_PAYLOAD_SEPARATOR)
}

// =============================================================================
// Tests
// =============================================================================
