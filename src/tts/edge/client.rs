//! Edge read-aloud streaming synthesis client.
//!
//! One [`EdgeTts::synthesize`] call runs exactly one WebSocket session:
//!
//! ```text
//! ┌────────────┐   speech.config + ssml   ┌──────────────────┐
//! │ synthesize │─────────────────────────▶│ synthesis service │
//! └─────┬──────┘                          └────────┬─────────┘
//!       │            binary audio frames           │
//!       │◀─────────────────────────────────────────┤
//!       │            text frame: turn.end          │
//!       │◀─────────────────────────────────────────┘
//!       ▼
//!  assembled MP3 bytes
//! ```
//!
//! Each session owns its state and frame buffer, so concurrent `synthesize`
//! calls on clones of the same client cannot interfere with each other.
//! Sessions are never reused or pooled.

use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use time::OffsetDateTime;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, info, warn};
use url::Url;

use super::config::EdgeTtsConfig;
use super::messages::{
    EdgeTtsMessage, audio_payload, connection_id, request_timestamp, speech_config_message,
    ssml_document, ssml_message,
};
use super::{MAX_TEXT_LENGTH, TRUSTED_CLIENT_TOKEN};
use crate::tts::base::{StatusCallback, SynthesisStatus, TtsError, TtsResult};

// =============================================================================
// Session State Machine
// =============================================================================

/// Lifecycle states of one synthesis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Establishing the WebSocket connection.
    Connecting,
    /// Connection open; configuration and SSML being transmitted.
    Configuring,
    /// Request accepted; buffering binary audio frames.
    AwaitingAudio,
    /// Turn ended; extracting and concatenating audio payloads.
    Finalizing,
    /// Session complete; the socket is closed.
    Closed,
}

/// Per-session state: identity, phase, and the owned frame buffer.
///
/// The buffer belongs to this session alone — nothing is shared across calls,
/// so a failed or cancelled session cannot leak frames into the next one.
struct Session {
    id: String,
    state: SessionState,
    frames: Vec<Bytes>,
    malformed_frames: usize,
}

impl Session {
    fn new() -> Self {
        Self {
            id: connection_id(),
            state: SessionState::Connecting,
            frames: Vec::new(),
            malformed_frames: 0,
        }
    }

    /// Buffers a binary frame verbatim, in arrival order.
    fn buffer_frame(&mut self, frame: Bytes) {
        debug!(
            session = %self.id,
            bytes = frame.len(),
            total_frames = self.frames.len() + 1,
            "buffered audio frame"
        );
        self.frames.push(frame);
    }

    /// Extracts the audio payload from every buffered frame and concatenates
    /// the payloads in arrival order.
    ///
    /// Frames without the audio separator contribute zero bytes; they are
    /// logged and counted but never abort the session.
    fn assemble(&mut self) -> Bytes {
        self.state = SessionState::Finalizing;
        let mut audio = BytesMut::new();
        for (index, frame) in self.frames.iter().enumerate() {
            match audio_payload(frame) {
                Ok(payload) => audio.extend_from_slice(payload),
                Err(e) => {
                    warn!(session = %self.id, frame = index, "{e}");
                    self.malformed_frames += 1;
                }
            }
        }
        info!(
            session = %self.id,
            state = ?self.state,
            frames = self.frames.len(),
            skipped = self.malformed_frames,
            bytes = audio.len(),
            "assembled audio"
        );
        self.state = SessionState::Closed;
        audio.freeze()
    }
}

// =============================================================================
// EdgeTts Client
// =============================================================================

/// Edge read-aloud text-to-speech client.
///
/// Holds the configuration and an optional status callback; all per-request
/// state lives in the session created by each [`synthesize`](Self::synthesize)
/// call.
///
/// # Example
///
/// ```rust,ignore
/// use readaloud::tts::edge::{EdgeTts, EdgeTtsConfig};
///
/// let mut tts = EdgeTts::new(EdgeTtsConfig::default())?;
/// tts.on_status(std::sync::Arc::new(|status| println!("{status}")));
/// let audio = tts.synthesize("Hello, world!").await?;
/// ```
#[derive(Clone)]
pub struct EdgeTts {
    config: EdgeTtsConfig,

    /// Single callback slot; registering a new one replaces the previous
    /// silently.
    status_callback: Option<StatusCallback>,
}

impl EdgeTts {
    /// Creates a new client after validating the configuration.
    pub fn new(config: EdgeTtsConfig) -> TtsResult<Self> {
        if let Err(e) = config.validate() {
            return Err(TtsError::InvalidConfiguration(e));
        }
        Ok(Self {
            config,
            status_callback: None,
        })
    }

    /// Returns a reference to the client configuration.
    #[inline]
    pub fn config(&self) -> &EdgeTtsConfig {
        &self.config
    }

    /// Registers the status callback, replacing any previous one.
    pub fn on_status(&mut self, callback: StatusCallback) {
        self.status_callback = Some(callback);
    }

    /// Removes the registered status callback.
    pub fn clear_status_callback(&mut self) {
        self.status_callback = None;
    }

    fn emit(&self, status: SynthesisStatus) {
        debug!(status = %status, "session status");
        if let Some(callback) = &self.status_callback {
            callback(status);
        }
    }

    /// Builds the session URL with the client token and connection id as
    /// query parameters.
    fn session_url(&self, session_id: &str) -> TtsResult<Url> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| TtsError::InvalidConfiguration(format!("bad endpoint URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("TrustedClientToken", TRUSTED_CLIENT_TOKEN)
            .append_pair("ConnectionId", session_id);
        Ok(url)
    }

    /// Synthesizes one chunk of text into MP3 bytes.
    ///
    /// Resolves exactly once per call: with the assembled audio after the
    /// turn-end marker, or with an error. Transport failures are not retried.
    ///
    /// # Errors
    /// * `Validation` - Empty text or more than 3000 characters; reported
    ///   before any network activity
    /// * `ConnectionFailed` - The stream could not be established
    /// * `NetworkError` - The stream failed after being established
    /// * `IncompleteResult` - The stream closed before the turn-end marker
    /// * `Timeout` - A configured connect/receive timeout elapsed
    pub async fn synthesize(&self, text: &str) -> TtsResult<Bytes> {
        if text.trim().is_empty() {
            return Err(TtsError::Validation("text must not be empty".to_string()));
        }
        let char_count = text.chars().count();
        if char_count > MAX_TEXT_LENGTH {
            return Err(TtsError::Validation(format!(
                "text is {char_count} characters, limit is {MAX_TEXT_LENGTH}"
            )));
        }

        let mut session = Session::new();
        let url = self.session_url(&session.id)?;
        let timestamp = request_timestamp(OffsetDateTime::now_utc());

        debug!(session = %session.id, chars = char_count, "opening synthesis session");

        // Connect, bounded by the configured timeout
        let connect_future = connect_async(url.as_str());
        let connect_result = match self.config.connect_timeout {
            Some(limit) => timeout(limit, connect_future).await.map_err(|_| {
                self.emit(SynthesisStatus::Failed("connection timed out".to_string()));
                TtsError::Timeout(format!(
                    "connection attempt exceeded {} seconds",
                    limit.as_secs()
                ))
            })?,
            None => connect_future.await,
        };
        let (ws_stream, _response) = connect_result.map_err(|e| {
            self.emit(SynthesisStatus::Failed(format!("connection failed: {e}")));
            TtsError::ConnectionFailed(format!("could not reach synthesis endpoint: {e}"))
        })?;

        self.emit(SynthesisStatus::Connected);
        let (mut ws_sink, mut ws_source) = ws_stream.split();

        // Transmit configuration, then the SSML request
        session.state = SessionState::Configuring;
        ws_sink
            .send(Message::Text(speech_config_message(&timestamp).into()))
            .await
            .map_err(|e| {
                self.emit(SynthesisStatus::Failed(format!("send failed: {e}")));
                TtsError::NetworkError(format!("failed to send speech.config: {e}"))
            })?;

        let ssml = ssml_document(text, &self.config.voice, &self.config.pitch, &self.config.rate);
        ws_sink
            .send(Message::Text(ssml_message(&session.id, &timestamp, &ssml).into()))
            .await
            .map_err(|e| {
                self.emit(SynthesisStatus::Failed(format!("send failed: {e}")));
                TtsError::NetworkError(format!("failed to send SSML request: {e}"))
            })?;

        session.state = SessionState::AwaitingAudio;
        self.emit(SynthesisStatus::Generating);

        // Receive loop: buffer binary frames until the turn-end marker
        loop {
            let next = match self.config.receive_timeout {
                Some(limit) => match timeout(limit, ws_source.next()).await {
                    Ok(item) => item,
                    Err(_) => {
                        self.emit(SynthesisStatus::Failed("receive timed out".to_string()));
                        return Err(TtsError::Timeout(format!(
                            "no frame received for {} seconds",
                            limit.as_secs()
                        )));
                    }
                },
                None => ws_source.next().await,
            };

            match next {
                Some(Ok(Message::Binary(data))) => {
                    session.buffer_frame(data);
                }

                Some(Ok(Message::Text(frame_text))) => match EdgeTtsMessage::parse(&frame_text) {
                    EdgeTtsMessage::TurnEnd => {
                        debug!(session = %session.id, "turn ended");
                        let audio = session.assemble();
                        // Advisory close; the session already has everything
                        let _ = ws_sink.send(Message::Close(None)).await;
                        self.emit(SynthesisStatus::Completed);
                        return Ok(audio);
                    }
                    EdgeTtsMessage::Informational(content) => {
                        debug!(
                            session = %session.id,
                            bytes = content.len(),
                            "ignoring informational frame"
                        );
                    }
                },

                Some(Ok(Message::Close(frame))) => {
                    info!(session = %session.id, close = ?frame, "server closed stream early");
                    self.emit(SynthesisStatus::Failed(
                        "stream closed before turn end".to_string(),
                    ));
                    return Err(TtsError::IncompleteResult(
                        "stream closed before the turn-end marker was received".to_string(),
                    ));
                }

                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    debug!(session = %session.id, "keepalive frame");
                }

                Some(Ok(_)) => {
                    debug!(session = %session.id, "ignoring unexpected frame type");
                }

                Some(Err(e)) => {
                    self.emit(SynthesisStatus::Failed(format!("stream error: {e}")));
                    return Err(TtsError::NetworkError(format!(
                        "stream failed mid-session: {e}"
                    )));
                }

                None => {
                    self.emit(SynthesisStatus::Failed(
                        "stream ended before turn end".to_string(),
                    ));
                    return Err(TtsError::IncompleteResult(
                        "stream ended before the turn-end marker was received".to_string(),
                    ));
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
