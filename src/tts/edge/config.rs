//! Edge read-aloud TTS configuration types.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_PITCH, DEFAULT_RATE, DEFAULT_RECEIVE_TIMEOUT, DEFAULT_VOICE,
    EDGE_TTS_URL,
};

/// Pitch offsets are signed hertz values, e.g. `+0Hz`, `-20Hz`.
static PITCH_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]\d+Hz$").expect("pitch pattern compiles"));

/// Rate offsets are signed percentages, e.g. `+0%`, `+25%`.
static RATE_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]\d+%$").expect("rate pattern compiles"));

// =============================================================================
// EdgeTtsConfig
// =============================================================================

/// Configuration for the Edge read-aloud TTS client.
///
/// # Example
///
/// ```rust,ignore
/// use readaloud::tts::edge::EdgeTtsConfig;
///
/// let config = EdgeTtsConfig::default()
///     .with_voice("en-GB, SoniaNeural")
///     .with_pitch("-10Hz")
///     .with_rate("+20%");
/// ```
#[derive(Debug, Clone)]
pub struct EdgeTtsConfig {
    /// Voice identifier as a `locale, speaker` pair, e.g. `en-US, JennyNeural`.
    pub voice: String,

    /// Pitch offset as a signed hertz string, e.g. `+0Hz`.
    pub pitch: String,

    /// Speaking-rate offset as a signed percentage string, e.g. `+0%`.
    pub rate: String,

    /// Synthesis endpoint URL (`ws://` or `wss://`).
    ///
    /// Overridable so tests can point at a local server and so protocol
    /// drift in the hosted endpoint stays a configuration change.
    pub endpoint: String,

    /// Timeout for establishing the connection. `None` disables the limit.
    pub connect_timeout: Option<Duration>,

    /// Per-frame idle timeout while awaiting audio; resets after each
    /// received frame. `None` disables the limit, restoring the unbounded
    /// wait some callers may want for very long syntheses.
    pub receive_timeout: Option<Duration>,
}

impl Default for EdgeTtsConfig {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            pitch: DEFAULT_PITCH.to_string(),
            rate: DEFAULT_RATE.to_string(),
            endpoint: EDGE_TTS_URL.to_string(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            receive_timeout: Some(DEFAULT_RECEIVE_TIMEOUT),
        }
    }
}

impl EdgeTtsConfig {
    /// Sets the voice identifier.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Sets the pitch offset string.
    pub fn with_pitch(mut self, pitch: impl Into<String>) -> Self {
        self.pitch = pitch.into();
        self
    }

    /// Sets the speaking-rate offset string.
    pub fn with_rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = rate.into();
        self
    }

    /// Sets the synthesis endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets or disables the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets or disables the per-frame receive timeout.
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Validates the configuration.
    ///
    /// # Returns
    /// * `Err(String)` - Description of the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.voice.trim().is_empty() {
            return Err("voice must not be empty".to_string());
        }
        if !PITCH_OFFSET.is_match(&self.pitch) {
            return Err(format!(
                "pitch must be a signed hertz offset like +0Hz, got '{}'",
                self.pitch
            ));
        }
        if !RATE_OFFSET.is_match(&self.rate) {
            return Err(format!(
                "rate must be a signed percentage offset like +0%, got '{}'",
                self.rate
            ));
        }
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| format!("endpoint is not a valid URL: {e}"))?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(format!(
                "endpoint scheme must be ws or wss, got '{}'",
                endpoint.scheme()
            ));
        }
        Ok(())
    }

    /// Human-readable speaker name for artifact naming.
    ///
    /// Takes the speaker half of the `locale, speaker` pair and strips the
    /// `Neural` suffix: `en-US, JennyNeural` becomes `Jenny`. Falls back to
    /// the whole voice string when there is no comma.
    pub fn voice_short_name(&self) -> String {
        self.voice
            .split(',')
            .nth(1)
            .map(|speaker| speaker.trim().trim_end_matches("Neural").trim().to_string())
            .filter(|speaker| !speaker.is_empty())
            .unwrap_or_else(|| self.voice.trim().to_string())
    }
}

// =============================================================================
// Offset Formatting
// =============================================================================

/// Formats a signed integer as a prosody offset string: `5` with unit `Hz`
/// becomes `+5Hz`, `-10` with unit `%` becomes `-10%`.
pub fn signed_offset(value: i32, unit: &str) -> String {
    if value >= 0 {
        format!("+{value}{unit}")
    } else {
        format!("{value}{unit}")
    }
}

// =============================================================================
// Tests
// =============================================================================
