//! Streaming text-to-speech clients.
//!
//! One provider is implemented: the Edge read-aloud WebSocket service
//! ([`edge`]). The protocol specifics (endpoint, control markers, frame
//! envelope) are confined to that module; callers interact through
//! [`edge::EdgeTts::synthesize`] and the shared types in [`base`].

pub mod base;
pub mod edge;

pub use base::{StatusCallback, SynthesisStatus, TtsError, TtsResult};
pub use edge::{EDGE_TTS_URL, EdgeTts, EdgeTtsConfig, MAX_TEXT_LENGTH};
