//! Streaming text-to-speech client for the Edge read-aloud WebSocket service.
//!
//! The crate is composed of three layers:
//!
//! - [`segment`] — sentence-aware chunking of arbitrarily long input
//! - [`tts`] — the streaming synthesis client (one WebSocket session per
//!   chunk: SSML request out, interleaved text/binary frames in, MP3 bytes
//!   back)
//! - [`pipeline`] — the driver that validates input, runs sessions strictly
//!   sequentially, and concatenates per-chunk audio into one artifact

pub mod pipeline;
pub mod segment;
pub mod tts;

// Re-export commonly used items for convenience
pub use pipeline::{SpeechPipeline, SynthesisOutput, estimate_duration, output_file_name};
pub use segment::{SegmentStats, Segmenter};
pub use tts::base::{StatusCallback, SynthesisStatus, TtsError, TtsResult};
pub use tts::edge::{EdgeTts, EdgeTtsConfig};
