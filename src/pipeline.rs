//! Multi-chunk synthesis pipeline.
//!
//! Drives the segmenter and the streaming client end to end: validate the
//! whole input, split it into chunks, synthesize one chunk at a time, and
//! concatenate the per-chunk MP3 buffers into one artifact.
//!
//! Chunks are processed strictly sequentially — never concurrently — which
//! bounds buffered memory, respects the endpoint's per-connection behavior,
//! and guarantees the combined audio preserves chunk order byte for byte.
//! Any chunk failure aborts the remaining sequence; no partial artifact is
//! assembled.

use bytes::{Bytes, BytesMut};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::info;

use crate::segment::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE, SegmentStats, Segmenter};
use crate::tts::base::{TtsError, TtsResult};
use crate::tts::edge::{EdgeTts, EdgeTtsConfig, MAX_TEXT_LENGTH};

// =============================================================================
// Output
// =============================================================================

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// The assembled MP3 bytes, chunk results concatenated in order.
    pub audio: Bytes,
    /// Number of chunks that were synthesized.
    pub chunk_count: usize,
    /// Suggested artifact file name.
    pub file_name: String,
}

// =============================================================================
// SpeechPipeline
// =============================================================================

/// End-to-end synthesis driver: segmentation, sequential sessions,
/// concatenation.
///
/// # Example
///
/// ```rust,ignore
/// use readaloud::pipeline::SpeechPipeline;
/// use readaloud::tts::edge::EdgeTtsConfig;
///
/// let pipeline = SpeechPipeline::new(EdgeTtsConfig::default())?;
/// let output = pipeline.synthesize("Long text. Many sentences.").await?;
/// std::fs::write(&output.file_name, &output.audio)?;
/// ```
pub struct SpeechPipeline {
    client: EdgeTts,
    segmenter: Segmenter,
}

impl SpeechPipeline {
    /// Creates a pipeline with default chunk sizes.
    pub fn new(config: EdgeTtsConfig) -> TtsResult<Self> {
        Self::with_chunk_sizes(config, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE)
    }

    /// Creates a pipeline with explicit chunk size bounds.
    pub fn with_chunk_sizes(
        config: EdgeTtsConfig,
        max_chunk_size: usize,
        min_chunk_size: usize,
    ) -> TtsResult<Self> {
        let segmenter = Segmenter::new(max_chunk_size, min_chunk_size)
            .map_err(TtsError::InvalidConfiguration)?;
        Ok(Self {
            client: EdgeTts::new(config)?,
            segmenter,
        })
    }

    /// Returns a mutable reference to the client, e.g. to register a status
    /// callback.
    pub fn client_mut(&mut self) -> &mut EdgeTts {
        &mut self.client
    }

    /// Synthesizes `text` into one MP3 buffer.
    ///
    /// # Errors
    /// * `Validation` - Empty input or more than 3000 characters, rejected
    ///   before any session opens (exactly 3000 proceeds)
    /// * `ChunkFailed` - A chunk's session failed; carries the chunk index
    ///   and the underlying error, and the remaining chunks were not
    ///   attempted
    pub async fn synthesize(&self, text: &str) -> TtsResult<SynthesisOutput> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TtsError::Validation("text must not be empty".to_string()));
        }
        let total_chars = trimmed.chars().count();
        if total_chars > MAX_TEXT_LENGTH {
            return Err(TtsError::Validation(format!(
                "text is {total_chars} characters, limit is {MAX_TEXT_LENGTH}; \
                 split the input into separate requests"
            )));
        }

        let chunks = self.segmenter.segment(trimmed);
        if chunks.is_empty() {
            return Err(TtsError::Validation(
                "no synthesizable text after normalization".to_string(),
            ));
        }

        let stats = SegmentStats::from_chunks(&chunks);
        info!(
            chunks = stats.chunk_count,
            total_chars = stats.total_chars,
            average = stats.average_chunk_size,
            largest = stats.max_chunk_size,
            "input segmented"
        );

        let mut combined = BytesMut::new();
        for (index, chunk) in chunks.iter().enumerate() {
            info!(
                chunk = index + 1,
                of = chunks.len(),
                chars = chunk.chars().count(),
                "synthesizing chunk"
            );
            let audio = self
                .client
                .synthesize(chunk)
                .await
                .map_err(|source| TtsError::ChunkFailed {
                    index,
                    source: Box::new(source),
                })?;
            combined.extend_from_slice(&audio);
        }

        let file_name = output_file_name(
            &self.client.config().voice_short_name(),
            chunks.len(),
            OffsetDateTime::now_utc(),
        );

        info!(
            bytes = combined.len(),
            chunks = chunks.len(),
            file = %file_name,
            "synthesis complete"
        );

        Ok(SynthesisOutput {
            audio: combined.freeze(),
            chunk_count: chunks.len(),
            file_name,
        })
    }
}

// =============================================================================
// Artifact Naming
// =============================================================================

/// File-system-safe timestamp for artifact names: ISO-8601 to seconds with
/// colons replaced by hyphens.
const FILE_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");

/// Builds the artifact file name: `audio_<Voice>_<timestamp>.mp3`, with a
/// `_combined` suffix when more than one chunk was merged.
pub fn output_file_name(
    voice_short: &str,
    chunk_count: usize,
    timestamp: OffsetDateTime,
) -> String {
    let stamp = timestamp
        .to_offset(time::UtcOffset::UTC)
        .format(&FILE_TIMESTAMP_FORMAT)
        .expect("file timestamp format description is valid");
    if chunk_count > 1 {
        format!("audio_{voice_short}_{stamp}_combined.mp3")
    } else {
        format!("audio_{voice_short}_{stamp}.mp3")
    }
}

// =============================================================================
// Duration Estimate
// =============================================================================

/// Synthesis throughput heuristic in characters per second.
const SYNTHESIS_CHARS_PER_SECOND: f64 = 45.0;

/// Per-chunk connection and hand-shake overhead in seconds.
const PER_CHUNK_OVERHEAD_SECONDS: f64 = 1.2;

/// Estimates wall-clock synthesis time for progress display.
pub fn estimate_duration(char_count: usize, chunk_count: usize) -> Duration {
    let seconds = (char_count as f64 / SYNTHESIS_CHARS_PER_SECOND
        + chunk_count as f64 * PER_CHUNK_OVERHEAD_SECONDS)
        .ceil();
    Duration::from_secs(seconds as u64)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn pipeline() -> SpeechPipeline {
        SpeechPipeline::new(EdgeTtsConfig::default()).unwrap()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let result = pipeline().synthesize("  \n ").await;
        assert!(matches!(result, Err(TtsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_over_length_input_is_rejected_before_any_session() {
        // 3001 characters must fail fast; an unroutable endpoint would turn
        // any attempted connection into a different error kind
        let config = EdgeTtsConfig::default().with_endpoint("ws://127.0.0.1:1/tts");
        let pipeline = SpeechPipeline::new(config).unwrap();
        let text = "a".repeat(MAX_TEXT_LENGTH + 1);
        let result = pipeline.synthesize(&text).await;
        assert!(matches!(result, Err(TtsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_exactly_at_limit_passes_validation() {
        let config = EdgeTtsConfig::default().with_endpoint("ws://127.0.0.1:1/tts");
        let pipeline = SpeechPipeline::new(config).unwrap();
        let text = "a".repeat(MAX_TEXT_LENGTH);
        // validation passes; the failure is the unreachable endpoint, wrapped
        // with the failing chunk index
        let result = pipeline.synthesize(&text).await;
        match result {
            Err(TtsError::ChunkFailed { index: 0, source }) => {
                assert!(matches!(*source, TtsError::ConnectionFailed(_)));
            }
            other => panic!("expected ChunkFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_chunk_sizes_are_rejected() {
        let result = SpeechPipeline::with_chunk_sizes(EdgeTtsConfig::default(), 0, 0);
        assert!(matches!(result, Err(TtsError::InvalidConfiguration(_))));
    }

    // =========================================================================
    // Artifact Naming
    // =========================================================================

    #[test]
    fn test_output_file_name_single_chunk() {
        let name = output_file_name("Jenny", 1, datetime!(2026-08-08 12:34:56 UTC));
        assert_eq!(name, "audio_Jenny_2026-08-08T12-34-56.mp3");
    }

    #[test]
    fn test_output_file_name_combined() {
        let name = output_file_name("Sonia", 3, datetime!(2026-08-08 12:34:56 UTC));
        assert_eq!(name, "audio_Sonia_2026-08-08T12-34-56_combined.mp3");
    }

    #[test]
    fn test_output_file_name_has_no_colons() {
        let name = output_file_name("Jenny", 1, datetime!(2026-01-02 03:04:05 UTC));
        assert!(!name.contains(':'));
    }

    // =========================================================================
    // Duration Estimate
    // =========================================================================

    #[test]
    fn test_estimate_duration_scales_with_input() {
        let short = estimate_duration(45, 1);
        let long = estimate_duration(450, 2);
        assert!(long > short);
        // 45 chars at 45 chars/s plus one chunk overhead, rounded up
        assert_eq!(short, Duration::from_secs(3));
    }

    #[test]
    fn test_estimate_duration_zero_input() {
        assert_eq!(estimate_duration(0, 0), Duration::from_secs(0));
    }
}
