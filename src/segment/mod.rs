//! Sentence-aware text segmentation.
//!
//! Long input has to be split before synthesis: the read-aloud endpoint caps
//! request size, and chunks that end mid-sentence produce audible artifacts at
//! chunk joins. The segmenter normalizes SSML-hostile characters, splits the
//! text into sentences, greedily packs sentences into chunks bounded by
//! `max_chunk_size`, then merges adjacent chunks that ended up smaller than
//! necessary.
//!
//! # Example
//!
//! ```rust,ignore
//! use readaloud::segment::Segmenter;
//!
//! let segmenter = Segmenter::new(2000, 800)?;
//! let chunks = segmenter.segment("First sentence. Second sentence.");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;

/// Default minimum chunk size in characters (advisory only).
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 800;

/// Symbols that confuse the synthesis voice or the SSML parser; replaced with
/// a hyphen during normalization.
static DENYLIST_SYMBOLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[~|*^]").expect("denylist pattern compiles"));

// =============================================================================
// Segmenter
// =============================================================================

/// Splits raw input text into an ordered sequence of bounded chunks.
///
/// All sizes are measured in characters (not bytes) so multi-byte input is
/// bounded consistently. Every produced chunk respects `max_chunk_size` unless
/// a single sentence alone exceeds it — sentences are never split internally.
/// `min_chunk_size` is advisory: the merge pass reduces the number of
/// undersized chunks opportunistically but does not enforce a hard floor, so
/// a trailing remainder may be shorter.
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Upper bound on chunk size in characters.
    pub max_chunk_size: usize,
    /// Advisory lower bound; informs tuning, not enforced by the algorithm.
    pub min_chunk_size: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
        }
    }
}

impl Segmenter {
    /// Creates a segmenter with explicit size bounds.
    ///
    /// # Arguments
    /// * `max_chunk_size` - Upper bound on chunk size in characters (must be > 0)
    /// * `min_chunk_size` - Advisory lower bound in characters
    ///
    /// # Returns
    /// * `Err(String)` - If `max_chunk_size` is zero
    pub fn new(max_chunk_size: usize, min_chunk_size: usize) -> Result<Self, String> {
        if max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than zero".to_string());
        }
        Ok(Self {
            max_chunk_size,
            min_chunk_size,
        })
    }

    /// Splits `text` into ordered chunks.
    ///
    /// Empty or whitespace-only input yields an empty sequence. Input without
    /// terminal punctuation is treated as a single sentence.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let clean = normalize_text(text);
        let sentences = split_into_sentences(&clean);
        let chunks = self.pack_sentences(sentences);
        self.merge_small_chunks(chunks)
    }

    /// Greedily accumulates sentences into chunks.
    ///
    /// A sentence is appended (with a joining space) unless doing so would
    /// push a non-empty running chunk past `max_chunk_size`; in that case the
    /// running chunk is closed and the sentence starts a new one. A single
    /// sentence longer than `max_chunk_size` becomes its own oversized chunk.
    fn pack_sentences(&self, sentences: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in sentences {
            let sentence_len = sentence.chars().count();
            if current_len + sentence_len + 1 > self.max_chunk_size && current_len > 0 {
                chunks.push(current.trim_end().to_string());
                current = sentence;
                current.push(' ');
                current_len = sentence_len + 1;
            } else {
                current.push_str(&sentence);
                current.push(' ');
                current_len += sentence_len + 1;
            }
        }

        let last = current.trim_end();
        if !last.is_empty() {
            chunks.push(last.to_string());
        }

        chunks
    }

    /// Coalesces adjacent chunks whose combined length (plus one joining
    /// space) stays within `max_chunk_size`.
    ///
    /// Greedy packing can leave short chunks behind when one long sentence
    /// forced an early break; this pass reduces the chunk count. Idempotent:
    /// running it on its own output produces no further merges.
    fn merge_small_chunks(&self, chunks: Vec<String>) -> Vec<String> {
        let mut merged = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for chunk in chunks {
            let chunk_len = chunk.chars().count();
            if current_len + chunk_len + 1 <= self.max_chunk_size {
                if !current.is_empty() {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(&chunk);
                current_len += chunk_len;
            } else {
                if !current.is_empty() {
                    merged.push(current);
                }
                current = chunk;
                current_len = chunk_len;
            }
        }

        if !current.is_empty() {
            merged.push(current);
        }

        merged
    }
}

// =============================================================================
// Normalization and Sentence Splitting
// =============================================================================

/// Replaces characters hostile to the SSML payload and normalizes line
/// endings.
///
/// This is deliberately not full XML escaping: `&`, `<`, and `>` are rewritten
/// into speakable equivalents so the downstream SSML document stays well
/// formed without entity encoding.
pub fn normalize_text(text: &str) -> String {
    let text = DENYLIST_SYMBOLS.replace_all(text, "-");
    text.replace('\\', "/")
        .replace('&', " and ")
        .replace('<', "(")
        .replace('>', ")")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Splits text into sentences at terminal punctuation (`.` `!` `?`) followed
/// by whitespace.
///
/// Fragments are trimmed; empty fragments are discarded. Text with no
/// terminal punctuation comes back as one sentence. The boundary rule is a
/// heuristic: abbreviations like "Dr." split too, which is acceptable because
/// chunk joins at any sentence-shaped boundary synthesize cleanly.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut after_terminal = false;

    for (idx, ch) in text.char_indices() {
        if after_terminal && ch.is_whitespace() {
            sentences.push(&text[start..idx]);
            start = idx;
        }
        after_terminal = matches!(ch, '.' | '!' | '?');
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// =============================================================================
// Statistics
// =============================================================================

/// Summary statistics over a chunk sequence, for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStats {
    /// Number of chunks produced.
    pub chunk_count: usize,
    /// Total characters across all chunks.
    pub total_chars: usize,
    /// Mean chunk size in characters (0 for an empty sequence).
    pub average_chunk_size: usize,
    /// Smallest chunk size in characters.
    pub min_chunk_size: usize,
    /// Largest chunk size in characters.
    pub max_chunk_size: usize,
}

impl SegmentStats {
    /// Computes statistics for a chunk sequence.
    pub fn from_chunks(chunks: &[String]) -> Self {
        let sizes: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        let total: usize = sizes.iter().sum();
        Self {
            chunk_count: chunks.len(),
            total_chars: total,
            average_chunk_size: if chunks.is_empty() {
                0
            } else {
                total / chunks.len()
            },
            min_chunk_size: sizes.iter().copied().min().unwrap_or(0),
            max_chunk_size: sizes.iter().copied().max().unwrap_or(0),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
