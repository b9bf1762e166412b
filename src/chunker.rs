//! Fixed-size document chunking.
//!
//! Chunks are consecutive, non-overlapping slices of the input measured in
//! characters. No attempt is made to respect sentence or paragraph boundaries.

use tracing::debug;

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Splits `text` into consecutive slices of at most `max_chars` characters.
///
/// Concatenating the result reproduces `text` exactly. Only the last chunk may
/// be shorter than `max_chars`. Empty input yields no chunks. A `max_chars` of
/// zero is treated as one.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(idx, _)| idx);
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }

    debug!(
        input_chars = text.chars().count(),
        chunk_count = chunks.len(),
        max_chars,
        "Text chunked"
    );

    chunks
}
