//! Paragraph-boundary text chunker.
//!
//! Splits text on blank lines (`\n\n`), trims every piece and drops the
//! ones that end up empty. The splitter is deliberately coarse: it knows
//! nothing about markdown headers, code fences or sentences.

/// Split text into trimmed, non-empty paragraphs in document order.
pub fn chunk_text(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(str::to_string)
        .collect()
}
