//! Recursive character text splitter.
//!
//! Splits document text into [`Chunk`]s of a target size (measured in
//! characters) with a fixed overlap between neighbours. Splitting prefers
//! the coarsest boundary that fits: paragraph (`\n\n`), then line (`\n`),
//! then word (` `), then individual characters.
//!
//! Each chunk carries the parent document's source metadata, a contiguous
//! index within the ingestion call, and a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, Document};

/// Separator hierarchy, coarsest first. The empty separator splits into
/// individual characters and always matches.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Split text into overlapping pieces of at most `chunk_size` characters.
///
/// Deterministic: the same input and parameters always produce the same
/// sequence of pieces. Always returns at least one piece.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let pieces = split_recursive(text, &SEPARATORS, chunk_size, chunk_overlap);
    if pieces.is_empty() {
        return vec![text.trim().to_string()];
    }
    pieces
}

/// Chunk a batch of documents, assigning contiguous indices across the
/// whole batch starting at 0.
pub fn chunk_documents(docs: &[Document], chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut index: i64 = 0;
    for doc in docs {
        for text in split_text(&doc.text, chunk_size, chunk_overlap) {
            chunks.push(make_chunk(doc, index, &text));
            index += 1;
        }
    }
    chunks
}

fn make_chunk(doc: &Document, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        source: doc.source.clone(),
        locator: doc.locator(),
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_with_separator(text: &str, sep: &str) -> Vec<String> {
    if sep.is_empty() {
        text.chars().map(|c| c.to_string()).collect()
    } else {
        text.split(sep)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}

fn split_recursive(
    text: &str,
    separators: &[&str],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    // Pick the coarsest separator present in the text.
    let mut separator = *separators.last().unwrap_or(&"");
    let mut remaining: &[&str] = &[];
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            separator = sep;
            remaining = &separators[i + 1..];
            break;
        }
    }

    let splits = split_with_separator(text, separator);
    let mut final_chunks = Vec::new();
    let mut good_splits: Vec<String> = Vec::new();

    for s in splits {
        if char_len(&s) < chunk_size {
            good_splits.push(s);
        } else {
            if !good_splits.is_empty() {
                final_chunks.extend(merge_splits(
                    &good_splits,
                    separator,
                    chunk_size,
                    chunk_overlap,
                ));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(s);
            } else {
                final_chunks.extend(split_recursive(&s, remaining, chunk_size, chunk_overlap));
            }
        }
    }

    if !good_splits.is_empty() {
        final_chunks.extend(merge_splits(
            &good_splits,
            separator,
            chunk_size,
            chunk_overlap,
        ));
    }

    final_chunks
}

/// Greedily pack splits into windows of at most `chunk_size` characters,
/// carrying at most `chunk_overlap` characters into the next window.
fn merge_splits(
    splits: &[String],
    separator: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let sep_len = char_len(separator);
    let mut docs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for s in splits {
        let len = char_len(s);
        let added = len + if current.is_empty() { 0 } else { sep_len };

        if total + added > chunk_size && !current.is_empty() {
            let doc = current.join(separator);
            let trimmed = doc.trim();
            if !trimmed.is_empty() {
                docs.push(trimmed.to_string());
            }

            // Slide the window until the overlap budget holds and the new
            // split fits.
            while !current.is_empty()
                && (total > chunk_overlap
                    || (total + len + if current.is_empty() { 0 } else { sep_len } > chunk_size
                        && total > 0))
            {
                let first_len = char_len(current[0]);
                total -= first_len + if current.len() > 1 { sep_len } else { 0 };
                current.remove(0);
            }
        }

        total += len + if current.is_empty() { 0 } else { sep_len };
        current.push(s.as_str());
    }

    let doc = current.join(separator);
    let trimmed = doc.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }

    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionKind;

    fn doc(text: &str) -> Document {
        Document {
            source: "test.pdf".to_string(),
            position: 1,
            position_kind: PositionKind::Page,
            text: text.to_string(),
        }
    }

    #[test]
    fn small_text_single_chunk() {
        let pieces = split_text("Hello, world!", 1024, 80);
        assert_eq!(pieces, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn empty_text_still_yields_one_chunk() {
        let pieces = split_text("", 1024, 80);
        assert_eq!(pieces.len(), 1);
    }

    #[test]
    fn character_level_windows_with_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let pieces = split_text(text, 10, 3);
        assert_eq!(
            pieces,
            vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxyz"]
        );
    }

    #[test]
    fn no_chunk_exceeds_target_size() {
        let text = (0..200)
            .map(|i| format!("word{:03}", i))
            .collect::<Vec<_>>()
            .join(" ");
        for piece in split_text(&text, 64, 16) {
            assert!(
                piece.chars().count() <= 64,
                "chunk too long: {:?}",
                piece
            );
        }
    }

    #[test]
    fn paragraphs_preferred_over_mid_text_splits() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let pieces = split_text(text, 30, 5);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0], "First paragraph here.");
        assert_eq!(pieces[1], "Second paragraph here.");
    }

    #[test]
    fn short_paragraphs_merge_into_one_chunk() {
        let text = "Alpha.\n\nBeta.\n\nGamma.";
        let pieces = split_text(text, 1024, 80);
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].contains("Alpha."));
        assert!(pieces[0].contains("Gamma."));
    }

    #[test]
    fn splitting_is_deterministic() {
        let text = (0..80)
            .map(|i| format!("Sentence number {} in a longer document.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let a = split_text(&text, 120, 24);
        let b = split_text(&text, 120, 24);
        assert_eq!(a, b);
    }

    #[test]
    fn chunk_indices_contiguous_across_documents() {
        let docs = vec![doc("One.\n\nTwo.\n\nThree."), doc("Four.\n\nFive.")];
        let chunks = chunk_documents(&docs, 8, 2);
        assert!(chunks.len() >= docs.len());
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
        }
    }

    #[test]
    fn chunks_inherit_document_metadata() {
        let chunks = chunk_documents(&[doc("Some page text.")], 1024, 80);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "test.pdf");
        assert_eq!(chunks[0].locator, "page 1");
        assert_eq!(chunks[0].hash.len(), 64);
    }

    #[test]
    fn rechunking_same_document_matches() {
        let d = doc(&"lorem ipsum dolor sit amet ".repeat(100));
        let a = chunk_documents(std::slice::from_ref(&d), 256, 32);
        let b = chunk_documents(std::slice::from_ref(&d), 256, 32);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.text, y.text);
            assert_eq!(x.hash, y.hash);
            assert_eq!(x.chunk_index, y.chunk_index);
        }
    }
}
