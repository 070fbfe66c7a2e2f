//! Paragraph-aware text chunking.
//!
//! Paragraphs (blank-line separated) are packed greedily into passages of at
//! most `chunk_size` characters. A paragraph longer than that is split on
//! word boundaries. Overlap is added afterwards by prepending the tail of
//! the preceding passage, so retrieval does not lose context at the seams.

/// A passage of page text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Zero-based position within the source document.
    pub index: usize,
    /// Passage text, including any overlap prefix.
    pub content: String,
}

/// Split `text` into overlapping passages.
///
/// Returns an empty vector for blank input. `chunk_size` of zero is treated
/// as one so the function always terminates.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    let chunk_size = chunk_size.max(1);
    let base = pack_paragraphs(text, chunk_size);

    base.iter()
        .enumerate()
        .map(|(i, content)| {
            let content = if i > 0 && overlap > 0 {
                let tail = overlap_tail(&base[i - 1], overlap);
                if tail.is_empty() {
                    content.clone()
                } else {
                    format!("{tail}\n{content}")
                }
            } else {
                content.clone()
            };
            TextChunk { index: i, content }
        })
        .collect()
}

fn pack_paragraphs(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if paragraph.len() > chunk_size {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_words(paragraph, chunk_size));
            continue;
        }

        if !current.is_empty() && current.len() + 2 + paragraph.len() > chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Pack words into pieces of at most `chunk_size` bytes. A single word
/// longer than the limit becomes its own piece.
fn split_words(paragraph: &str, chunk_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > chunk_size {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Last `max_chars` bytes of `text`, snapped forward to a whitespace
/// boundary so the overlap never starts mid-word.
fn overlap_tail(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let start = text.len() - max_chars;
    let byte_start = text
        .char_indices()
        .skip_while(|(i, _)| *i < start)
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[byte_start..].trim_start()
}
