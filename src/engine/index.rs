//! In-memory vector index with cosine-similarity search.

/// One indexed passage.
#[derive(Debug, Clone)]
struct IndexEntry {
    text: String,
    embedding: Vec<f32>,
}

/// Flat vector index over the passages of one ingested page.
///
/// Pages are small enough that a linear scan beats any approximate
/// structure here.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a passage with its embedding.
    pub fn insert(&mut self, text: impl Into<String>, embedding: Vec<f32>) {
        self.entries.push(IndexEntry {
            text: text.into(),
            embedding,
        });
    }

    /// Number of indexed passages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return up to `k` passages most similar to `query`, best first.
    ///
    /// Ties keep insertion order, so earlier passages win.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<&str> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.entries[i].text.as_str())
            .collect()
    }
}

/// Cosine similarity of two vectors.
///
/// Mismatched lengths or zero-norm vectors score 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
