//! BM25 keyword retrieval.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{Passage, Retriever};

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Okapi BM25 over an in-memory passage set.
#[derive(Debug, Clone)]
pub struct LexicalRetriever {
    passages: Vec<Passage>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<f32>,
    doc_freqs: HashMap<String, u32>,
    avg_len: f32,
}

impl LexicalRetriever {
    #[must_use]
    pub fn new(passages: Vec<Passage>) -> Self {
        let mut term_freqs = Vec::with_capacity(passages.len());
        let mut doc_lens = Vec::with_capacity(passages.len());
        let mut doc_freqs: HashMap<String, u32> = HashMap::new();

        for passage in &passages {
            let mut tf: HashMap<String, u32> = HashMap::new();
            let mut len = 0usize;
            for term in tokenize(&passage.text) {
                *tf.entry(term).or_default() += 1;
                len += 1;
            }
            for term in tf.keys() {
                *doc_freqs.entry(term.clone()).or_default() += 1;
            }
            term_freqs.push(tf);
            doc_lens.push(len as f32);
        }

        let avg_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<f32>() / doc_lens.len() as f32
        };

        Self {
            passages,
            term_freqs,
            doc_lens,
            doc_freqs,
            avg_len,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.passages.len() as f32;
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score(&self, doc: usize, query_terms: &[String]) -> f32 {
        let tf = &self.term_freqs[doc];
        let norm = if self.avg_len > 0.0 {
            1.0 - B + B * self.doc_lens[doc] / self.avg_len
        } else {
            1.0
        };

        query_terms
            .iter()
            .filter_map(|term| tf.get(term).map(|&f| (term, f as f32)))
            .map(|(term, f)| self.idf(term) * f * (K1 + 1.0) / (f + K1 * norm))
            .sum()
    }

    /// Indices of the best `k` passages with a positive score, best first.
    fn rank(&self, query: &str, k: usize) -> Vec<usize> {
        let mut query_terms: Vec<String> = tokenize(query).collect();
        query_terms.sort();
        query_terms.dedup();

        let mut scored: Vec<(usize, f32)> = (0..self.passages.len())
            .map(|doc| (doc, self.score(doc, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored.into_iter().map(|(doc, _)| doc).collect()
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<String>> {
        Ok(self
            .rank(query, k)
            .into_iter()
            .map(|doc| self.passages[doc].text.clone())
            .collect())
    }
}

/// Lowercased alphanumeric words.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}
