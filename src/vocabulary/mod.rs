//! Visual vocabulary interface for Bag-of-Words place recognition.
//!
//! The vocabulary tree itself (descriptor quantization, TF-IDF weighting,
//! scoring metric) lives outside this crate. The KeyFrame database only needs
//! two things from it:
//! - the number of visual words, to size the inverted file
//! - a similarity score between two [`BowVector`]s
//!
//! Both are captured by the [`Vocabulary`] trait so any DBoW2-style
//! implementation can be plugged in behind an `Arc<dyn Vocabulary>`.

use std::collections::BTreeMap;

/// Bag-of-Words vector: word_id -> TF-IDF weight.
///
/// Only words present in the image are listed. Iteration is ordered by
/// word id, which keeps inverted-file scans (and therefore candidate
/// grouping order) deterministic.
pub type BowVector = BTreeMap<u32, f64>;

/// A visual vocabulary as seen by the KeyFrame database.
///
/// Implementations must be pure: `score` is called from retrieval without
/// holding any lock, possibly from several threads at once.
pub trait Vocabulary: Send + Sync {
    /// Number of visual words (leaf nodes) in the vocabulary.
    fn size(&self) -> usize;

    /// Similarity between two BoW vectors.
    ///
    /// Higher means more similar. The range is implementation defined
    /// (DBoW2 L1 scoring gives `[0, 1]`).
    fn score(&self, v1: &BowVector, v2: &BowVector) -> f64;
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Vocabulary doubles shared by the unit tests of this crate.

    use super::{BowVector, Vocabulary};

    /// DBoW2 L1 scoring over L1-normalized vectors: `1 - 0.5 * ||v1 - v2||_1`.
    #[derive(Debug, Clone)]
    pub struct L1Vocabulary {
        pub num_words: usize,
    }

    impl L1Vocabulary {
        pub fn new(num_words: usize) -> Self {
            Self { num_words }
        }
    }

    impl Vocabulary for L1Vocabulary {
        fn size(&self) -> usize {
            self.num_words
        }

        fn score(&self, v1: &BowVector, v2: &BowVector) -> f64 {
            let mut diff_sum = 0.0;
            for (word_id, w1) in v1 {
                let w2 = v2.get(word_id).copied().unwrap_or(0.0);
                diff_sum += (w1 - w2).abs();
            }
            for (word_id, w2) in v2 {
                if !v1.contains_key(word_id) {
                    diff_sum += w2.abs();
                }
            }
            1.0 - 0.5 * diff_sum
        }
    }

    /// Build an L1-normalized BoW vector giving each word the same weight.
    pub fn uniform_bow(words: &[u32]) -> BowVector {
        let weight = 1.0 / words.len().max(1) as f64;
        words.iter().map(|&w| (w, weight)).collect()
    }

    /// Build a BoW vector from explicit (word, weight) pairs.
    pub fn bow(pairs: &[(u32, f64)]) -> BowVector {
        pairs.iter().copied().collect()
    }
}
