//! KeyFrameDatabase - Bag-of-Words place recognition database.
//!
//! The database is an inverted file: for every visual word of the vocabulary
//! it keeps the list of keyframes whose BoW vector contains that word. It
//! answers two kinds of queries:
//! - **Loop detection** for a new keyframe, ignoring keyframes it is
//!   already connected to in the covisibility graph
//! - **Relocalization** for a tracked frame after tracking is lost
//!
//! Both queries follow the same three steps:
//! 1. Scan the inverted file (under the database lock) and count, for every
//!    keyframe, how many words it shares with the query
//! 2. Score only the keyframes sharing at least 80% of the best word count
//! 3. Accumulate scores over each candidate's best covisible neighbours and
//!    keep one representative per covisibility group, above 75% of the best
//!    accumulated score
//!
//! # Ownership
//!
//! The database never owns keyframes: buckets hold [`KeyFrameId`] handles
//! that are resolved through a [`CovisibilityGraph`] (normally the
//! [`Map`](crate::atlas::map::Map)) at query time. A keyframe must be
//! [`erase`](KeyFrameDatabase::erase)d before it is removed from the map;
//! handles that no longer resolve are skipped.
//!
//! # Threading
//!
//! The inverted file is behind a single mutex, held for `add`, `erase`,
//! `clear` and for the scan step of a query. Scoring and accumulation run
//! without it. All per-query bookkeeping lives in the query call itself, so
//! any number of loop and relocalization queries may run concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::atlas::config::KeyFrameDatabaseConfig;
use crate::atlas::map::{KeyFrame, KeyFrameId};
use crate::tracking::Frame;
use crate::vocabulary::{BowVector, Vocabulary};

/// Keyframe data the database needs at query time.
///
/// Implemented by [`Map`](crate::atlas::map::Map). Lookups return `None` /
/// empty for handles that no longer resolve to a usable keyframe.
pub trait CovisibilityGraph {
    /// BoW vector of a keyframe.
    fn bow_vector(&self, id: KeyFrameId) -> Option<&BowVector>;

    /// Up to `n` covisible keyframes, most shared observations first.
    fn best_covisibility_keyframes(&self, id: KeyFrameId, n: usize) -> Vec<KeyFrameId>;
}

/// Keyframe with a similarity score (raw or covisibility-accumulated).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    score: f64,
    keyframe_id: KeyFrameId,
}

/// Per-keyframe bookkeeping for a single query.
#[derive(Debug, Default, Clone, Copy)]
struct QueryScratch {
    /// Keyframe was picked up by this query (shares a word, not excluded).
    tagged: bool,
    /// Number of query words found in this keyframe.
    common_words: usize,
    /// Similarity against the query, once computed.
    score: Option<f64>,
}

/// Parameters distinguishing loop detection from relocalization.
#[derive(Debug, Clone, Copy)]
struct CandidateQuery<'a> {
    /// Keyframes never returned nor counted (loop: covisible keyframes).
    excluded: Option<&'a HashSet<KeyFrameId>>,
    /// Candidates scoring below this are not grouped.
    min_score: Option<f64>,
    /// Starting value of the best accumulated score.
    initial_best_score: f64,
    kind: &'static str,
}

/// Inverted-file keyframe database shared by Loop Closing and Tracking.
pub struct KeyFrameDatabase {
    /// Vocabulary used for scoring and to size the inverted file.
    vocabulary: Arc<dyn Vocabulary>,

    config: KeyFrameDatabaseConfig,

    /// Word id -> keyframes containing that word, in insertion order.
    inverted_file: Mutex<Vec<Vec<KeyFrameId>>>,
}

impl KeyFrameDatabase {
    /// Create an empty database with the default (ORB-SLAM) thresholds.
    ///
    /// # Panics
    /// If the vocabulary has no words.
    pub fn new(vocabulary: Arc<dyn Vocabulary>) -> Self {
        Self::with_config(vocabulary, KeyFrameDatabaseConfig::default())
    }

    /// Create an empty database with custom thresholds.
    ///
    /// # Panics
    /// If the vocabulary has no words or the configuration is invalid.
    pub fn with_config(vocabulary: Arc<dyn Vocabulary>, config: KeyFrameDatabaseConfig) -> Self {
        let num_words = vocabulary.size();
        assert!(num_words > 0, "KeyFrameDatabase requires a non-empty vocabulary");
        if let Err(e) = config.validate() {
            panic!("invalid KeyFrameDatabase configuration: {}", e);
        }

        tracing::info!("KeyFrameDatabase created: {} words", num_words);

        Self {
            vocabulary,
            config,
            inverted_file: Mutex::new(vec![Vec::new(); num_words]),
        }
    }

    /// The vocabulary used for scoring.
    pub fn vocabulary(&self) -> &Arc<dyn Vocabulary> {
        &self.vocabulary
    }

    /// The retrieval thresholds.
    pub fn config(&self) -> &KeyFrameDatabaseConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inverted file maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// File a keyframe under every word of its BoW vector.
    ///
    /// Must be called at most once per keyframe; adding twice files it twice.
    /// Word ids outside the vocabulary are skipped. After [`release`](Self::release)
    /// the inverted file is restored to one bucket per vocabulary word.
    pub fn add(&self, kf: &KeyFrame) {
        let bow = match kf.bow_vector() {
            Some(bow) => bow,
            None => {
                warn!("{} added to KeyFrameDatabase without a BoW vector", kf.id);
                return;
            }
        };

        let num_words = self.vocabulary.size();
        let mut skipped = 0;

        let mut inverted_file = self.inverted_file.lock();
        for &word_id in bow.keys() {
            let word = word_id as usize;
            if word >= num_words {
                skipped += 1;
                continue;
            }
            if word >= inverted_file.len() {
                inverted_file.resize(num_words, Vec::new());
            }
            inverted_file[word].push(kf.id);
        }
        drop(inverted_file);

        if skipped > 0 {
            warn!(
                "{}: {} words outside the {}-word vocabulary were not filed",
                kf.id, skipped, num_words
            );
        }
    }

    /// Remove a keyframe from every word of its BoW vector.
    ///
    /// Only the first occurrence in each bucket is removed; words where the
    /// keyframe is not filed are left untouched.
    pub fn erase(&self, kf: &KeyFrame) {
        let bow = match kf.bow_vector() {
            Some(bow) => bow,
            None => return,
        };

        let mut inverted_file = self.inverted_file.lock();
        for &word_id in bow.keys() {
            // List of keyframes that share the word
            if let Some(bucket) = inverted_file.get_mut(word_id as usize) {
                if let Some(pos) = bucket.iter().position(|&id| id == kf.id) {
                    bucket.remove(pos);
                }
            }
        }
    }

    /// Empty every bucket, keeping one bucket per vocabulary word.
    pub fn clear(&self) {
        let mut inverted_file = self.inverted_file.lock();
        inverted_file.clear();
        inverted_file.resize(self.vocabulary.size(), Vec::new());
        tracing::info!("KeyFrameDatabase cleared");
    }

    /// Drop all buckets, releasing their memory.
    ///
    /// The database stays usable: the next `add` restores the buckets.
    pub fn release(&self) {
        let mut inverted_file = self.inverted_file.lock();
        *inverted_file = Vec::new();
    }

    /// Snapshot of the whole inverted file.
    pub fn inverted_file(&self) -> Vec<Vec<KeyFrameId>> {
        self.inverted_file.lock().clone()
    }

    /// Number of word buckets.
    pub fn num_buckets(&self) -> usize {
        self.inverted_file.lock().len()
    }

    /// Keyframes filed under a word (empty for unknown words).
    pub fn bucket(&self, word_id: u32) -> Vec<KeyFrameId> {
        self.inverted_file
            .lock()
            .get(word_id as usize)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether a keyframe is filed under a word.
    pub fn contains(&self, word_id: u32, kf_id: KeyFrameId) -> bool {
        self.inverted_file
            .lock()
            .get(word_id as usize)
            .map_or(false, |bucket| bucket.contains(&kf_id))
    }

    /// True if no keyframe is filed under any word.
    pub fn is_empty(&self) -> bool {
        self.inverted_file.lock().iter().all(Vec::is_empty)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Find loop closure candidates for a keyframe.
    ///
    /// Keyframes connected to `kf` in the covisibility graph are never
    /// returned. Candidates scoring below `min_score` against `kf` are not
    /// grouped (they can still reinforce a neighbour's group).
    ///
    /// # Returns
    /// Deduplicated keyframe ids in grouping order (not sorted by score).
    /// Empty when nothing matches.
    pub fn detect_loop_candidates<G>(&self, kf: &KeyFrame, graph: &G, min_score: f64) -> Vec<KeyFrameId>
    where
        G: CovisibilityGraph + ?Sized,
    {
        let bow = match kf.bow_vector() {
            Some(bow) => bow,
            None => return Vec::new(),
        };

        let connected = kf.connected_keyframes();
        let query = CandidateQuery {
            excluded: Some(&connected),
            min_score: Some(min_score),
            initial_best_score: min_score,
            kind: "loop",
        };

        let candidates = self.detect_candidates(bow, graph, query);
        debug!("{}: {} loop candidates", kf.id, candidates.len());
        candidates
    }

    /// Find relocalization candidates for a tracked frame.
    ///
    /// Every keyframe is eligible and there is no absolute score floor.
    ///
    /// # Returns
    /// Deduplicated keyframe ids in grouping order (not sorted by score).
    /// Empty when nothing matches.
    pub fn detect_relocalization_candidates<G>(&self, frame: &Frame, graph: &G) -> Vec<KeyFrameId>
    where
        G: CovisibilityGraph + ?Sized,
    {
        let bow = match frame.bow_vector() {
            Some(bow) => bow,
            None => return Vec::new(),
        };

        let query = CandidateQuery {
            excluded: None,
            min_score: None,
            initial_best_score: 0.0,
            kind: "relocalization",
        };

        let candidates = self.detect_candidates(bow, graph, query);
        debug!("{}: {} relocalization candidates", frame.id, candidates.len());
        candidates
    }

    /// Shared retrieval: scan, score, accumulate by covisibility, threshold.
    fn detect_candidates<G>(&self, query_bow: &BowVector, graph: &G, query: CandidateQuery<'_>) -> Vec<KeyFrameId>
    where
        G: CovisibilityGraph + ?Sized,
    {
        let (sharing_words, mut scratch) = self.collect_sharing_words(query_bow, query.excluded);
        if sharing_words.is_empty() {
            return Vec::new();
        }

        // Only compare against those keyframes that share enough words
        let max_common_words = sharing_words
            .iter()
            .filter_map(|id| scratch.get(id))
            .map(|s| s.common_words)
            .max()
            .unwrap_or(0);
        let min_common_words = self.config.min_common_words(max_common_words);

        let mut score_and_match = Vec::new();
        for &kf_id in &sharing_words {
            let entry = match scratch.get_mut(&kf_id) {
                Some(entry) if entry.common_words > min_common_words => entry,
                _ => continue,
            };

            let kf_bow = match graph.bow_vector(kf_id) {
                Some(bow) => bow,
                None => {
                    warn!("{} is filed in the KeyFrameDatabase but not in the map", kf_id);
                    continue;
                }
            };

            let score = self.vocabulary.score(query_bow, kf_bow);
            entry.score = Some(score);
            if query.min_score.map_or(true, |min| score >= min) {
                score_and_match.push(Candidate {
                    score,
                    keyframe_id: kf_id,
                });
            }
        }

        debug!(
            "{} query: {} sharing words (max {}, min {}), {} scored above floor",
            query.kind,
            sharing_words.len(),
            max_common_words,
            min_common_words,
            score_and_match.len()
        );

        if score_and_match.is_empty() {
            return Vec::new();
        }

        // Accumulate score by covisibility
        let mut acc_score_and_match = Vec::with_capacity(score_and_match.len());
        let mut best_acc_score = query.initial_best_score;

        for candidate in &score_and_match {
            let neighbors = graph
                .best_covisibility_keyframes(candidate.keyframe_id, self.config.covisibility_neighbors);

            let mut best_score = candidate.score;
            let mut acc_score = candidate.score;
            let mut best_kf = candidate.keyframe_id;

            for neighbor_id in neighbors {
                let neighbor_score = match scratch.get(&neighbor_id) {
                    Some(s) if s.tagged && s.common_words > min_common_words => s.score,
                    _ => None,
                };
                if let Some(score) = neighbor_score {
                    acc_score += score;
                    if score > best_score {
                        best_kf = neighbor_id;
                        best_score = score;
                    }
                }
            }

            acc_score_and_match.push(Candidate {
                score: acc_score,
                keyframe_id: best_kf,
            });
            if acc_score > best_acc_score {
                best_acc_score = acc_score;
            }
        }

        // Return all those keyframes with a score higher than 0.75 * best
        let min_score_to_retain = self.config.min_retain_ratio * best_acc_score;
        let mut already_added = HashSet::new();

        acc_score_and_match
            .iter()
            .filter(|c| c.score > min_score_to_retain)
            .filter(|c| already_added.insert(c.keyframe_id))
            .map(|c| c.keyframe_id)
            .collect()
    }

    /// Find every keyframe sharing at least one word with the query.
    ///
    /// Returns the tagged keyframes in discovery order, plus the per-keyframe
    /// word counts. Excluded keyframes are counted but never tagged.
    fn collect_sharing_words(
        &self,
        query_bow: &BowVector,
        excluded: Option<&HashSet<KeyFrameId>>,
    ) -> (Vec<KeyFrameId>, HashMap<KeyFrameId, QueryScratch>) {
        let mut sharing_words = Vec::new();
        let mut scratch: HashMap<KeyFrameId, QueryScratch> = HashMap::new();

        let inverted_file = self.inverted_file.lock();
        for &word_id in query_bow.keys() {
            let bucket = match inverted_file.get(word_id as usize) {
                Some(bucket) => bucket,
                None => continue,
            };

            for &kf_id in bucket {
                let entry = scratch.entry(kf_id).or_default();
                if !entry.tagged {
                    entry.common_words = 0;
                    if !excluded.map_or(false, |set| set.contains(&kf_id)) {
                        entry.tagged = true;
                        sharing_words.push(kf_id);
                    }
                }
                entry.common_words += 1;
            }
        }

        (sharing_words, scratch)
    }
}

impl std::fmt::Debug for KeyFrameDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inverted_file = self.inverted_file.lock();
        f.debug_struct("KeyFrameDatabase")
            .field("num_words", &self.vocabulary.size())
            .field("num_buckets", &inverted_file.len())
            .field("num_entries", &inverted_file.iter().map(Vec::len).sum::<usize>())
            .field("config", &self.config)
            .finish()
    }
}
