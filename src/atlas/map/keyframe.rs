//! KeyFrame - A selected frame with map structure relationships.
//!
//! For place recognition a KeyFrame contributes:
//! - its Bag-of-Words vector (the words it is filed under in the database)
//! - its covisibility edges (used to group and exclude candidates)
//!
//! The covisibility graph connects KeyFrames that share MapPoint observations.

use std::collections::{HashMap, HashSet};

use crate::vocabulary::BowVector;

use super::types::KeyFrameId;

/// A KeyFrame in the SLAM map.
#[derive(Clone)]
pub struct KeyFrame {
    /// Unique identifier for this KeyFrame.
    pub id: KeyFrameId,

    /// Timestamp in nanoseconds.
    pub timestamp_ns: u64,

    /// Optional Bag-of-Words representation used for place recognition.
    ///
    /// The vocabulary and BoW computation live outside of this type; the
    /// KeyFrame simply stores the resulting sparse histogram.
    pub bow_vector: Option<BowVector>,

    // ─────────────────────────────────────────────────────────────────────────
    // Covisibility Graph
    // ─────────────────────────────────────────────────────────────────────────
    /// Covisibility weights: connected KeyFrame → number of shared MapPoints.
    /// This is the adjacency list for the covisibility graph.
    covisibility_weights: HashMap<KeyFrameId, usize>,

    /// Ordered list of covisible KeyFrames (best first).
    /// Rebuilt whenever covisibility_weights changes so read-only queries
    /// never need `&mut self`.
    ordered_covisibles: Vec<(KeyFrameId, usize)>,

    /// Whether this KeyFrame is marked as bad (to be removed).
    pub is_bad: bool,
}

impl KeyFrame {
    /// Create a new KeyFrame without a BoW vector.
    pub fn new(id: KeyFrameId, timestamp_ns: u64) -> Self {
        Self {
            id,
            timestamp_ns,
            bow_vector: None,
            covisibility_weights: HashMap::new(),
            ordered_covisibles: Vec::new(),
            is_bad: false,
        }
    }

    /// Create a new KeyFrame with its BoW vector already computed.
    pub fn with_bow(id: KeyFrameId, timestamp_ns: u64, bow: BowVector) -> Self {
        let mut kf = Self::new(id, timestamp_ns);
        kf.bow_vector = Some(bow);
        kf
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bag-of-Words accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the Bag-of-Words vector for this keyframe.
    ///
    /// If the keyframe is already filed in a KeyFrame database, erase it
    /// there first: the database files keyframes under their current words.
    pub fn set_bow_vector(&mut self, bow: BowVector) {
        self.bow_vector = Some(bow);
    }

    /// Get a reference to the Bag-of-Words vector, if available.
    pub fn bow_vector(&self) -> Option<&BowVector> {
        self.bow_vector.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Covisibility Graph
    // ─────────────────────────────────────────────────────────────────────────

    /// Add or update a covisibility connection.
    ///
    /// # Arguments
    /// * `kf_id` - The connected KeyFrame
    /// * `weight` - Number of shared MapPoints
    pub fn add_covisibility(&mut self, kf_id: KeyFrameId, weight: usize) {
        if kf_id == self.id {
            return; // Don't connect to self
        }
        self.covisibility_weights.insert(kf_id, weight);
        self.update_best_covisibles();
    }

    /// Remove a covisibility connection.
    pub fn erase_covisibility(&mut self, kf_id: KeyFrameId) {
        if self.covisibility_weights.remove(&kf_id).is_some() {
            self.update_best_covisibles();
        }
    }

    /// Get the covisibility weight with another KeyFrame.
    pub fn get_covisibility_weight(&self, kf_id: KeyFrameId) -> usize {
        self.covisibility_weights.get(&kf_id).copied().unwrap_or(0)
    }

    /// Get all covisible KeyFrames (unordered).
    pub fn get_covisibles(&self) -> impl Iterator<Item = &KeyFrameId> {
        self.covisibility_weights.keys()
    }

    /// Set of KeyFrames connected to this one in the covisibility graph.
    ///
    /// These are excluded from loop detection: they are already linked.
    pub fn connected_keyframes(&self) -> HashSet<KeyFrameId> {
        self.covisibility_weights.keys().copied().collect()
    }

    /// Get the N best covisible KeyFrames (most shared points first).
    pub fn best_covisibles(&self, n: usize) -> Vec<KeyFrameId> {
        self.ordered_covisibles
            .iter()
            .take(n)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Rebuild the ordered covisibles list.
    ///
    /// Ties on weight are broken by KeyFrame id so the order is stable.
    fn update_best_covisibles(&mut self) {
        self.ordered_covisibles = self
            .covisibility_weights
            .iter()
            .map(|(id, w)| (*id, *w))
            .collect();
        self.ordered_covisibles
            .sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    }

    /// Mark this KeyFrame as bad.
    pub fn set_bad(&mut self) {
        self.is_bad = true;
    }
}

impl std::fmt::Debug for KeyFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFrame")
            .field("id", &self.id)
            .field("timestamp_ns", &self.timestamp_ns)
            .field("num_words", &self.bow_vector.as_ref().map_or(0, |b| b.len()))
            .field("covisibles", &self.covisibility_weights.len())
            .field("is_bad", &self.is_bad)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::test_support::uniform_bow;

    fn create_test_keyframe(id: u64) -> KeyFrame {
        KeyFrame::new(KeyFrameId::new(id), 1_000_000 * id)
    }

    #[test]
    fn test_bow_vector_accessors() {
        let mut kf = create_test_keyframe(1);
        assert!(kf.bow_vector().is_none());

        kf.set_bow_vector(uniform_bow(&[3, 4]));
        let bow = kf.bow_vector().unwrap();
        assert_eq!(bow.len(), 2);
        assert!(bow.contains_key(&3));

        let kf2 = KeyFrame::with_bow(KeyFrameId::new(2), 0, uniform_bow(&[1]));
        assert!(kf2.bow_vector().is_some());
    }

    #[test]
    fn test_covisibility_graph() {
        let mut kf = create_test_keyframe(1);

        kf.add_covisibility(KeyFrameId::new(2), 50);
        kf.add_covisibility(KeyFrameId::new(3), 100);
        kf.add_covisibility(KeyFrameId::new(4), 25);

        assert_eq!(kf.get_covisibility_weight(KeyFrameId::new(2)), 50);
        assert_eq!(kf.get_covisibility_weight(KeyFrameId::new(5)), 0); // Not connected

        // Get best covisibles (should be ordered by weight descending)
        let best = kf.best_covisibles(2);
        assert_eq!(best, vec![KeyFrameId::new(3), KeyFrameId::new(2)]);

        // Asking for more than available returns everything
        assert_eq!(kf.best_covisibles(10).len(), 3);
    }

    #[test]
    fn test_covisibility_update_and_erase() {
        let mut kf = create_test_keyframe(1);
        kf.add_covisibility(KeyFrameId::new(2), 10);
        kf.add_covisibility(KeyFrameId::new(3), 20);
        assert_eq!(kf.best_covisibles(1), vec![KeyFrameId::new(3)]);

        // Re-adding overwrites the weight and reorders
        kf.add_covisibility(KeyFrameId::new(2), 30);
        assert_eq!(kf.best_covisibles(1), vec![KeyFrameId::new(2)]);

        kf.erase_covisibility(KeyFrameId::new(2));
        assert_eq!(kf.best_covisibles(10), vec![KeyFrameId::new(3)]);
        assert!(!kf.connected_keyframes().contains(&KeyFrameId::new(2)));
    }

    #[test]
    fn test_covisibility_tie_order_is_stable() {
        let mut kf = create_test_keyframe(1);
        kf.add_covisibility(KeyFrameId::new(9), 15);
        kf.add_covisibility(KeyFrameId::new(4), 15);
        kf.add_covisibility(KeyFrameId::new(6), 15);
        assert_eq!(
            kf.best_covisibles(3),
            vec![KeyFrameId::new(4), KeyFrameId::new(6), KeyFrameId::new(9)]
        );
    }

    #[test]
    fn test_covisibility_no_self_connection() {
        let mut kf = create_test_keyframe(1);
        kf.add_covisibility(KeyFrameId::new(1), 100); // Try to connect to self
        assert_eq!(kf.get_covisibility_weight(KeyFrameId::new(1)), 0);
        assert!(kf.connected_keyframes().is_empty());
    }

    #[test]
    fn test_set_bad() {
        let mut kf = create_test_keyframe(1);
        assert!(!kf.is_bad);
        kf.set_bad();
        assert!(kf.is_bad);
    }
}
