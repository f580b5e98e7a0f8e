//! Map - Container for KeyFrames.
//!
//! The Map owns the KeyFrames of a SLAM session and maintains the symmetric
//! covisibility graph between them (edges weighted by shared MapPoints).
//!
//! The KeyFrame database never owns KeyFrames; it only stores
//! [`KeyFrameId`] handles and resolves them through this type via the
//! [`CovisibilityGraph`] trait.

use std::collections::HashMap;

use crate::atlas::keyframe_db::CovisibilityGraph;
use crate::vocabulary::BowVector;

use super::keyframe::KeyFrame;
use super::types::KeyFrameId;

/// The SLAM map containing KeyFrames.
pub struct Map {
    /// All KeyFrames in the map.
    keyframes: HashMap<KeyFrameId, KeyFrame>,

    /// Counter for generating unique KeyFrame IDs.
    next_kf_id: u64,
}

impl Map {
    /// Create a new empty Map.
    pub fn new() -> Self {
        Self {
            keyframes: HashMap::new(),
            next_kf_id: 0,
        }
    }

    /// Generate a new unique KeyFrame ID.
    fn next_keyframe_id(&mut self) -> KeyFrameId {
        let id = KeyFrameId::new(self.next_kf_id);
        self.next_kf_id += 1;
        id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // KeyFrame Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create and add a new KeyFrame with its BoW vector to the map.
    ///
    /// Returns the ID of the created KeyFrame.
    pub fn create_keyframe(&mut self, timestamp_ns: u64, bow: BowVector) -> KeyFrameId {
        let id = self.next_keyframe_id();
        self.keyframes
            .insert(id, KeyFrame::with_bow(id, timestamp_ns, bow));
        id
    }

    /// Get a KeyFrame by ID.
    pub fn get_keyframe(&self, id: KeyFrameId) -> Option<&KeyFrame> {
        self.keyframes.get(&id)
    }

    /// Get a mutable reference to a KeyFrame by ID.
    pub fn get_keyframe_mut(&mut self, id: KeyFrameId) -> Option<&mut KeyFrame> {
        self.keyframes.get_mut(&id)
    }

    /// Get all KeyFrames.
    pub fn keyframes(&self) -> impl Iterator<Item = &KeyFrame> {
        self.keyframes.values()
    }

    /// Get the number of KeyFrames.
    pub fn num_keyframes(&self) -> usize {
        self.keyframes.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Covisibility Graph
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the covisibility weight between two KeyFrames (both directions).
    ///
    /// Returns false if either KeyFrame is missing or `a == b`.
    pub fn update_covisibility(&mut self, a: KeyFrameId, b: KeyFrameId, weight: usize) -> bool {
        if a == b || !self.keyframes.contains_key(&a) || !self.keyframes.contains_key(&b) {
            return false;
        }
        if let Some(kf) = self.keyframes.get_mut(&a) {
            kf.add_covisibility(b, weight);
        }
        if let Some(kf) = self.keyframes.get_mut(&b) {
            kf.add_covisibility(a, weight);
        }
        true
    }

    /// Remove the covisibility edge between two KeyFrames (both directions).
    pub fn erase_covisibility(&mut self, a: KeyFrameId, b: KeyFrameId) {
        if let Some(kf) = self.keyframes.get_mut(&a) {
            kf.erase_covisibility(b);
        }
        if let Some(kf) = self.keyframes.get_mut(&b) {
            kf.erase_covisibility(a);
        }
    }

    /// Remove a KeyFrame and every covisibility edge pointing at it.
    ///
    /// The KeyFrame must already have been erased from any KeyFrame
    /// database it was added to.
    pub fn remove_keyframe(&mut self, kf_id: KeyFrameId) -> Option<KeyFrame> {
        let covisibles: Vec<KeyFrameId> =
            self.keyframes.get(&kf_id)?.get_covisibles().copied().collect();

        for other_kf_id in covisibles {
            if let Some(other_kf) = self.keyframes.get_mut(&other_kf_id) {
                other_kf.erase_covisibility(kf_id);
            }
        }

        self.keyframes.remove(&kf_id)
    }

    /// Clear the entire map.
    pub fn clear(&mut self) {
        self.keyframes.clear();
        self.next_kf_id = 0;
    }
}

impl CovisibilityGraph for Map {
    fn bow_vector(&self, id: KeyFrameId) -> Option<&BowVector> {
        self.keyframes
            .get(&id)
            .filter(|kf| !kf.is_bad)
            .and_then(|kf| kf.bow_vector())
    }

    fn best_covisibility_keyframes(&self, id: KeyFrameId, n: usize) -> Vec<KeyFrameId> {
        self.keyframes
            .get(&id)
            .map(|kf| kf.best_covisibles(n))
            .unwrap_or_default()
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("num_keyframes", &self.keyframes.len())
            .field("next_kf_id", &self.next_kf_id)
            .finish()
    }
}
