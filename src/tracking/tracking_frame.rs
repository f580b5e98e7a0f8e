//! Tracking `Frame` representation.
//!
//! A `Frame` is what the Tracker operates on between keyframes. When
//! tracking is lost it is the query handed to the KeyFrame database for
//! relocalization. Frames are never inserted into the map or the database,
//! so they carry no covisibility edges.

use crate::atlas::map::FrameId;
use crate::vocabulary::BowVector;

/// A tracked frame with its (optional) Bag-of-Words vector.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequential frame identifier.
    pub id: FrameId,

    /// Timestamp in nanoseconds.
    pub timestamp_ns: u64,

    /// BoW vector; computed lazily, only when relocalization is needed.
    pub bow_vector: Option<BowVector>,
}

impl Frame {
    /// Create a frame without a BoW vector.
    pub fn new(id: FrameId, timestamp_ns: u64) -> Self {
        Self {
            id,
            timestamp_ns,
            bow_vector: None,
        }
    }

    /// Create a frame with its BoW vector already computed.
    pub fn with_bow(id: FrameId, timestamp_ns: u64, bow: BowVector) -> Self {
        Self {
            id,
            timestamp_ns,
            bow_vector: Some(bow),
        }
    }

    /// Store the BoW vector computed for this frame.
    pub fn set_bow_vector(&mut self, bow: BowVector) {
        self.bow_vector = Some(bow);
    }

    /// Get a reference to the Bag-of-Words vector, if available.
    pub fn bow_vector(&self) -> Option<&BowVector> {
        self.bow_vector.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::test_support::uniform_bow;

    #[test]
    fn test_frame_bow() {
        let mut frame = Frame::new(FrameId::new(3), 42);
        assert!(frame.bow_vector().is_none());

        frame.set_bow_vector(uniform_bow(&[1, 2, 3]));
        assert_eq!(frame.bow_vector().map(|b| b.len()), Some(3));

        let other = Frame::with_bow(FrameId::new(4), 43, uniform_bow(&[7]));
        assert!(other.bow_vector().unwrap().contains_key(&7));
    }
}
