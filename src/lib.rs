//! Bag-of-Words place recognition for visual(-inertial) SLAM.
//!
//! The [`KeyFrameDatabase`](atlas::KeyFrameDatabase) indexes keyframes by
//! visual word and retrieves loop closure and relocalization candidates,
//! grouped through the covisibility graph of the [`Map`](atlas::Map).
//!
//! ```
//! use std::sync::Arc;
//!
//! use rust_vslam_place_recognition::atlas::{KeyFrameDatabase, Map};
//! use rust_vslam_place_recognition::vocabulary::{BowVector, Vocabulary};
//!
//! struct DotProduct;
//!
//! impl Vocabulary for DotProduct {
//!     fn size(&self) -> usize {
//!         100
//!     }
//!
//!     fn score(&self, a: &BowVector, b: &BowVector) -> f64 {
//!         a.iter().filter_map(|(w, x)| b.get(w).map(|y| x * y)).sum()
//!     }
//! }
//!
//! let db = KeyFrameDatabase::new(Arc::new(DotProduct));
//! let mut map = Map::new();
//!
//! let bow: BowVector = [(1, 0.5), (2, 0.5)].into_iter().collect();
//! let old = map.create_keyframe(0, bow.clone());
//! db.add(map.get_keyframe(old).unwrap());
//!
//! let current = map.create_keyframe(1_000_000, bow);
//! let candidates = db.detect_loop_candidates(map.get_keyframe(current).unwrap(), &map, 0.1);
//! assert_eq!(candidates, vec![old]);
//! ```

pub mod atlas;
pub mod tracking;
pub mod vocabulary;
