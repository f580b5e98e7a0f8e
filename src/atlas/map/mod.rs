//! Map module - KeyFrames and the graphs connecting them.
//!
//! This module contains:
//! - [`KeyFrame`] - Selected frames with a BoW vector and graph links
//! - [`Map`] - Container managing KeyFrames and their relationships
//!
//! KeyFrames are linked by the **covisibility graph**: symmetric edges
//! weighted by shared MapPoint count.
//!
//! # Example
//!
//! ```
//! use rust_vslam_place_recognition::atlas::map::Map;
//! use rust_vslam_place_recognition::vocabulary::BowVector;
//!
//! let mut map = Map::new();
//!
//! let bow: BowVector = [(3, 0.5), (7, 0.5)].into_iter().collect();
//! let kf1 = map.create_keyframe(0, bow.clone());
//! let kf2 = map.create_keyframe(1_000_000, bow);
//!
//! // 42 MapPoints seen by both keyframes
//! map.update_covisibility(kf1, kf2, 42);
//! assert_eq!(map.get_keyframe(kf1).unwrap().best_covisibles(10), vec![kf2]);
//! ```

pub mod keyframe;
pub mod map;
pub mod types;

pub use keyframe::KeyFrame;
pub use map::Map;
pub use types::{FrameId, KeyFrameId};
