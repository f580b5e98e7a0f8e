//! Atlas module - map data structures and the place recognition database.
//!
//! - [`map::KeyFrame`] - KeyFrames with BoW vector and covisibility edges
//! - [`map::Map`] - KeyFrame container maintaining the graph structures
//! - [`keyframe_db::KeyFrameDatabase`] - DBoW2-style inverted file used for
//!   loop detection and relocalization

pub mod config;
pub mod keyframe_db;
pub mod map;

// Re-export commonly used types
pub use config::KeyFrameDatabaseConfig;
pub use keyframe_db::{CovisibilityGraph, KeyFrameDatabase};
pub use map::{FrameId, KeyFrame, KeyFrameId, Map};
