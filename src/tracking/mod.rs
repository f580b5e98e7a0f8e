//! Tracking-side types.
//!
//! Only the query [`Frame`] used for relocalization lives here; feature
//! extraction and pose tracking are handled by the surrounding pipeline.

pub mod tracking_frame;

pub use tracking_frame::Frame;
