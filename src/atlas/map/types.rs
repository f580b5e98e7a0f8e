//! Core ID types for the Atlas map structures.

/// Unique identifier for a KeyFrame within a Map.
///
/// KeyFrameIds are assigned sequentially when KeyFrames are created.
/// They serve as lightweight handles for cross-referencing without
/// needing Arc/Rc: the KeyFrame database stores these handles in its
/// inverted file and resolves them against the owning [`Map`](super::Map)
/// only when it needs a keyframe's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyFrameId(pub u64);

impl KeyFrameId {
    /// Create a new KeyFrameId with the given value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for KeyFrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KF{}", self.0)
    }
}

/// Identifier of a tracked (non-key) Frame.
///
/// Frames are ephemeral: they are never inserted into the map, but they
/// can query the KeyFrame database for relocalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl FrameId {
    /// Create a new FrameId with the given value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyframe_id_equality() {
        let id1 = KeyFrameId::new(42);
        let id2 = KeyFrameId::new(42);
        let id3 = KeyFrameId::new(43);

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", KeyFrameId::new(7)), "KF7");
        assert_eq!(format!("{}", FrameId::new(123)), "F123");
    }

    #[test]
    fn test_id_as_hashmap_key() {
        use std::collections::HashMap;

        let mut map: HashMap<KeyFrameId, &str> = HashMap::new();
        map.insert(KeyFrameId::new(1), "first");
        map.insert(KeyFrameId::new(2), "second");

        assert_eq!(map.get(&KeyFrameId::new(1)), Some(&"first"));
        assert_eq!(map.get(&KeyFrameId::new(3)), None);
    }
}
