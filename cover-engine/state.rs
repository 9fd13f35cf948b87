use std::sync::Arc;

use parking_lot::RwLock;
use crate::result::MatchResult;

/// A published result together with its publication number
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// 0 for the initial "no detection", incremented by every publish
    pub generation: u64,
    pub result: Arc<MatchResult>,
}

/// Single-slot holder of the most recent recognition result.
///
/// The label, confidence, box and metadata are replaced together, so a
/// reader never sees parts of two different results.
#[derive(Debug)]
pub struct ResultCell {
    slot: RwLock<Snapshot>,
}

impl Default for ResultCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCell {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Snapshot {
                generation: 0,
                result: Arc::new(MatchResult::none()),
            }),
        }
    }

    /// Replace the current result, returning the new generation
    pub fn publish(&self, result: MatchResult) -> u64 {
        let result = Arc::new(result);
        let mut slot = self.slot.write();
        slot.generation += 1;
        slot.result = result;
        slot.generation
    }

    pub fn latest(&self) -> Snapshot {
        self.slot.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.slot.read().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::BoundingBox;

    #[test]
    fn test_starts_with_no_detection() {
        let cell = ResultCell::new();
        let snapshot = cell.latest();
        assert_eq!(snapshot.generation, 0);
        assert!(!snapshot.result.is_detection());
    }

    #[test]
    fn test_publish_replaces_whole_result() {
        let cell = ResultCell::new();
        let detected = MatchResult::detected("a", 0.9, BoundingBox::centered_on(10.0, 10.0, 4, 4), 80, None);
        assert_eq!(cell.publish(detected.clone()), 1);
        assert_eq!(*cell.latest().result, detected);

        assert_eq!(cell.publish(MatchResult::none()), 2);
        let snapshot = cell.latest();
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.result.bounding_box(), BoundingBox::EMPTY);
    }

    #[test]
    fn test_concurrent_readers_see_consistent_snapshots() {
        let cell = Arc::new(ResultCell::new());
        let writer = {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for i in 0..500u32 {
                    let result = if i % 2 == 0 {
                        MatchResult::detected("even", 1.0, BoundingBox::centered_on(0.0, 0.0, 2, 2), 60, None)
                    } else {
                        MatchResult::none()
                    };
                    cell.publish(result);
                }
            })
        };
        for _ in 0..500 {
            let snapshot = cell.latest();
            let result = &snapshot.result;
            assert_eq!(result.is_detection(), !result.bounding_box().is_empty());
        }
        writer.join().unwrap();
        assert_eq!(cell.generation(), 500);
    }
}
