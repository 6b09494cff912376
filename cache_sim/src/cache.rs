use std::fmt;

use crate::geometry::Geometry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Line {
    pub valid: bool,
    pub tag: u64,
    /// logical time of the last hit or install. meaningless while `!valid`.
    pub stamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss,
    /// miss whose victim line held another block.
    MissEviction,
}

impl AccessResult {
    pub fn is_hit(self) -> bool {
        self == AccessResult::Hit
    }
    pub fn evicted(self) -> bool {
        self == AccessResult::MissEviction
    }
}

impl fmt::Display for AccessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessResult::Hit => "hit",
            AccessResult::Miss => "miss",
            AccessResult::MissEviction => "miss eviction",
        };
        f.write_str(s)
    }
}

/// set-associative cache with LRU replacement.
///
/// all `S * E` lines live in one vector; way `w` of set `s` is `lines[s * E + w]`.
pub struct Cache {
    geometry: Geometry,
    lines: Vec<Line>,
    clock: u64,
}

impl Cache {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            lines: vec![Line::default(); geometry.num_sets() * geometry.associativity()],
            clock: 0,
        }
    }
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }
    /// lines of `set`, in way order.
    pub fn set(&self, set: usize) -> &[Line] {
        let ways = self.geometry.associativity();
        &self.lines[set * ways..(set + 1) * ways]
    }
    fn set_mut(&mut self, set: usize) -> &mut [Line] {
        let ways = self.geometry.associativity();
        &mut self.lines[set * ways..(set + 1) * ways]
    }
    pub fn is_resident(&self, set: usize, tag: u64) -> bool {
        self.set(set).iter().any(|l| l.valid && l.tag == tag)
    }
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
    /// looks `tag` up in `set`, installing it on a miss.
    ///
    /// either way the line holding `tag` becomes the most recently used one.
    pub fn access(&mut self, set: usize, tag: u64) -> AccessResult {
        let now = self.tick();
        let lines = self.set_mut(set);
        if let Some(line) = lines.iter_mut().find(|l| l.valid && l.tag == tag) {
            line.stamp = now;
            return AccessResult::Hit;
        }
        let victim = Self::victim(lines);
        let line = &mut lines[victim];
        let result = if line.valid {
            AccessResult::MissEviction
        } else {
            AccessResult::Miss
        };
        *line = Line {
            valid: true,
            tag,
            stamp: now,
        };
        result
    }
    /// first invalid way, otherwise the way with the oldest stamp.
    fn victim(lines: &[Line]) -> usize {
        if let Some(i) = lines.iter().position(|l| !l.valid) {
            return i;
        }
        lines
            .iter()
            .enumerate()
            .min_by_key(|(_, l)| l.stamp)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(s: u32, e: usize, b: u32) -> Cache {
        Cache::new(Geometry::new(s, e, b).unwrap())
    }

    #[test]
    fn test_direct_mapped() {
        let mut c = cache(1, 1, 1);
        assert_eq!(c.access(0, 0), AccessResult::Miss);
        assert_eq!(c.access(0, 0), AccessResult::Hit);
        assert_eq!(c.access(1, 0), AccessResult::Miss);
        assert_eq!(c.access(0, 1), AccessResult::MissEviction);
        assert!(!c.is_resident(0, 0));
        assert!(c.is_resident(1, 0));
    }
    #[test]
    fn test_fills_invalid_ways_in_order() {
        let mut c = cache(1, 4, 1);
        for tag in 0..4 {
            assert_eq!(c.access(1, tag), AccessResult::Miss);
        }
        let tags: Vec<_> = c.set(1).iter().map(|l| l.tag).collect();
        assert_eq!(tags, vec![0, 1, 2, 3]);
        assert!(c.set(0).iter().all(|l| !l.valid));
    }
    #[test]
    fn test_evicts_least_recently_used() {
        let mut c = cache(1, 2, 1);
        c.access(0, 10);
        c.access(0, 11);
        // touching 10 makes 11 the LRU line
        assert!(c.access(0, 10).is_hit());
        assert!(c.access(0, 12).evicted());
        assert!(c.is_resident(0, 10));
        assert!(!c.is_resident(0, 11));
        assert!(c.is_resident(0, 12));
    }
    #[test]
    fn test_first_of_e_plus_one_distinct_tags_is_evicted() {
        for ways in 1..=8usize {
            let mut c = cache(2, ways, 3);
            for tag in 0..ways as u64 {
                assert_eq!(c.access(3, tag), AccessResult::Miss, "ways: {ways}");
            }
            assert_eq!(c.access(3, ways as u64), AccessResult::MissEviction);
            assert!(!c.is_resident(3, 0));
            assert!((1..=ways as u64).all(|t| c.is_resident(3, t)));
        }
    }
    #[test]
    fn test_no_duplicate_tags_in_a_set() {
        let mut c = cache(1, 4, 1);
        let pattern = [1u64, 2, 1, 3, 4, 5, 1, 2, 2, 6, 3, 1];
        for tag in pattern {
            c.access(0, tag);
            let mut valid: Vec<_> = c.set(0).iter().filter(|l| l.valid).map(|l| l.tag).collect();
            let n = valid.len();
            valid.sort_unstable();
            valid.dedup();
            assert_eq!(valid.len(), n);
        }
    }
    #[test]
    fn test_stamps_strictly_increase() {
        let mut c = cache(1, 3, 1);
        c.access(0, 1);
        c.access(0, 2);
        c.access(0, 3);
        c.access(0, 1);
        let mut stamps: Vec<_> = c.set(0).iter().map(|l| l.stamp).collect();
        stamps.sort_unstable();
        stamps.dedup();
        assert_eq!(stamps.len(), 3);
        let lru = c.set(0).iter().min_by_key(|l| l.stamp).unwrap();
        assert_eq!(lru.tag, 2);
    }
}
