//! Size ranking shared by every report.

use crate::entry::{PurgeCandidate, ScanEntry};

/// Anything that can be ranked by size.
pub trait HasSize {
    /// Size in bytes used for ranking.
    fn size_bytes(&self) -> u64;
}

impl HasSize for ScanEntry {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

impl HasSize for PurgeCandidate {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Order items by size, largest first.
///
/// The sort is stable, so equal sizes keep their input order.
pub fn rank_by_size<T: HasSize>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by(|a, b| b.size_bytes().cmp(&a.size_bytes()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, size: u64) -> ScanEntry {
        ScanEntry::new(format!("/r/{name}"), name, size, false)
    }

    #[test]
    fn test_rank_descending() {
        let ranked = rank_by_size(vec![entry("a", 1), entry("b", 30), entry("c", 20)]);
        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);
    }

    #[test]
    fn test_rank_ties_keep_order() {
        let ranked = rank_by_size(vec![entry("x", 5), entry("y", 5), entry("z", 9)]);
        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["z", "x", "y"]);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_by_size(Vec::<ScanEntry>::new()).is_empty());
    }
}
