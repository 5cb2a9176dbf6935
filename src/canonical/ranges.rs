/// Inclusive `[start, end]` byte offsets into the query text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start {start} past end {end}");
        Self { start, end }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Zones of the query text a pass must not rewrite.
///
/// Ranges are kept sorted by `start` and never overlap; inserting a range
/// that touches existing ones merges them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    ranges: Vec<Range>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ignore_positions<I>(&mut self, ranges: I)
    where
        I: IntoIterator<Item = Range>,
    {
        for range in ranges {
            self.insert(range);
        }
    }

    fn insert(&mut self, mut range: Range) {
        // First range that could overlap or follow the new one.
        let idx = self.ranges.partition_point(|r| r.end < range.start);
        while idx < self.ranges.len() && self.ranges[idx].start <= range.end {
            let existing = self.ranges.remove(idx);
            range.start = range.start.min(existing.start);
            range.end = range.end.max(existing.end);
        }
        self.ranges.insert(idx, range);
    }

    /// Skip past the ignored range covering `position`, if any.
    ///
    /// Adjacent ranges are chained, so the returned offset is never itself
    /// inside an ignored range.
    pub fn jump_ignore(&self, position: usize) -> usize {
        let mut position = position;
        while let Some(range) = self.range_at(position) {
            position = range.end + 1;
        }
        position
    }

    pub fn range_at(&self, position: usize) -> Option<&Range> {
        let idx = self.ranges.partition_point(|r| r.end < position);
        self.ranges.get(idx).filter(|r| r.contains(position))
    }

    /// First ignored range starting at or after `position`.
    pub fn next_after(&self, position: usize) -> Option<&Range> {
        let idx = self.ranges.partition_point(|r| r.start < position);
        self.ranges.get(idx)
    }

    /// Shift every range starting at or after `edit_position` by `delta`.
    ///
    /// Must run after every edit that changes the text length; ranges
    /// entirely before the edit keep their offsets.
    pub fn update_positions(&mut self, edit_position: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        for range in self.ranges.iter_mut().filter(|r| r.start >= edit_position) {
            range.start = range.start.saturating_add_signed(delta);
            range.end = range.end.saturating_add_signed(delta);
        }
    }

    /// Drop the ranges lying entirely inside `cut`.
    pub fn remove_within(&mut self, cut: Range) {
        self.ranges.retain(|r| !(cut.start <= r.start && r.end <= cut.end));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Range> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ranges: &[(usize, usize)]) -> IgnoreSet {
        let mut ignore = IgnoreSet::new();
        ignore.add_ignore_positions(ranges.iter().map(|&(s, e)| Range::new(s, e)));
        ignore
    }

    fn pairs(ignore: &IgnoreSet) -> Vec<(usize, usize)> {
        ignore.iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn test_add_keeps_order() {
        let ignore = set(&[(20, 25), (3, 4), (10, 12)]);
        assert_eq!(pairs(&ignore), vec![(3, 4), (10, 12), (20, 25)]);
    }

    #[test]
    fn test_add_merges_overlapping() {
        let ignore = set(&[(3, 8), (6, 12), (20, 21), (0, 3)]);
        assert_eq!(pairs(&ignore), vec![(0, 12), (20, 21)]);
    }

    #[test]
    fn test_jump_ignore() {
        let ignore = set(&[(3, 5), (9, 9)]);
        assert_eq!(ignore.jump_ignore(0), 0);
        assert_eq!(ignore.jump_ignore(3), 6);
        assert_eq!(ignore.jump_ignore(5), 6);
        assert_eq!(ignore.jump_ignore(6), 6);
        assert_eq!(ignore.jump_ignore(9), 10);
    }

    #[test]
    fn test_jump_ignore_chains_adjacent_ranges() {
        let mut ignore = IgnoreSet::new();
        assert!(ignore.is_empty());
        // Adjacent, not overlapping: stored separately.
        ignore.add_ignore_positions([Range::new(2, 4), Range::new(5, 7)]);
        assert_eq!(ignore.len(), 2);
        assert_eq!(ignore.jump_ignore(3), 8);
    }

    #[test]
    fn test_update_positions_shrink() {
        let mut ignore = set(&[(2, 3), (10, 14), (20, 20)]);
        ignore.update_positions(6, -4);
        assert_eq!(pairs(&ignore), vec![(2, 3), (6, 10), (16, 16)]);
    }

    #[test]
    fn test_update_positions_grow() {
        let mut ignore = set(&[(2, 3), (10, 14)]);
        ignore.update_positions(10, 3);
        assert_eq!(pairs(&ignore), vec![(2, 3), (13, 17)]);
    }

    #[test]
    fn test_remove_within() {
        let mut ignore = set(&[(2, 3), (6, 7), (9, 9), (12, 14)]);
        ignore.remove_within(Range::new(5, 12));
        assert_eq!(pairs(&ignore), vec![(2, 3), (12, 14)]);
    }

    #[test]
    fn test_next_after() {
        let ignore = set(&[(2, 3), (10, 14)]);
        assert_eq!(ignore.next_after(0), Some(&Range::new(2, 3)));
        assert_eq!(ignore.next_after(3), Some(&Range::new(10, 14)));
        assert_eq!(ignore.next_after(11), None);
    }
}
