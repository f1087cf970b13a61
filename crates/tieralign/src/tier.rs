//! Single annotation tiers.
//!
//! A [`Tier`] wraps a sorted [`NodeList`] with a name, a tag, and the tier
//! bookkeeping nodes carry (`tier_name`, `tier_index`). Tiers are built
//! from the flat entry shapes an external TextGrid reader produces and
//! export back to them.

use log::warn;

use tieralign_core::entry::{Interval, Point, Temporal, times_close};
use tieralign_core::hierarchy::{Hierarchy, TagId, TagKind};
use tieralign_core::identifier::Id;

use crate::arena::{Arena, NodeId};
use crate::error::{RelationError, Result};
use crate::list::NodeList;

/// A named, sorted tier of interval or point nodes.
///
/// # Examples
///
/// ```
/// use tieralign::{Arena, Tier};
/// use tieralign_core::entry::Interval;
/// use tieralign_core::hierarchy::{Hierarchy, TagKind};
///
/// let mut hierarchy = Hierarchy::new();
/// let word = hierarchy.register("Word", TagKind::Interval);
///
/// let mut arena = Arena::new();
/// let tier = Tier::from_intervals(
///     &mut arena,
///     &hierarchy,
///     word,
///     "Mary-words",
///     &[Interval::new(0.0, 10.0, "the"), Interval::new(10.0, 25.0, "dog")],
/// )
/// .unwrap();
///
/// assert_eq!(tier.get_index_at_time(&arena, 12.0), Some(1));
/// ```
#[derive(Debug)]
pub struct Tier {
    name: Id,
    tag: TagId,
    kind: TagKind,
    entries: NodeList,
}

impl Tier {
    /// Builds an interval tier from raw entries, sorted by start time.
    ///
    /// # Errors
    ///
    /// Fails with [`RelationError::KindMismatch`] when `tag` is not an
    /// interval tag.
    pub fn from_intervals(
        arena: &mut Arena,
        h: &Hierarchy,
        tag: TagId,
        name: &str,
        entries: &[Interval],
    ) -> Result<Self> {
        if h.kind(tag) != TagKind::Interval {
            return Err(RelationError::KindMismatch {
                tag: h.name(tag).to_string(),
                expected: h.kind(tag),
            });
        }
        let mut tier = Self {
            name: Id::new(name),
            tag,
            kind: TagKind::Interval,
            entries: NodeList::for_tag(tag, h.name(tag)),
        };
        for entry in entries {
            let id = arena.alloc_interval(h, tag, entry);
            tier.entries.append(arena, id)?;
        }
        tier.rebuild(arena);
        Ok(tier)
    }

    /// Builds a point tier from raw entries, sorted by time.
    ///
    /// # Errors
    ///
    /// Fails with [`RelationError::KindMismatch`] when `tag` is not a
    /// point tag.
    pub fn from_points(
        arena: &mut Arena,
        h: &Hierarchy,
        tag: TagId,
        name: &str,
        entries: &[Point],
    ) -> Result<Self> {
        if h.kind(tag) != TagKind::Point {
            return Err(RelationError::KindMismatch {
                tag: h.name(tag).to_string(),
                expected: h.kind(tag),
            });
        }
        let mut tier = Self {
            name: Id::new(name),
            tag,
            kind: TagKind::Point,
            entries: NodeList::for_tag(tag, h.name(tag)),
        };
        for entry in entries {
            let id = arena.alloc_point(h, tag, entry);
            tier.entries.append(arena, id)?;
        }
        tier.rebuild(arena);
        Ok(tier)
    }

    /// Builds a tier from already allocated nodes.
    ///
    /// # Errors
    ///
    /// Fails when any node's tag differs from `tag`, or when a node is a
    /// boundary sentinel.
    pub fn from_nodes(
        arena: &mut Arena,
        h: &Hierarchy,
        tag: TagId,
        name: &str,
        nodes: &[NodeId],
    ) -> Result<Self> {
        let mut tier = Self {
            name: Id::new(name),
            tag,
            kind: h.kind(tag),
            entries: NodeList::for_tag(tag, h.name(tag)),
        };
        for &id in nodes {
            tier.entries.append(arena, id)?;
        }
        tier.rebuild(arena);
        Ok(tier)
    }

    /// The tier's name.
    pub fn name(&self) -> Id {
        self.name
    }

    /// The tag shared by every entry.
    pub fn tag(&self) -> TagId {
        self.tag
    }

    /// Whether this is an interval or point tier.
    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// The underlying sorted entry list.
    pub fn entries(&self) -> &NodeList {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tier has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.entries.get(index)
    }

    /// The earliest entry.
    pub fn first(&self) -> Option<NodeId> {
        self.entries.first()
    }

    /// The latest entry.
    pub fn last(&self) -> Option<NodeId> {
        self.entries.last()
    }

    /// Iterates over entries in temporal order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter()
    }

    /// Entry start times, in order.
    pub fn starts(&self, arena: &Arena) -> Vec<f64> {
        self.entries.starts(arena)
    }

    /// Entry end times, in order.
    pub fn ends(&self, arena: &Arena) -> Vec<f64> {
        self.entries.ends(arena)
    }

    /// Entry labels, in order.
    pub fn labels(&self, arena: &Arena) -> Vec<String> {
        self.entries.labels(arena)
    }

    /// The earliest start, or `None` for an empty tier.
    pub fn xmin(&self, arena: &Arena) -> Option<f64> {
        self.entries.first().map(|id| arena.start_of(id))
    }

    /// The latest end, or `None` for an empty tier.
    pub fn xmax(&self, arena: &Arena) -> Option<f64> {
        self.entries.max_end(arena)
    }

    /// Re-sorts the entries, refreshes every node's tier bookkeeping, and,
    /// for a standalone tier, relinks the tier-wide precedence chain.
    ///
    /// Entries with parents keep the precedence their parents derived; a
    /// tier-wide chain would cut across containment boundaries.
    pub fn rebuild(&mut self, arena: &mut Arena) {
        self.entries.sort(arena);
        let ids: Vec<NodeId> = self.entries.ids().to_vec();
        for (index, &id) in ids.iter().enumerate() {
            arena.set_tier(id, Some(self.name), Some(index));
        }

        let standalone = ids.iter().all(|&id| arena.node(id).parent().is_none());
        if !standalone {
            return;
        }
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return;
        };
        for pair in ids.windows(2) {
            // Entries share a tag, so the checked setters cannot fail.
            let _ = arena.set_fol(pair[0], pair[1]);
        }
        arena.set_initial(first);
        arena.set_final(last);
    }

    /// Finds the entry covering time `t`.
    ///
    /// For interval tiers: an exact boundary tie (under tolerance) resolves
    /// to the interval starting at `t`; the final end is inclusive; a time
    /// outside the tier logs a warning and returns `None`. For point tiers
    /// the nearest point always wins.
    pub fn get_index_at_time(&self, arena: &Arena, t: f64) -> Option<usize> {
        let starts = self.entries.starts(arena);
        if starts.is_empty() {
            warn!(tier = self.name.resolve().as_str(), time = t; "lookup in an empty tier");
            return None;
        }
        let at = starts.partition_point(|&start| start < t);

        if self.kind == TagKind::Point {
            // Nearest of the two neighbors.
            if at == 0 {
                return Some(0);
            }
            if at == starts.len() {
                return Some(starts.len() - 1);
            }
            let left = t - starts[at - 1];
            let right = starts[at] - t;
            return Some(if left <= right { at - 1 } else { at });
        }

        if at < starts.len() && times_close(starts[at], t) {
            return Some(at);
        }
        if at == 0 {
            warn!(tier = self.name.resolve().as_str(), time = t; "time precedes the tier");
            return None;
        }
        let prev = at - 1;
        let prev_end = arena.end_of(self.entries.ids()[prev]);
        if t < prev_end || times_close(t, prev_end) {
            Some(prev)
        } else {
            warn!(tier = self.name.resolve().as_str(), time = t; "time falls outside every interval");
            None
        }
    }

    /// Appends a node and rebuilds.
    ///
    /// # Errors
    ///
    /// Fails on tag mismatch or a boundary sentinel.
    pub fn append(&mut self, arena: &mut Arena, node: NodeId) -> Result<()> {
        self.entries.append(arena, node)?;
        self.rebuild(arena);
        Ok(())
    }

    /// Removes a node (detaching it from any parent) and rebuilds. Silent
    /// if the node is not an entry.
    pub fn pop(&mut self, arena: &mut Arena, node: NodeId) {
        self.entries.remove(arena, node);
        arena.set_tier(node, None, None);
        self.rebuild(arena);
    }

    /// Fuses the entry at `index` with the entry following it, dropping
    /// the fused-away node from the tier.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range index, at the tier edge, or on a point
    /// tier.
    pub fn fuse_rightwards(
        &mut self,
        arena: &mut Arena,
        index: usize,
        label_fn: impl Fn(&str, &str) -> String,
    ) -> Result<()> {
        let node = self
            .entries
            .get(index)
            .ok_or(RelationError::IndexOutOfRange(index))?;
        let fusee = arena.fuse_following(node, label_fn)?;
        self.entries.remove_id(fusee);
        self.rebuild(arena);
        Ok(())
    }

    /// Fuses the entry at `index` with the entry preceding it. Symmetric
    /// to [`Tier::fuse_rightwards`].
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range index, at the tier edge, or on a point
    /// tier.
    pub fn fuse_leftwards(
        &mut self,
        arena: &mut Arena,
        index: usize,
        label_fn: impl Fn(&str, &str) -> String,
    ) -> Result<()> {
        let node = self
            .entries
            .get(index)
            .ok_or(RelationError::IndexOutOfRange(index))?;
        let fusee = arena.fuse_preceding(node, label_fn)?;
        self.entries.remove_id(fusee);
        self.rebuild(arena);
        Ok(())
    }

    /// Fills gaps between consecutive entries with empty-label nodes so
    /// the tier tiles its span snugly. Idempotent; point tiers are left
    /// untouched.
    pub fn cleanup(&mut self, arena: &mut Arena, h: &Hierarchy) {
        if self.kind != TagKind::Interval {
            return;
        }
        let ids: Vec<NodeId> = self.entries.ids().to_vec();
        let mut fillers = Vec::new();
        for pair in ids.windows(2) {
            let (left_end, right_start) = (arena.end_of(pair[0]), arena.start_of(pair[1]));
            if !times_close(left_end, right_start) && left_end < right_start {
                fillers.push(Interval::new(left_end, right_start, ""));
            }
        }
        if fillers.is_empty() {
            return;
        }
        for filler in &fillers {
            let id = arena.alloc_interval(h, self.tag, filler);
            self.entries.insert_sorted(arena, id);
        }
        self.rebuild(arena);
    }

    /// Translates every entry by `increment`.
    pub fn shift(&mut self, arena: &mut Arena, increment: f64) {
        for id in self.entries.ids().to_vec() {
            arena.shift(id, increment);
        }
    }

    /// Exports interval entries back to the flat output shape.
    pub fn to_intervals(&self, arena: &Arena) -> Vec<Interval> {
        self.entries
            .iter()
            .filter_map(|id| match arena.node(id).temporal() {
                Some(Temporal::Interval { start, end }) => Some(Interval {
                    start,
                    end,
                    label: arena.node(id).label().to_string(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Exports point entries back to the flat output shape.
    pub fn to_points(&self, arena: &Arena) -> Vec<Point> {
        self.entries
            .iter()
            .filter_map(|id| match arena.node(id).temporal() {
                Some(Temporal::Point { time }) => Some(Point {
                    time,
                    label: arena.node(id).label().to_string(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn word_tier(arena: &mut Arena) -> (Hierarchy, TagId, Tier) {
        let mut h = Hierarchy::new();
        let word = h.register("Word", TagKind::Interval);
        let tier = Tier::from_intervals(
            arena,
            &h,
            word,
            "words",
            &[
                Interval::new(10.0, 25.0, "dog"),
                Interval::new(0.0, 10.0, "the"),
            ],
        )
        .unwrap();
        (h, word, tier)
    }

    #[test]
    fn test_construction_sorts_and_indexes() {
        let mut arena = Arena::new();
        let (_, _, tier) = word_tier(&mut arena);

        assert_eq!(tier.labels(&arena), vec!["the", "dog"]);
        let the = tier.get(0).unwrap();
        let dog = tier.get(1).unwrap();
        assert_eq!(arena.node(the).tier_index(), Some(0));
        assert_eq!(arena.node(dog).tier_index(), Some(1));
        assert_eq!(arena.node(the).tier_name(), Some(tier.name()));
        // Standalone tier precedence spans the tier with sentinels at the
        // ends.
        assert_eq!(arena.node(the).fol(), Some(dog));
        assert!(arena.node(arena.node(the).prev().unwrap()).is_boundary());
        assert!(arena.node(arena.node(dog).fol().unwrap()).is_boundary());
    }

    #[test]
    fn test_kind_checked_at_construction() {
        let mut arena = Arena::new();
        let mut h = Hierarchy::new();
        let tone = h.register("ToBI", TagKind::Point);

        assert!(matches!(
            Tier::from_intervals(&mut arena, &h, tone, "tones", &[]),
            Err(RelationError::KindMismatch { .. })
        ));
        assert!(Tier::from_points(&mut arena, &h, tone, "tones", &[]).is_ok());
    }

    #[test]
    fn test_get_index_at_time_intervals() {
        let mut arena = Arena::new();
        let (_, _, tier) = word_tier(&mut arena);

        assert_eq!(tier.get_index_at_time(&arena, 12.0), Some(1));
        assert_eq!(tier.get_index_at_time(&arena, 3.0), Some(0));
        // Exact boundaries resolve to the interval starting there.
        assert_eq!(tier.get_index_at_time(&arena, 10.0), Some(1));
        assert_eq!(tier.get_index_at_time(&arena, 0.0), Some(0));
        // The final end is inclusive.
        assert_eq!(tier.get_index_at_time(&arena, 25.0), Some(1));
        // Out of range on either side misses.
        assert_eq!(tier.get_index_at_time(&arena, -1.0), None);
        assert_eq!(tier.get_index_at_time(&arena, 30.0), None);
    }

    #[test]
    fn test_get_index_at_time_points() {
        let mut arena = Arena::new();
        let mut h = Hierarchy::new();
        let tone = h.register("ToBI", TagKind::Point);
        let tier = Tier::from_points(
            &mut arena,
            &h,
            tone,
            "tones",
            &[Point::new(2.0, "H*"), Point::new(8.0, "L-L%")],
        )
        .unwrap();

        assert_eq!(tier.get_index_at_time(&arena, 0.0), Some(0));
        assert_eq!(tier.get_index_at_time(&arena, 4.0), Some(0));
        assert_eq!(tier.get_index_at_time(&arena, 7.0), Some(1));
        assert_eq!(tier.get_index_at_time(&arena, 99.0), Some(1));
    }

    #[test]
    fn test_append_and_pop_reindex() {
        let mut arena = Arena::new();
        let (h, word, mut tier) = word_tier(&mut arena);

        let cat = arena.alloc_interval(&h, word, &Interval::new(25.0, 30.0, "cat"));
        tier.append(&mut arena, cat).unwrap();
        assert_eq!(tier.labels(&arena), vec!["the", "dog", "cat"]);
        assert_eq!(arena.node(cat).tier_index(), Some(2));

        let the = tier.get(0).unwrap();
        tier.pop(&mut arena, the);
        assert_eq!(tier.labels(&arena), vec!["dog", "cat"]);
        assert_eq!(arena.node(tier.get(0).unwrap()).tier_index(), Some(0));
        assert_eq!(arena.node(the).tier_name(), None);
    }

    #[test]
    fn test_fuse_rightwards() {
        let mut arena = Arena::new();
        let (_, _, mut tier) = word_tier(&mut arena);

        tier.fuse_rightwards(&mut arena, 0, |a, b| format!("{a} {b}"))
            .unwrap();

        assert_eq!(tier.labels(&arena), vec!["the dog"]);
        assert_eq!(tier.len(), 1);
        assert_approx_eq!(f64, tier.xmax(&arena).unwrap(), 25.0);

        // Fusing past the edge fails.
        assert!(matches!(
            tier.fuse_rightwards(&mut arena, 0, |a, b| format!("{a} {b}")),
            Err(RelationError::FuseAtEdge(_))
        ));
        assert!(matches!(
            tier.fuse_rightwards(&mut arena, 7, |a, b| format!("{a} {b}")),
            Err(RelationError::IndexOutOfRange(7))
        ));
    }

    #[test]
    fn test_cleanup_fills_gaps_idempotently() {
        let mut arena = Arena::new();
        let mut h = Hierarchy::new();
        let word = h.register("Word", TagKind::Interval);
        let mut tier = Tier::from_intervals(
            &mut arena,
            &h,
            word,
            "words",
            &[
                Interval::new(0.0, 4.0, "the"),
                Interval::new(5.0, 10.0, "dog"),
            ],
        )
        .unwrap();

        tier.cleanup(&mut arena, &h);
        assert_eq!(tier.labels(&arena), vec!["the", "", "dog"]);
        assert_approx_eq!(f64, arena.start_of(tier.get(1).unwrap()), 4.0);
        assert_approx_eq!(f64, arena.end_of(tier.get(1).unwrap()), 5.0);

        tier.cleanup(&mut arena, &h);
        assert_eq!(tier.len(), 3);
    }

    #[test]
    fn test_export_round_trip() {
        let mut arena = Arena::new();
        let (_, _, tier) = word_tier(&mut arena);

        let exported = tier.to_intervals(&arena);
        assert_eq!(
            exported,
            vec![
                Interval::new(0.0, 10.0, "the"),
                Interval::new(10.0, 25.0, "dog"),
            ]
        );
        assert!(tier.to_points(&arena).is_empty());
    }

    #[test]
    fn test_shift() {
        let mut arena = Arena::new();
        let (_, _, mut tier) = word_tier(&mut arena);

        tier.shift(&mut arena, 5.0);

        assert_approx_eq!(f64, tier.xmin(&arena).unwrap(), 5.0);
        assert_approx_eq!(f64, tier.xmax(&arena).unwrap(), 30.0);
    }
}
