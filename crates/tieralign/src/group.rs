//! Tier groups and the alignment engine.
//!
//! A [`TierGroup`] holds the tiers of one speaker arranged top-to-bottom
//! along their tag chain, with every upper entry's children aligned to the
//! lower entries its span covers. Alignment is a binary-search sweep over
//! the lower tier's starts and ends, so a group over `n` nodes assembles in
//! `O(n log n)`.

use indexmap::IndexMap;
use log::{debug, warn};

use tieralign_core::entry::{Interval, Temporal, times_close};
use tieralign_core::hierarchy::{Hierarchy, TagId, TagKind};
use tieralign_core::identifier::Id;

use crate::arena::{Arena, NodeId};
use crate::error::{RelationError, Result};
use crate::tier::Tier;

/// Where an interleaved tier lands relative to an existing tag.
#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    /// Directly above the tier carrying this tag.
    Above(TagId),
    /// Directly below the tier carrying this tag.
    Below(TagId),
}

/// Which adjacent tier an interleaved tier copies its timing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingFrom {
    /// Copy entry boundaries from the tier above the new one.
    Above,
    /// Copy entry boundaries from the tier below the new one.
    Below,
}

/// A speaker's tiers, arranged and aligned along one tag chain.
///
/// # Examples
///
/// ```
/// use tieralign::{Arena, Tier, TierGroup};
/// use tieralign_core::chain::{ChainConfig, build_chain};
/// use tieralign_core::entry::Interval;
/// use tieralign_core::hierarchy::Hierarchy;
///
/// let mut hierarchy = Hierarchy::new();
/// let tags = build_chain(&mut hierarchy, &["Word", "Phone"], &ChainConfig::default())
///     .unwrap();
///
/// let mut arena = Arena::new();
/// let words = Tier::from_intervals(
///     &mut arena,
///     &hierarchy,
///     tags[0],
///     "words",
///     &[Interval::new(0.0, 10.0, "the")],
/// )
/// .unwrap();
/// let phones = Tier::from_intervals(
///     &mut arena,
///     &hierarchy,
///     tags[1],
///     "phones",
///     &[Interval::new(0.0, 5.0, "DH"), Interval::new(5.0, 10.0, "AH0")],
/// )
/// .unwrap();
///
/// let group = TierGroup::new(&mut arena, &hierarchy, vec![phones, words]).unwrap();
/// assert_eq!(group.get(0).unwrap().name(), "words");
/// ```
#[derive(Debug)]
pub struct TierGroup {
    tiers: Vec<Tier>,
    name_index: IndexMap<Id, usize>,
}

impl TierGroup {
    /// Arranges `tiers` top-to-bottom along their tag chain and aligns
    /// every adjacent pair. Input order does not matter.
    ///
    /// # Errors
    ///
    /// Fails with [`RelationError::EmptyGroup`] for no tiers and
    /// [`RelationError::BrokenChain`] when the tags do not form a single
    /// top-to-bottom chain (duplicate tags included).
    pub fn new(arena: &mut Arena, h: &Hierarchy, tiers: Vec<Tier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(RelationError::EmptyGroup);
        }
        let arranged = arrange(h, tiers)?;
        let name_index = arranged
            .iter()
            .enumerate()
            .map(|(index, tier)| (tier.name(), index))
            .collect();
        let mut group = Self {
            tiers: arranged,
            name_index,
        };
        group.align(arena, h)?;
        debug!(tiers = group.tiers.len(); "Assembled tier group");
        Ok(group)
    }

    /// Number of tiers, top to bottom.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether the group holds no tiers. Construction rejects this, so a
    /// live group always returns `false`.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The tiers, top to bottom.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// The tier at `level`, if in range.
    pub fn get(&self, level: usize) -> Option<&Tier> {
        self.tiers.get(level)
    }

    /// Iterates over the tiers, top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    /// Looks up a tier by name. A miss is advisory: `warn!` + `None`.
    pub fn tier_by_name(&self, name: &str) -> Option<&Tier> {
        match self.name_index.get(&Id::new(name)) {
            Some(&level) => self.tiers.get(level),
            None => {
                warn!(name; "no tier with this name");
                None
            }
        }
    }

    /// The entry index covering time `t` on every tier, top to bottom.
    pub fn get_indexes_at_time(&self, arena: &Arena, t: f64) -> Vec<Option<usize>> {
        self.tiers
            .iter()
            .map(|tier| tier.get_index_at_time(arena, t))
            .collect()
    }

    /// The earliest start across all tiers.
    pub fn xmin(&self, arena: &Arena) -> Option<f64> {
        self.tiers
            .iter()
            .filter_map(|tier| tier.xmin(arena))
            .min_by(f64::total_cmp)
    }

    /// The latest end across all tiers.
    pub fn xmax(&self, arena: &Arena) -> Option<f64> {
        self.tiers
            .iter()
            .filter_map(|tier| tier.xmax(arena))
            .max_by(f64::total_cmp)
    }

    /// Renders the tag chain for debugging, one tier per line.
    pub fn show_structure(&self, h: &Hierarchy) -> String {
        let mut out = String::new();
        for (level, tier) in self.tiers.iter().enumerate() {
            for _ in 0..level {
                out.push_str("  ");
            }
            if level > 0 {
                out.push_str("└ ");
            }
            out.push_str(&format!("{} ({})\n", h.name(tier.tag()), tier.name()));
        }
        out
    }

    /// Aligns every adjacent tier pair: each upper entry adopts the lower
    /// entries its span covers, then gets validated (warnings only).
    pub fn align(&mut self, arena: &mut Arena, h: &Hierarchy) -> Result<()> {
        for level in 0..self.tiers.len().saturating_sub(1) {
            self.align_pair(arena, h, level)?;
        }
        Ok(())
    }

    fn align_pair(&mut self, arena: &mut Arena, h: &Hierarchy, level: usize) -> Result<()> {
        let upper_ids: Vec<NodeId> = self.tiers[level].entries().ids().to_vec();
        let lower = &self.tiers[level + 1];
        let lower_ids: Vec<NodeId> = lower.entries().ids().to_vec();
        let lower_name = lower.name();
        let lower_starts = lower.starts(arena);
        let lower_ends = lower.ends(arena);

        // Ranges handed to consecutive upper entries must abut; a gap
        // means a lower entry belongs to no upper entry.
        let mut prev_hi: Option<usize> = None;
        let mut warned = false;
        for upper in upper_ids {
            let Some(Temporal::Interval { start, end }) = arena.node(upper).temporal() else {
                continue;
            };
            let lo = lower_starts
                .partition_point(|&s| s < start && !times_close(s, start));
            let hi = lower_ends
                .partition_point(|&e| e < end || times_close(e, end));
            if !warned && prev_hi.is_some_and(|prev| prev != lo) {
                warn!(
                    tier = lower_name.resolve().as_str();
                    "tier entries are not covered by the tier above"
                );
                warned = true;
            }
            prev_hi = Some(hi);
            arena.set_children(h, upper, &lower_ids[lo..hi])?;
            let _snug = arena.validate(upper);
        }
        Ok(())
    }

    /// Appends `node` to the tier at `level`, cascading any populated
    /// relationships: the node's children (transitively) join the tiers
    /// below, its ancestors the tiers above.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range level or any tag mismatch along the way.
    pub fn append(&mut self, arena: &mut Arena, level: usize, node: NodeId) -> Result<()> {
        let tier = self
            .tiers
            .get_mut(level)
            .ok_or(RelationError::IndexOutOfRange(level))?;
        tier.append(arena, node)?;

        let mut frontier = vec![node];
        let mut depth = level;
        while depth + 1 < self.tiers.len() {
            let mut next = Vec::new();
            for &member in &frontier {
                next.extend(arena.node(member).children().iter());
            }
            if next.is_empty() {
                break;
            }
            let lower = &mut self.tiers[depth + 1];
            for &child in &next {
                if !lower.entries().contains(child) {
                    lower.append(arena, child)?;
                }
            }
            frontier = next;
            depth += 1;
        }

        let mut current = node;
        let mut depth = level;
        while depth > 0 {
            let Some(parent) = arena.node(current).parent() else {
                break;
            };
            let upper = &mut self.tiers[depth - 1];
            if !upper.entries().contains(parent) {
                upper.append(arena, parent)?;
            }
            current = parent;
            depth -= 1;
        }
        Ok(())
    }

    /// Removes `node` from the tier at `level`, detaching it from its
    /// parent. Its own children are left in place on the tiers below.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range level.
    pub fn pop(&mut self, arena: &mut Arena, level: usize, node: NodeId) -> Result<()> {
        let tier = self
            .tiers
            .get_mut(level)
            .ok_or(RelationError::IndexOutOfRange(level))?;
        tier.pop(arena, node);
        Ok(())
    }

    /// Restores snug tiling across the whole group: per-tier gap filling,
    /// then empty-label parents projected up for lower spans with no entry
    /// one level above, then a full re-alignment. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails only on tag mismatches while re-aligning, which a well-formed
    /// group cannot produce.
    pub fn cleanup(&mut self, arena: &mut Arena, h: &Hierarchy) -> Result<()> {
        for tier in &mut self.tiers {
            tier.cleanup(arena, h);
        }
        for level in (0..self.tiers.len().saturating_sub(1)).rev() {
            self.project_up(arena, h, level)?;
        }
        self.align(arena, h)
    }

    fn project_up(&mut self, arena: &mut Arena, h: &Hierarchy, level: usize) -> Result<()> {
        let upper_tag = self.tiers[level].tag();
        let upper_starts = self.tiers[level].starts(arena);
        let upper_ends = self.tiers[level].ends(arena);
        let lower_ids: Vec<NodeId> = self.tiers[level + 1].entries().ids().to_vec();

        let covered = |start: f64, end: f64| {
            upper_starts
                .iter()
                .zip(&upper_ends)
                .any(|(&ustart, &uend)| {
                    (ustart < start || times_close(ustart, start))
                        && (end < uend || times_close(end, uend))
                })
        };

        // Group consecutive uncovered lower entries into runs and mint one
        // empty parent per run.
        let mut run: Option<(f64, f64)> = None;
        let mut fillers = Vec::new();
        for &id in &lower_ids {
            let (start, end) = (arena.start_of(id), arena.end_of(id));
            if covered(start, end) {
                if let Some(span) = run.take() {
                    fillers.push(span);
                }
            } else {
                run = Some(match run {
                    Some((run_start, _)) => (run_start, end),
                    None => (start, end),
                });
            }
        }
        if let Some(span) = run {
            fillers.push(span);
        }

        for (start, end) in fillers {
            let filler = arena.alloc_interval(h, upper_tag, &Interval::new(start, end, ""));
            self.tiers[level].append(arena, filler)?;
        }
        Ok(())
    }

    /// Translates every entry on every tier by `increment`.
    pub fn shift(&mut self, arena: &mut Arena, increment: f64) {
        for tier in &mut self.tiers {
            tier.shift(arena, increment);
        }
    }

    /// Splices another group onto the end of this one, shifting it by this
    /// group's latest end first.
    ///
    /// # Errors
    ///
    /// Fails with [`RelationError::ChainMismatch`] unless the two groups
    /// carry the same tags level for level.
    pub fn concat(&mut self, arena: &mut Arena, h: &Hierarchy, other: TierGroup) -> Result<()> {
        if self.tiers.len() != other.tiers.len() {
            return Err(RelationError::ChainMismatch);
        }
        for (ours, theirs) in self.tiers.iter().zip(&other.tiers) {
            if ours.tag() != theirs.tag() {
                return Err(RelationError::ChainMismatch);
            }
        }

        let offset = self.xmax(arena).unwrap_or(0.0);
        for (level, mut incoming) in other.tiers.into_iter().enumerate() {
            incoming.shift(arena, offset);
            for id in incoming.entries().ids().to_vec() {
                self.tiers[level].append(arena, id)?;
            }
        }
        self.align(arena, h)
    }

    /// Synthesizes a tag adjacent to `anchor`, builds its tier by copying
    /// timing (and optionally labels) from the tier above or below the new
    /// level, inserts it, and re-aligns. Returns the new tag.
    ///
    /// # Errors
    ///
    /// Fails when the anchor tag has no tier here, when no adjacent tier
    /// exists on the `timing_from` side, or when the timing source is not
    /// an interval tier.
    pub fn interleave_tier(
        &mut self,
        arena: &mut Arena,
        h: &mut Hierarchy,
        name: &str,
        anchor: Anchor,
        timing_from: TimingFrom,
        copy_labels: bool,
    ) -> Result<TagId> {
        let anchor_tag = match anchor {
            Anchor::Above(tag) | Anchor::Below(tag) => tag,
        };
        let anchor_level = self
            .tiers
            .iter()
            .position(|tier| tier.tag() == anchor_tag)
            .ok_or_else(|| RelationError::MissingTier(h.name(anchor_tag).to_string()))?;
        let new_level = match anchor {
            Anchor::Above(_) => anchor_level,
            Anchor::Below(_) => anchor_level + 1,
        };

        let source_level = match timing_from {
            TimingFrom::Above => new_level.checked_sub(1).ok_or(RelationError::NoTimingSource)?,
            TimingFrom::Below => {
                if new_level >= self.tiers.len() {
                    return Err(RelationError::NoTimingSource);
                }
                new_level
            }
        };
        if self.tiers[source_level].kind() != TagKind::Interval {
            return Err(RelationError::KindMismatch {
                tag: h.name(self.tiers[source_level].tag()).to_string(),
                expected: self.tiers[source_level].kind(),
            });
        }

        // Resolve both link targets before rewiring; registering the new
        // edges overwrites the old chain.
        let above_target = if new_level > 0 {
            Some(self.tiers[new_level - 1].tag())
        } else {
            h.superset_of(self.tiers[0].tag())
        };
        let below_target = if new_level < self.tiers.len() {
            Some(self.tiers[new_level].tag())
        } else {
            h.subset_of(self.tiers[self.tiers.len() - 1].tag())
        };

        let tag = h.register(name, TagKind::Interval);
        if let Some(above) = above_target {
            h.declare_contained(above, tag)?;
        }
        if let Some(below) = below_target {
            h.declare_contained(tag, below)?;
        }

        let entries: Vec<Interval> = self.tiers[source_level]
            .to_intervals(arena)
            .into_iter()
            .map(|mut entry| {
                if !copy_labels {
                    entry.label.clear();
                }
                entry
            })
            .collect();
        let tier = Tier::from_intervals(arena, h, tag, name, &entries)?;

        self.tiers.insert(new_level, tier);
        self.name_index = self
            .tiers
            .iter()
            .enumerate()
            .map(|(index, tier)| (tier.name(), index))
            .collect();
        self.align(arena, h)?;
        Ok(tag)
    }
}

/// Orders tiers top-to-bottom along their tag chain.
fn arrange(h: &Hierarchy, mut tiers: Vec<Tier>) -> Result<Vec<Tier>> {
    let seed = tiers
        .iter()
        .position(|tier| {
            match h.superset_of(tier.tag()) {
                None => true,
                Some(superset) => {
                    h.is_top(superset)
                        || !tiers.iter().any(|other| other.tag() == superset)
                }
            }
        })
        .ok_or(RelationError::BrokenChain)?;

    let mut arranged = vec![tiers.swap_remove(seed)];
    loop {
        let current = arranged[arranged.len() - 1].tag();
        let Some(subset) = h.subset_of(current) else {
            break;
        };
        if h.is_bottom(subset) {
            break;
        }
        let Some(next) = tiers.iter().position(|tier| tier.tag() == subset) else {
            break;
        };
        arranged.push(tiers.swap_remove(next));
    }
    if !tiers.is_empty() {
        return Err(RelationError::BrokenChain);
    }
    Ok(arranged)
}

/// A bundle of point tiers carried alongside a [`TierGroup`].
///
/// Point tiers never join containment chains, so the bundle only offers
/// uniform shifting and nearest-point lookup.
#[derive(Debug)]
pub struct PointGroup {
    tiers: Vec<Tier>,
}

impl PointGroup {
    /// Bundles point tiers.
    ///
    /// # Errors
    ///
    /// Fails with [`RelationError::KindMismatch`] if any tier is not a
    /// point tier.
    pub fn new(h: &Hierarchy, tiers: Vec<Tier>) -> Result<Self> {
        for tier in &tiers {
            if tier.kind() != TagKind::Point {
                return Err(RelationError::KindMismatch {
                    tag: h.name(tier.tag()).to_string(),
                    expected: tier.kind(),
                });
            }
        }
        Ok(Self { tiers })
    }

    /// The tiers, in the order given.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Translates every point on every tier by `increment`.
    pub fn shift(&mut self, arena: &mut Arena, increment: f64) {
        for tier in &mut self.tiers {
            tier.shift(arena, increment);
        }
    }

    /// The nearest point index on every tier.
    pub fn nearest_indexes(&self, arena: &Arena, t: f64) -> Vec<Option<usize>> {
        self.tiers
            .iter()
            .map(|tier| tier.get_index_at_time(arena, t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use tieralign_core::chain::{ChainConfig, build_chain};
    use tieralign_core::entry::Point;

    use super::*;

    fn the_dog() -> (Hierarchy, Vec<TagId>, Arena, TierGroup) {
        let mut h = Hierarchy::new();
        let tags = build_chain(&mut h, &["Word", "Phone"], &ChainConfig::default()).unwrap();
        let mut arena = Arena::new();

        let words = Tier::from_intervals(
            &mut arena,
            &h,
            tags[0],
            "words",
            &[
                Interval::new(0.0, 10.0, "the"),
                Interval::new(10.0, 25.0, "dog"),
            ],
        )
        .unwrap();
        let phones = Tier::from_intervals(
            &mut arena,
            &h,
            tags[1],
            "phones",
            &[
                Interval::new(0.0, 5.0, "DH"),
                Interval::new(5.0, 10.0, "AH0"),
                Interval::new(10.0, 15.0, "D"),
                Interval::new(15.0, 20.0, "AO1"),
                Interval::new(20.0, 25.0, "G"),
            ],
        )
        .unwrap();

        // Deliberately bottom-up; arrangement is input-order independent.
        let group = TierGroup::new(&mut arena, &h, vec![phones, words]).unwrap();
        (h, tags, arena, group)
    }

    fn child_labels(arena: &Arena, id: NodeId) -> Vec<String> {
        arena
            .node(id)
            .children()
            .iter()
            .map(|child| arena.node(child).label().to_string())
            .collect()
    }

    #[test]
    fn test_alignment_assigns_children() {
        let (_, _, arena, group) = the_dog();
        let words = group.get(0).unwrap();

        let the = words.get(0).unwrap();
        let dog = words.get(1).unwrap();
        assert_eq!(child_labels(&arena, the), vec!["DH", "AH0"]);
        assert_eq!(child_labels(&arena, dog), vec!["D", "AO1", "G"]);
        assert!(arena.validate(the));
        assert!(arena.validate(dog));

        // Every phone knows its word.
        let phones = group.get(1).unwrap();
        assert_eq!(arena.node(phones.get(0).unwrap()).parent(), Some(the));
        assert_eq!(arena.node(phones.get(4).unwrap()).parent(), Some(dog));
    }

    #[test]
    fn test_alignment_warns_on_uncovered_lower_entries() {
        static MESSAGES: std::sync::Mutex<Vec<String>> = std::sync::Mutex::new(Vec::new());
        struct Capture;
        impl log::Log for Capture {
            fn enabled(&self, _: &log::Metadata) -> bool {
                true
            }
            fn log(&self, record: &log::Record) {
                MESSAGES.lock().unwrap().push(record.args().to_string());
            }
            fn flush(&self) {}
        }
        static CAPTURE: Capture = Capture;
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Warn);

        let mut h = Hierarchy::new();
        let tags = build_chain(&mut h, &["Word", "Phone"], &ChainConfig::default()).unwrap();
        let mut arena = Arena::new();
        let words = Tier::from_intervals(
            &mut arena,
            &h,
            tags[0],
            "words",
            &[Interval::new(0.0, 10.0, "a"), Interval::new(20.0, 30.0, "b")],
        )
        .unwrap();
        // A snug phone tier; the middle phone sits in the silence
        // between the two words.
        let phones = Tier::from_intervals(
            &mut arena,
            &h,
            tags[1],
            "phones",
            &[
                Interval::new(0.0, 10.0, "AA1"),
                Interval::new(10.0, 20.0, "sil"),
                Interval::new(20.0, 30.0, "IY0"),
            ],
        )
        .unwrap();

        let group = TierGroup::new(&mut arena, &h, vec![words, phones]).unwrap();

        let orphan = group.get(1).unwrap().get(1).unwrap();
        assert_eq!(arena.node(orphan).parent(), None);
        let messages = MESSAGES.lock().unwrap();
        assert!(
            messages.iter().any(|m| m.contains("not covered")),
            "expected a coverage warning, got {messages:?}"
        );
    }

    #[test]
    fn test_group_lookups() {
        let (_, _, arena, group) = the_dog();

        assert_eq!(group.get_indexes_at_time(&arena, 12.0), vec![Some(1), Some(2)]);
        assert_approx_eq!(f64, group.xmin(&arena).unwrap(), 0.0);
        assert_approx_eq!(f64, group.xmax(&arena).unwrap(), 25.0);
        assert_eq!(group.tier_by_name("words").unwrap().len(), 2);
        assert!(group.tier_by_name("syllables").is_none());
    }

    #[test]
    fn test_broken_chain_rejected() {
        let mut h = Hierarchy::new();
        let word = h.register("Word", TagKind::Interval);
        let stray = h.register("Stray", TagKind::Interval);
        let mut arena = Arena::new();

        let words = Tier::from_intervals(&mut arena, &h, word, "words", &[]).unwrap();
        let strays = Tier::from_intervals(&mut arena, &h, stray, "strays", &[]).unwrap();

        assert!(matches!(
            TierGroup::new(&mut arena, &h, vec![words, strays]),
            Err(RelationError::BrokenChain)
        ));
        assert!(matches!(
            TierGroup::new(&mut arena, &h, vec![]),
            Err(RelationError::EmptyGroup)
        ));
    }

    #[test]
    fn test_append_cascades() {
        let (h, tags, mut arena, mut group) = the_dog();

        let cat = arena.alloc_interval(&h, tags[0], &Interval::new(25.0, 30.0, "cat"));
        let k = arena.alloc_interval(&h, tags[1], &Interval::new(25.0, 27.0, "K"));
        let ae = arena.alloc_interval(&h, tags[1], &Interval::new(27.0, 28.5, "AE1"));
        let t = arena.alloc_interval(&h, tags[1], &Interval::new(28.5, 30.0, "T"));
        arena.set_children(&h, cat, &[k, ae, t]).unwrap();

        group.append(&mut arena, 0, cat).unwrap();

        assert_eq!(group.get(0).unwrap().len(), 3);
        assert_eq!(group.get(1).unwrap().len(), 8);
        assert!(group.get(1).unwrap().entries().contains(ae));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut h = Hierarchy::new();
        let tags = build_chain(&mut h, &["Word", "Phone"], &ChainConfig::default()).unwrap();
        let mut arena = Arena::new();

        // A gap on the word tier over phones that exist, and a phone gap.
        let words = Tier::from_intervals(
            &mut arena,
            &h,
            tags[0],
            "words",
            &[Interval::new(0.0, 10.0, "the")],
        )
        .unwrap();
        let phones = Tier::from_intervals(
            &mut arena,
            &h,
            tags[1],
            "phones",
            &[
                Interval::new(0.0, 5.0, "DH"),
                Interval::new(5.0, 10.0, "AH0"),
                Interval::new(12.0, 15.0, "D"),
            ],
        )
        .unwrap();
        let mut group = TierGroup::new(&mut arena, &h, vec![words, phones]).unwrap();

        group.cleanup(&mut arena, &h).unwrap();

        // The phone gap got a filler, the orphaned phones an empty parent.
        assert_eq!(
            group.get(1).unwrap().labels(&arena),
            vec!["DH", "AH0", "", "D"]
        );
        assert_eq!(group.get(0).unwrap().labels(&arena), vec!["the", ""]);
        let projected = group.get(0).unwrap().get(1).unwrap();
        assert_approx_eq!(f64, arena.start_of(projected), 10.0);
        assert_approx_eq!(f64, arena.end_of(projected), 15.0);
        assert!(arena.validate(projected));

        let word_count = group.get(0).unwrap().len();
        let phone_count = group.get(1).unwrap().len();
        group.cleanup(&mut arena, &h).unwrap();
        assert_eq!(group.get(0).unwrap().len(), word_count);
        assert_eq!(group.get(1).unwrap().len(), phone_count);
    }

    #[test]
    fn test_concat_shifts_and_splices() {
        let (h, tags, mut arena, mut group) = the_dog();

        // A second group over the same tags in the same arena.
        let words = Tier::from_intervals(
            &mut arena,
            &h,
            tags[0],
            "words-2",
            &[Interval::new(0.0, 5.0, "ran")],
        )
        .unwrap();
        let phones = Tier::from_intervals(
            &mut arena,
            &h,
            tags[1],
            "phones-2",
            &[
                Interval::new(0.0, 2.0, "R"),
                Interval::new(2.0, 3.5, "AE1"),
                Interval::new(3.5, 5.0, "N"),
            ],
        )
        .unwrap();
        let other = TierGroup::new(&mut arena, &h, vec![words, phones]).unwrap();

        group.concat(&mut arena, &h, other).unwrap();

        assert_eq!(
            group.get(0).unwrap().labels(&arena),
            vec!["the", "dog", "ran"]
        );
        assert_approx_eq!(f64, group.xmax(&arena).unwrap(), 30.0);
        // The spliced word kept its phones.
        let ran = group.get(0).unwrap().get(2).unwrap();
        assert_eq!(child_labels(&arena, ran), vec!["R", "AE1", "N"]);
        assert_approx_eq!(f64, arena.start_of(ran), 25.0);
    }

    #[test]
    fn test_concat_rejects_different_chains() {
        let (h, _, mut arena, mut group) = the_dog();
        let mut h2 = Hierarchy::new();
        let other_tags =
            build_chain(&mut h2, &["Word", "Phone"], &ChainConfig::default()).unwrap();
        let words =
            Tier::from_intervals(&mut arena, &h2, other_tags[0], "words", &[]).unwrap();

        // A single-tier group over foreign tags.
        let other = TierGroup::new(&mut arena, &h2, vec![words]).unwrap();
        assert!(matches!(
            group.concat(&mut arena, &h, other),
            Err(RelationError::ChainMismatch)
        ));
    }

    #[test]
    fn test_interleave_tier() {
        let (mut h, tags, mut arena, mut group) = the_dog();

        let syllable = group
            .interleave_tier(
                &mut arena,
                &mut h,
                "syllables",
                Anchor::Below(tags[0]),
                TimingFrom::Below,
                false,
            )
            .unwrap();

        assert_eq!(group.len(), 3);
        assert_eq!(h.subset_of(tags[0]), Some(syllable));
        assert_eq!(h.subset_of(syllable), Some(tags[1]));
        let syllables = group.get(1).unwrap();
        assert_eq!(syllables.len(), 5);
        assert!(syllables.labels(&arena).iter().all(String::is_empty));
        // Words now contain syllables, syllables contain phones.
        let the = group.get(0).unwrap().get(0).unwrap();
        assert_eq!(arena.node(the).children().len(), 2);
        assert_eq!(
            arena.node(syllables.get(0).unwrap()).children().len(),
            1
        );
    }

    #[test]
    fn test_interleave_rejects_point_timing_source() {
        let mut h = Hierarchy::new();
        let tone = h.register("ToBI", TagKind::Point);
        let mut arena = Arena::new();
        let tones =
            Tier::from_points(&mut arena, &h, tone, "tones", &[Point::new(2.0, "H*")]).unwrap();
        let mut group = TierGroup::new(&mut arena, &h, vec![tones]).unwrap();

        let err = group
            .interleave_tier(
                &mut arena,
                &mut h,
                "beats",
                Anchor::Below(tone),
                TimingFrom::Above,
                false,
            )
            .unwrap_err();
        // The message reports the tier's declared kind.
        assert!(matches!(
            err,
            RelationError::KindMismatch {
                expected: TagKind::Point,
                ..
            }
        ));
    }

    #[test]
    fn test_show_structure() {
        let (h, _, _, group) = the_dog();
        let rendered = group.show_structure(&h);

        assert!(rendered.contains("Word (words)"));
        assert!(rendered.contains("└ Phone (phones)"));
    }

    #[test]
    fn test_point_group() {
        let mut h = Hierarchy::new();
        let tone = h.register("ToBI", TagKind::Point);
        let word = h.register("Word", TagKind::Interval);
        let mut arena = Arena::new();

        let tones = Tier::from_points(
            &mut arena,
            &h,
            tone,
            "tones",
            &[Point::new(2.0, "H*"), Point::new(8.0, "L-L%")],
        )
        .unwrap();
        let mut points = PointGroup::new(&h, vec![tones]).unwrap();

        assert_eq!(points.nearest_indexes(&arena, 7.0), vec![Some(1)]);
        points.shift(&mut arena, 1.0);
        assert_eq!(points.nearest_indexes(&arena, 3.1), vec![Some(0)]);

        let words = Tier::from_intervals(&mut arena, &h, word, "words", &[]).unwrap();
        assert!(matches!(
            PointGroup::new(&h, vec![words]),
            Err(RelationError::KindMismatch { .. })
        ));
    }
}
