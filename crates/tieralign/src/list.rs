//! Homogeneous, temporally sorted lists of node ids.
//!
//! A [`NodeList`] is the ordered collection behind both a tier's entries
//! and a node's children. It stores ids only; every operation that needs
//! times or labels takes the [`Arena`] explicitly.

use log::warn;

use tieralign_core::entry::times_close;
use tieralign_core::hierarchy::TagId;
use tieralign_core::identifier::Id;

use crate::arena::{Arena, NodeId};
use crate::error::{RelationError, Result};

/// An ordered list of same-tag node ids.
///
/// The first insertion establishes the list's tag; later insertions must
/// match it. Order is maintained by temporal key on every mutation.
#[derive(Debug, Default)]
pub struct NodeList {
    tag: Option<TagId>,
    tag_name: Option<Id>,
    items: Vec<NodeId>,
}

impl NodeList {
    /// Creates an empty list with no established tag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list that will only accept the given tag.
    pub fn for_tag(tag: TagId, tag_name: Id) -> Self {
        Self {
            tag: Some(tag),
            tag_name: Some(tag_name),
            items: Vec::new(),
        }
    }

    /// The established tag, if any member has ever been inserted.
    pub fn tag(&self) -> Option<TagId> {
        self.tag
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The member ids in temporal order.
    pub fn ids(&self) -> &[NodeId] {
        &self.items
    }

    /// Iterates over the member ids in temporal order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().copied()
    }

    /// The member at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }

    /// The earliest member.
    pub fn first(&self) -> Option<NodeId> {
        self.items.first().copied()
    }

    /// The latest member.
    pub fn last(&self) -> Option<NodeId> {
        self.items.last().copied()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: NodeId) -> bool {
        self.items.contains(&id)
    }

    /// The position of `id`, if a member.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.items.iter().position(|&item| item == id)
    }

    /// Inserts `id` keeping temporal order. A no-op if already a member.
    ///
    /// # Errors
    ///
    /// Fails when `id` is a boundary sentinel, or when its tag does not
    /// match the list's established tag.
    pub fn append(&mut self, arena: &Arena, id: NodeId) -> Result<()> {
        let node = arena.node(id);
        if node.is_boundary() {
            return Err(RelationError::BoundaryMember);
        }
        match (self.tag, self.tag_name) {
            (Some(tag), Some(tag_name)) if tag != node.tag() => {
                return Err(RelationError::TagMismatch {
                    expected: tag_name.to_string(),
                    found: node.tag_name.to_string(),
                });
            }
            _ => {}
        }
        self.insert_sorted(arena, id);
        Ok(())
    }

    /// Unchecked sorted insert for callers that have already validated the
    /// tag. A no-op if already a member.
    pub(crate) fn insert_sorted(&mut self, arena: &Arena, id: NodeId) {
        if self.contains(id) {
            return;
        }
        if self.tag.is_none() {
            let node = arena.node(id);
            self.tag = Some(node.tag());
            self.tag_name = Some(node.tag_name);
        }
        let key = arena.key_of(id);
        let at = self
            .items
            .partition_point(|&item| arena.key_of(item) <= key);
        self.items.insert(at, id);
    }

    /// Removes `id` without touching the arena. Returns whether it was a
    /// member.
    pub(crate) fn remove_id(&mut self, id: NodeId) -> bool {
        match self.index_of(id) {
            Some(at) => {
                self.items.remove(at);
                true
            }
            None => false,
        }
    }

    /// Removes `id` from the list and detaches it from its parent's
    /// children. Silent if not a member.
    pub fn remove(&mut self, arena: &mut Arena, id: NodeId) {
        if self.remove_id(id) {
            arena.detach_from_parent(id);
        }
    }

    /// Re-sorts the list by temporal key. Mutating a member's times
    /// through the arena does not reorder the list on its own; callers do
    /// this after any such change.
    pub fn sort(&mut self, arena: &Arena) {
        self.items
            .sort_by(|&a, &b| arena.key_of(a).total_cmp(&arena.key_of(b)));
    }

    /// Member start times, in order.
    pub fn starts(&self, arena: &Arena) -> Vec<f64> {
        self.items.iter().map(|&id| arena.start_of(id)).collect()
    }

    /// Member end times, in order.
    pub fn ends(&self, arena: &Arena) -> Vec<f64> {
        self.items.iter().map(|&id| arena.end_of(id)).collect()
    }

    /// Member labels, in order.
    pub fn labels(&self, arena: &Arena) -> Vec<String> {
        self.items
            .iter()
            .map(|&id| arena.node(id).label().to_string())
            .collect()
    }

    /// The latest end time among members.
    pub fn max_end(&self, arena: &Arena) -> Option<f64> {
        self.items
            .iter()
            .map(|&id| arena.end_of(id))
            .max_by(f64::total_cmp)
    }

    /// Checks that no two interval members overlap beyond tolerance.
    ///
    /// Overlap is a data-quality condition, logged and reported through the
    /// flag rather than raised. Point members never overlap.
    pub fn check_no_overlap(&self, arena: &Arena) -> bool {
        let mut clean = true;
        for (at, &a) in self.items.iter().enumerate() {
            for &b in &self.items[at + 1..] {
                let latest_start = arena.start_of(a).max(arena.start_of(b));
                let earliest_end = arena.end_of(a).min(arena.end_of(b));
                if earliest_end > latest_start && !times_close(earliest_end, latest_start) {
                    warn!(
                        left = arena.node(a).label(),
                        right = arena.node(b).label();
                        "list members overlap"
                    );
                    clean = false;
                }
            }
        }
        clean
    }

    /// Splices another list's members onto the end of this one, shifting
    /// each incoming subtree by this list's latest end.
    ///
    /// # Errors
    ///
    /// Fails when the two lists carry different established tags.
    pub fn concat(&mut self, arena: &mut Arena, other: &NodeList) -> Result<()> {
        if let (Some(ours), Some(theirs)) = (self.tag, other.tag) {
            if ours != theirs {
                return Err(RelationError::ChainMismatch);
            }
        }
        let offset = self.max_end(arena).unwrap_or(0.0);
        for id in other.iter() {
            arena.shift_subtree(id, offset);
            self.append(arena, id)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter().copied()
    }
}
