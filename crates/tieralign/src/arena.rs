//! The node arena and node-level operations.
//!
//! Every live annotation node is owned by an [`Arena`] and addressed by a
//! [`NodeId`]. Parent, children, and precedence neighbors are ids, never
//! references, so the containment graph carries no ownership cycles and a
//! whole hierarchy drops with its arena.
//!
//! Precedence chains terminate in *boundary sentinels*: `"#"`-labelled
//! nodes with no temporal extent that are allocated on demand and never
//! join a tier or list.

use std::mem;

use log::warn;

use tieralign_core::entry::{Interval, Point, Temporal, times_close};
use tieralign_core::hierarchy::{Hierarchy, TagId};
use tieralign_core::identifier::Id;

use crate::error::{RelationError, Result};
use crate::list::NodeList;

/// An opaque handle to a node in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single annotation node.
///
/// Fields are read through accessors; all mutation goes through [`Arena`]
/// methods so the mirrored relationship fields stay consistent.
#[derive(Debug)]
pub struct Node {
    pub(crate) tag: TagId,
    pub(crate) tag_name: Id,
    pub(crate) label: String,
    /// `None` only for `"#"` boundary sentinels.
    pub(crate) temporal: Option<Temporal>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) fol: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: NodeList,
    pub(crate) tier_name: Option<Id>,
    pub(crate) tier_index: Option<usize>,
}

impl Node {
    /// The node's tag handle.
    pub fn tag(&self) -> TagId {
        self.tag
    }

    /// The node's annotation label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The node's temporal extent. `None` for boundary sentinels.
    pub fn temporal(&self) -> Option<Temporal> {
        self.temporal
    }

    /// The node preceding this one in its precedence chain.
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// The node following this one in its precedence chain.
    pub fn fol(&self) -> Option<NodeId> {
        self.fol
    }

    /// The node containing this one.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The nodes this one contains, in temporal order.
    pub fn children(&self) -> &NodeList {
        &self.children
    }

    /// The name of the tier holding this node, if any.
    pub fn tier_name(&self) -> Option<Id> {
        self.tier_name
    }

    /// The node's index within its tier, if any.
    pub fn tier_index(&self) -> Option<usize> {
        self.tier_index
    }

    /// Whether this is a `"#"` boundary sentinel.
    pub fn is_boundary(&self) -> bool {
        self.temporal.is_none()
    }
}

/// Owner of all annotation nodes.
///
/// The arena only grows; removing a node from a tier or child list leaves
/// its slot allocated but unreachable. Hierarchies are short-lived enough
/// in practice that this is the whole memory story.
///
/// # Examples
///
/// ```
/// use tieralign::Arena;
/// use tieralign_core::entry::Interval;
/// use tieralign_core::hierarchy::{Hierarchy, TagKind};
///
/// let mut hierarchy = Hierarchy::new();
/// let word = hierarchy.register("Word", TagKind::Interval);
///
/// let mut arena = Arena::new();
/// let the = arena.alloc_interval(&hierarchy, word, &Interval::new(0.0, 0.5, "the"));
///
/// assert_eq!(arena.node(the).label(), "the");
/// ```
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated nodes, boundary sentinels included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes have been allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node behind a handle.
    ///
    /// # Panics
    /// Panics if the handle does not belong to this arena.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the node behind a handle, or `None` for a foreign handle.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocates an interval node with no relationships.
    pub fn alloc_interval(&mut self, h: &Hierarchy, tag: TagId, entry: &Interval) -> NodeId {
        self.alloc(Node {
            tag,
            tag_name: h.name(tag),
            label: entry.label.clone(),
            temporal: Some(Temporal::from(entry)),
            prev: None,
            fol: None,
            parent: None,
            children: NodeList::default(),
            tier_name: None,
            tier_index: None,
        })
    }

    /// Allocates a point node with no relationships.
    pub fn alloc_point(&mut self, h: &Hierarchy, tag: TagId, entry: &Point) -> NodeId {
        self.alloc(Node {
            tag,
            tag_name: h.name(tag),
            label: entry.label.clone(),
            temporal: Some(Temporal::from(entry)),
            prev: None,
            fol: None,
            parent: None,
            children: NodeList::default(),
            tier_name: None,
            tier_index: None,
        })
    }

    /// Allocates a node copying another's tag, label, and extent, but none
    /// of its relationships or tier bookkeeping.
    pub fn alloc_like(&mut self, source: NodeId) -> NodeId {
        let source = &self.nodes[source.index()];
        let node = Node {
            tag: source.tag,
            tag_name: source.tag_name,
            label: source.label.clone(),
            temporal: source.temporal,
            prev: None,
            fol: None,
            parent: None,
            children: NodeList::default(),
            tier_name: None,
            tier_index: None,
        };
        self.alloc(node)
    }

    /// Allocates a `"#"` boundary sentinel for the given tag.
    pub fn alloc_boundary(&mut self, h: &Hierarchy, tag: TagId) -> NodeId {
        self.alloc_boundary_raw(tag, h.name(tag))
    }

    fn alloc_boundary_raw(&mut self, tag: TagId, tag_name: Id) -> NodeId {
        self.alloc(Node {
            tag,
            tag_name,
            label: "#".to_string(),
            temporal: None,
            prev: None,
            fol: None,
            parent: None,
            children: NodeList::default(),
            tier_name: None,
            tier_index: None,
        })
    }

    // ========================================================================
    // Sorting keys
    // ========================================================================

    pub(crate) fn key_of(&self, id: NodeId) -> f64 {
        self.nodes[id.index()]
            .temporal
            .map_or(f64::NAN, |t| t.key())
    }

    pub(crate) fn start_of(&self, id: NodeId) -> f64 {
        self.nodes[id.index()]
            .temporal
            .map_or(f64::NAN, |t| t.start())
    }

    pub(crate) fn end_of(&self, id: NodeId) -> f64 {
        self.nodes[id.index()]
            .temporal
            .map_or(f64::NAN, |t| t.end())
    }

    pub(crate) fn set_tier(&mut self, id: NodeId, name: Option<Id>, index: Option<usize>) {
        let node = &mut self.nodes[id.index()];
        node.tier_name = name;
        node.tier_index = index;
    }

    // ========================================================================
    // Precedence
    // ========================================================================

    /// Declares `b` as the node following `a`, mirroring the prev edge.
    ///
    /// Calling this on a boundary sentinel is a silent no-op, as is
    /// re-declaring a link already in place.
    ///
    /// # Errors
    ///
    /// Fails if `a` and `b` are the same node or carry different tags.
    pub fn set_fol(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        if a == b {
            return Err(RelationError::SelfLink(self.nodes[a.index()].label.clone()));
        }
        if self.nodes[a.index()].is_boundary() {
            return Ok(());
        }
        if self.nodes[a.index()].fol == Some(b) {
            return Ok(());
        }
        self.check_same_tag(a, b)?;
        self.nodes[a.index()].fol = Some(b);
        self.set_prev(b, a)
    }

    /// Declares `b` as the node preceding `a`. Symmetric to
    /// [`Arena::set_fol`].
    ///
    /// # Errors
    ///
    /// Fails if `a` and `b` are the same node or carry different tags.
    pub fn set_prev(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        if a == b {
            return Err(RelationError::SelfLink(self.nodes[a.index()].label.clone()));
        }
        if self.nodes[a.index()].is_boundary() {
            return Ok(());
        }
        if self.nodes[a.index()].prev == Some(b) {
            return Ok(());
        }
        self.check_same_tag(a, b)?;
        self.nodes[a.index()].prev = Some(b);
        self.set_fol(b, a)
    }

    fn check_same_tag(&self, a: NodeId, b: NodeId) -> Result<()> {
        let (a, b) = (&self.nodes[a.index()], &self.nodes[b.index()]);
        if a.tag != b.tag {
            return Err(RelationError::TagMismatch {
                expected: a.tag_name.to_string(),
                found: b.tag_name.to_string(),
            });
        }
        Ok(())
    }

    /// Marks `node` as chain-initial by linking a fresh boundary sentinel
    /// before it. Reuses the existing sentinel if one is already in place.
    pub fn set_initial(&mut self, node: NodeId) {
        if let Some(prev) = self.nodes[node.index()].prev {
            if self.nodes[prev.index()].is_boundary() {
                return;
            }
        }
        let (tag, tag_name) = {
            let node = &self.nodes[node.index()];
            (node.tag, node.tag_name)
        };
        let boundary = self.alloc_boundary_raw(tag, tag_name);
        self.nodes[node.index()].prev = Some(boundary);
        self.nodes[boundary.index()].fol = Some(node);
    }

    /// Marks `node` as chain-final by linking a fresh boundary sentinel
    /// after it. Reuses the existing sentinel if one is already in place.
    pub fn set_final(&mut self, node: NodeId) {
        if let Some(fol) = self.nodes[node.index()].fol {
            if self.nodes[fol.index()].is_boundary() {
                return;
            }
        }
        let (tag, tag_name) = {
            let node = &self.nodes[node.index()];
            (node.tag, node.tag_name)
        };
        let boundary = self.alloc_boundary_raw(tag, tag_name);
        self.nodes[node.index()].fol = Some(boundary);
        self.nodes[boundary.index()].prev = Some(node);
    }

    // ========================================================================
    // Containment
    // ========================================================================

    /// Places `node` under `parent`, detaching it from any previous parent
    /// and keeping `parent`'s children sorted with precedence rebuilt.
    ///
    /// # Errors
    ///
    /// Fails unless `parent`'s tag is the declared superset of `node`'s
    /// tag, or when `node` and `parent` are the same node.
    pub fn set_parent(&mut self, h: &Hierarchy, node: NodeId, parent: NodeId) -> Result<()> {
        if node == parent {
            return Err(RelationError::SelfLink(
                self.nodes[node.index()].label.clone(),
            ));
        }
        let child_tag = self.nodes[node.index()].tag;
        let declared = h.superset_of(child_tag).ok_or_else(|| {
            RelationError::NoDeclaredRelation {
                tag: self.nodes[node.index()].tag_name.to_string(),
                role: "container",
            }
        })?;
        if self.nodes[parent.index()].tag != declared {
            return Err(RelationError::TagMismatch {
                expected: h.name(declared).to_string(),
                found: self.nodes[parent.index()].tag_name.to_string(),
            });
        }
        if self.nodes[node.index()].parent == Some(parent) {
            return Ok(());
        }

        self.detach_from_parent(node);
        self.nodes[node.index()].parent = Some(parent);
        let mut children = mem::take(&mut self.nodes[parent.index()].children);
        children.insert_sorted(self, node);
        self.nodes[parent.index()].children = children;
        self.rebuild_child_precedence(parent);
        Ok(())
    }

    /// Places `child` under `node`. Symmetric to [`Arena::set_parent`].
    ///
    /// # Errors
    ///
    /// Fails unless `child`'s tag is the declared subset of `node`'s tag.
    pub fn append_child(&mut self, h: &Hierarchy, node: NodeId, child: NodeId) -> Result<()> {
        let declared = h.subset_of(self.nodes[node.index()].tag).ok_or_else(|| {
            RelationError::NoDeclaredRelation {
                tag: self.nodes[node.index()].tag_name.to_string(),
                role: "member",
            }
        })?;
        if self.nodes[child.index()].tag != declared {
            return Err(RelationError::TagMismatch {
                expected: h.name(declared).to_string(),
                found: self.nodes[child.index()].tag_name.to_string(),
            });
        }
        self.set_parent(h, child, node)
    }

    /// Replaces `node`'s children wholesale.
    ///
    /// Previous children are released (their parent cleared); the new
    /// children are detached from their previous parents, sorted, and
    /// chained with boundary sentinels at both ends.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`Arena::append_child`], applied
    /// per child.
    pub fn set_children(&mut self, h: &Hierarchy, node: NodeId, children: &[NodeId]) -> Result<()> {
        let old = mem::take(&mut self.nodes[node.index()].children);
        for id in old.ids() {
            self.nodes[id.index()].parent = None;
        }
        for &child in children {
            self.append_child(h, node, child)?;
        }
        Ok(())
    }

    /// Removes `child` from `node`'s children. Silent if absent.
    pub fn remove_child(&mut self, node: NodeId, child: NodeId) {
        let mut children = mem::take(&mut self.nodes[node.index()].children);
        let removed = children.remove_id(child);
        self.nodes[node.index()].children = children;
        if removed {
            if self.nodes[child.index()].parent == Some(node) {
                self.nodes[child.index()].parent = None;
            }
            self.rebuild_child_precedence(node);
        }
    }

    /// Detaches `node` from its parent, if it has one.
    pub fn detach_from_parent(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent {
            self.remove_child(parent, node);
        }
    }

    /// Relinks `node`'s children into a fresh precedence chain: consecutive
    /// children linked in order, boundary sentinels at both ends.
    pub fn rebuild_child_precedence(&mut self, node: NodeId) {
        let ids: Vec<NodeId> = self.nodes[node.index()].children.ids().to_vec();
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return;
        };
        for pair in ids.windows(2) {
            self.nodes[pair[0].index()].fol = Some(pair[1]);
            self.nodes[pair[1].index()].prev = Some(pair[0]);
        }
        self.set_initial(first);
        self.set_final(last);
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Checks that `node`'s children snugly tile its extent.
    ///
    /// Data quality is advisory: every violation is logged as a warning and
    /// folded into the returned flag, never raised as an error. Boundary
    /// sentinels, points, and childless intervals are trivially valid.
    pub fn validate(&self, node: NodeId) -> bool {
        let Some(Temporal::Interval { start, end }) = self.nodes[node.index()].temporal else {
            return true;
        };
        let ids = self.nodes[node.index()].children.ids();
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return true;
        };

        let label = self.nodes[node.index()].label.as_str();
        let mut valid = true;
        if !times_close(self.start_of(first), start) {
            warn!(
                parent = label,
                child = self.nodes[first.index()].label.as_str();
                "first child does not start at the parent's start"
            );
            valid = false;
        }
        if !times_close(self.end_of(last), end) {
            warn!(
                parent = label,
                child = self.nodes[last.index()].label.as_str();
                "last child does not end at the parent's end"
            );
            valid = false;
        }
        for pair in ids.windows(2) {
            if !times_close(self.end_of(pair[0]), self.start_of(pair[1])) {
                warn!(
                    parent = label,
                    left = self.nodes[pair[0].index()].label.as_str(),
                    right = self.nodes[pair[1].index()].label.as_str();
                    "adjacent children are not snug"
                );
                valid = false;
            }
        }
        valid
    }

    // ========================================================================
    // Fusion
    // ========================================================================

    /// Fuses `node` with the node following it in its precedence chain.
    ///
    /// `node` absorbs the follower's extent, takes `label_fn(own, next)` as
    /// its label, and adopts the follower's children. The fused-away node is
    /// detached from its parent and precedence chain and returned so tier
    /// wrappers can drop it from their entries.
    ///
    /// # Errors
    ///
    /// Fails when the follower is absent or a boundary sentinel, or when
    /// either node is not an interval.
    pub fn fuse_following(
        &mut self,
        node: NodeId,
        label_fn: impl Fn(&str, &str) -> String,
    ) -> Result<NodeId> {
        let fusee = match self.nodes[node.index()].fol {
            Some(fol) if !self.nodes[fol.index()].is_boundary() => fol,
            _ => {
                return Err(RelationError::FuseAtEdge(
                    self.nodes[node.index()].tier_index.unwrap_or(0),
                ));
            }
        };
        let (start, _) = self.interval_bounds(node)?;
        let (_, end) = self.interval_bounds(fusee)?;

        self.nodes[node.index()].temporal = Some(Temporal::Interval { start, end });
        self.nodes[node.index()].label = label_fn(
            &self.nodes[node.index()].label.clone(),
            &self.nodes[fusee.index()].label,
        );

        let after = self.nodes[fusee.index()].fol;
        self.nodes[node.index()].fol = after;
        if let Some(after) = after {
            self.nodes[after.index()].prev = Some(node);
        }
        self.absorb_children(node, fusee);
        self.release_fusee(fusee);
        Ok(fusee)
    }

    /// Fuses `node` with the node preceding it. Symmetric to
    /// [`Arena::fuse_following`]; the label becomes `label_fn(prev, own)`.
    ///
    /// # Errors
    ///
    /// Fails when the predecessor is absent or a boundary sentinel, or when
    /// either node is not an interval.
    pub fn fuse_preceding(
        &mut self,
        node: NodeId,
        label_fn: impl Fn(&str, &str) -> String,
    ) -> Result<NodeId> {
        let fusee = match self.nodes[node.index()].prev {
            Some(prev) if !self.nodes[prev.index()].is_boundary() => prev,
            _ => {
                return Err(RelationError::FuseAtEdge(
                    self.nodes[node.index()].tier_index.unwrap_or(0),
                ));
            }
        };
        let (start, _) = self.interval_bounds(fusee)?;
        let (_, end) = self.interval_bounds(node)?;

        self.nodes[node.index()].temporal = Some(Temporal::Interval { start, end });
        self.nodes[node.index()].label = label_fn(
            &self.nodes[fusee.index()].label.clone(),
            &self.nodes[node.index()].label,
        );

        let before = self.nodes[fusee.index()].prev;
        self.nodes[node.index()].prev = before;
        if let Some(before) = before {
            self.nodes[before.index()].fol = Some(node);
        }
        self.absorb_children(node, fusee);
        self.release_fusee(fusee);
        Ok(fusee)
    }

    fn interval_bounds(&self, node: NodeId) -> Result<(f64, f64)> {
        match self.nodes[node.index()].temporal {
            Some(Temporal::Interval { start, end }) => Ok((start, end)),
            _ => Err(RelationError::NotAnInterval(
                self.nodes[node.index()].label.clone(),
            )),
        }
    }

    fn absorb_children(&mut self, node: NodeId, fusee: NodeId) {
        let moved = mem::take(&mut self.nodes[fusee.index()].children);
        let mut children = mem::take(&mut self.nodes[node.index()].children);
        for id in moved.iter() {
            self.nodes[id.index()].parent = Some(node);
            children.insert_sorted(self, id);
        }
        self.nodes[node.index()].children = children;
        self.rebuild_child_precedence(node);
    }

    fn release_fusee(&mut self, fusee: NodeId) {
        self.detach_from_parent(fusee);
        let node = &mut self.nodes[fusee.index()];
        node.prev = None;
        node.fol = None;
        node.tier_name = None;
        node.tier_index = None;
    }

    // ========================================================================
    // Time translation
    // ========================================================================

    /// Translates `node`'s extent by `increment`.
    pub fn shift(&mut self, node: NodeId, increment: f64) {
        if let Some(temporal) = &mut self.nodes[node.index()].temporal {
            temporal.shift(increment);
        }
    }

    /// Translates `node` and every node below it by `increment`.
    pub fn shift_subtree(&mut self, node: NodeId, increment: f64) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            self.shift(id, increment);
            stack.extend(self.nodes[id.index()].children.ids());
        }
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Fills gaps between `node`'s extent and its children with empty-label
    /// children, so the children snugly tile the parent. Idempotent; a
    /// childless or non-interval node is left untouched.
    pub fn node_cleanup(&mut self, node: NodeId) {
        let Some(Temporal::Interval { start, end }) = self.nodes[node.index()].temporal else {
            return;
        };
        let ids = self.nodes[node.index()].children.ids().to_vec();
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return;
        };
        let (child_tag, child_tag_name) = {
            let child = &self.nodes[first.index()];
            (child.tag, child.tag_name)
        };

        let mut gaps = Vec::new();
        if !times_close(start, self.start_of(first)) && start < self.start_of(first) {
            gaps.push((start, self.start_of(first)));
        }
        for pair in ids.windows(2) {
            let (left_end, right_start) = (self.end_of(pair[0]), self.start_of(pair[1]));
            if !times_close(left_end, right_start) && left_end < right_start {
                gaps.push((left_end, right_start));
            }
        }
        if !times_close(self.end_of(last), end) && self.end_of(last) < end {
            gaps.push((self.end_of(last), end));
        }
        if gaps.is_empty() {
            return;
        }

        let mut children = mem::take(&mut self.nodes[node.index()].children);
        for (gap_start, gap_end) in gaps {
            let filler = self.alloc(Node {
                tag: child_tag,
                tag_name: child_tag_name,
                label: String::new(),
                temporal: Some(Temporal::Interval {
                    start: gap_start,
                    end: gap_end,
                }),
                prev: None,
                fol: None,
                parent: Some(node),
                children: NodeList::default(),
                tier_name: None,
                tier_index: None,
            });
            children.insert_sorted(self, filler);
        }
        self.nodes[node.index()].children = children;
        self.rebuild_child_precedence(node);
    }
}
