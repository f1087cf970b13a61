//! Dynamic construction of Top/Bottom-bounded tag chains.
//!
//! Rather than defining annotation classes ahead of time, callers hand
//! [`build_chain`] an ordered list of names ("Word", "Syllable", "Phone")
//! and receive freshly registered tags already wired into one containment
//! chain, bounded by sentinels minted for that call alone.

use std::collections::HashSet;

use log::debug;

use crate::hierarchy::{Hierarchy, HierarchyError, TagId, TagKind};

/// The order in which [`build_chain`] returns the synthesized tags.
///
/// Annotation files do not always store tiers top-down, so the returned
/// ordering can be permuted to match the file's tier order while the
/// declared hierarchy stays top-to-bottom.
#[derive(Debug, Clone, Default)]
pub enum ReturnOrder {
    /// Return tags in the order the names were given.
    #[default]
    Declaration,
    /// Return `tags[order[0]], tags[order[1]], ...`.
    ByIndex(Vec<usize>),
    /// Return the tags named, in the order named.
    ByName(Vec<String>),
}

/// Configuration for [`build_chain`].
#[derive(Debug, Clone, Default)]
pub struct ChainConfig {
    /// Indices into the name list that should be point-like tags.
    /// Point tags are registered but never wired into the chain.
    pub point_indices: HashSet<usize>,
    /// Permutation applied to the returned tags.
    pub return_order: ReturnOrder,
}

impl ChainConfig {
    /// Marks the names at `indices` as point-like.
    pub fn with_points(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.point_indices.extend(indices);
        self
    }

    /// Sets the return order.
    pub fn with_return_order(mut self, order: ReturnOrder) -> Self {
        self.return_order = order;
        self
    }
}

/// Synthesizes one tag per name and wires the interval tags into a single
/// containment chain in list order, bounded by fresh Top/Bottom sentinels.
///
/// Multiple calls never collide: every call mints its own sentinels, and
/// the returned handles are distinct even for repeated names.
///
/// # Errors
///
/// Fails with [`HierarchyError::EmptyChain`] for an empty name list and
/// [`HierarchyError::ReturnOrderMismatch`] when the requested return order
/// is not a permutation of the given names.
///
/// # Examples
///
/// ```
/// use tieralign_core::chain::{ChainConfig, build_chain};
/// use tieralign_core::hierarchy::Hierarchy;
///
/// let mut hierarchy = Hierarchy::new();
/// let tags = build_chain(
///     &mut hierarchy,
///     &["Word", "Phone"],
///     &ChainConfig::default(),
/// )
/// .unwrap();
///
/// assert_eq!(hierarchy.subset_of(tags[0]), Some(tags[1]));
/// assert!(hierarchy.is_top(hierarchy.superset_of(tags[0]).unwrap()));
/// ```
pub fn build_chain(
    hierarchy: &mut Hierarchy,
    names: &[&str],
    config: &ChainConfig,
) -> Result<Vec<TagId>, HierarchyError> {
    if names.is_empty() {
        return Err(HierarchyError::EmptyChain);
    }

    let top = hierarchy.top_sentinel();
    let bottom = hierarchy.bottom_sentinel();

    let tags: Vec<TagId> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let kind = if config.point_indices.contains(&idx) {
                TagKind::Point
            } else {
                TagKind::Interval
            };
            hierarchy.register(name, kind)
        })
        .collect();

    let interval_tags: Vec<TagId> = tags
        .iter()
        .copied()
        .filter(|&tag| hierarchy.kind(tag) == TagKind::Interval)
        .collect();

    if let (Some(&first), Some(&last)) = (interval_tags.first(), interval_tags.last()) {
        hierarchy.declare_container(first, top)?;
        for pair in interval_tags.windows(2) {
            hierarchy.declare_contained(pair[0], pair[1])?;
        }
        hierarchy.declare_contained(last, bottom)?;
    }

    debug!(
        names:? = names,
        intervals = interval_tags.len();
        "Built tag chain"
    );

    reorder(names, tags, &config.return_order)
}

fn reorder(
    names: &[&str],
    tags: Vec<TagId>,
    order: &ReturnOrder,
) -> Result<Vec<TagId>, HierarchyError> {
    match order {
        ReturnOrder::Declaration => Ok(tags),
        ReturnOrder::ByIndex(indices) => {
            let mut seen = vec![false; tags.len()];
            if indices.len() != tags.len() {
                return Err(HierarchyError::ReturnOrderMismatch);
            }
            for &idx in indices {
                if idx >= tags.len() || seen[idx] {
                    return Err(HierarchyError::ReturnOrderMismatch);
                }
                seen[idx] = true;
            }
            Ok(indices.iter().map(|&idx| tags[idx]).collect())
        }
        ReturnOrder::ByName(ordered_names) => {
            if ordered_names.len() != names.len() {
                return Err(HierarchyError::ReturnOrderMismatch);
            }
            let mut used = vec![false; names.len()];
            let mut out = Vec::with_capacity(tags.len());
            for wanted in ordered_names {
                // Repeated names consume declaration slots left to right.
                let slot = names
                    .iter()
                    .enumerate()
                    .find(|(idx, name)| **name == wanted.as_str() && !used[*idx])
                    .map(|(idx, _)| idx);
                match slot {
                    Some(idx) => {
                        used[idx] = true;
                        out.push(tags[idx]);
                    }
                    None => return Err(HierarchyError::ReturnOrderMismatch),
                }
            }
            Ok(out)
        }
    }
}

/// Walks the full chain containing `tag`, from the tag just under the Top
/// sentinel down to the tag just above the Bottom sentinel.
///
/// Sentinels are excluded. A tag outside any chain yields just itself.
pub fn chain_of(hierarchy: &Hierarchy, tag: TagId) -> Vec<TagId> {
    let mut head = tag;
    let mut hops = 0;
    while let Some(superset) = hierarchy.superset_of(head) {
        if hierarchy.is_top(superset) || hops > hierarchy.len() {
            break;
        }
        head = superset;
        hops += 1;
    }

    let mut chain = vec![head];
    let mut current = head;
    while let Some(subset) = hierarchy.subset_of(current) {
        if hierarchy.is_bottom(subset) || chain.len() > hierarchy.len() {
            break;
        }
        chain.push(subset);
        current = subset;
    }
    chain
}
