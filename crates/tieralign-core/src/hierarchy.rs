//! The annotation-class registry.
//!
//! Annotation classes ("tags") such as `Word` or `Phone` are not run-time
//! types; they are entries in a [`Hierarchy`] registry. Each tag declares at
//! most one tag allowed to contain it (its *superset*) and at most one tag
//! it is allowed to contain (its *subset*). Two sentinel kinds terminate
//! every chain: a `Top` sentinel that nothing may contain, and a `Bottom`
//! sentinel that contains nothing.
//!
//! Tags form a singly-branching chain, never a general graph. Declarations
//! are tag-level and shared by all instances of the tag: re-declaring a
//! relationship after nodes exist changes validation behavior for new
//! relationships only. Callers should therefore freeze declarations before
//! bulk construction.

use log::warn;
use thiserror::Error;

use crate::identifier::Id;

/// Error type for tag-declaration violations.
///
/// These always indicate a programming error in the hierarchy setup and are
/// surfaced immediately; they are never downgraded to warnings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HierarchyError {
    /// A tag was declared as its own container or member.
    #[error("tag `{0}` cannot be declared as its own container or member")]
    SelfReference(String),

    /// A Top sentinel was placed inside a container.
    #[error("`{0}` is a Top sentinel and cannot be placed inside a container")]
    TopHasNoContainer(String),

    /// A Bottom sentinel was declared to contain something.
    #[error("`{0}` is a Bottom sentinel and cannot contain anything")]
    BottomHasNoContents(String),

    /// A tag of an unsuitable kind was used in container position.
    #[error("`{tag}` ({kind:?}) cannot act as a container")]
    NotAContainer {
        /// The offending tag name.
        tag: String,
        /// The offending tag kind.
        kind: TagKind,
    },

    /// A tag of an unsuitable kind was used in member position.
    #[error("`{tag}` ({kind:?}) cannot take part in a containment chain")]
    NotChainable {
        /// The offending tag name.
        tag: String,
        /// The offending tag kind.
        kind: TagKind,
    },

    /// A tag handle from a different (or stale) hierarchy was used.
    #[error("tag handle {0} does not belong to this hierarchy")]
    UnknownTag(usize),

    /// A chain return order did not match the declared names.
    #[error("return order does not match the declared chain names")]
    ReturnOrderMismatch,

    /// A chain was requested with no tag names.
    #[error("a chain needs at least one tag name")]
    EmptyChain,
}

/// The kind of a registered tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Sentinel kind: nothing may contain a Top tag.
    Top,
    /// Sentinel kind: a Bottom tag contains nothing.
    Bottom,
    /// An interval-like annotation class.
    Interval,
    /// A point-like annotation class. Points never join containment chains.
    Point,
}

/// An opaque handle to a registered tag.
///
/// Handles are indices into the owning [`Hierarchy`]'s descriptor arena and
/// are only meaningful together with that hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagId(u32);

impl TagId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct TagEntry {
    name: Id,
    kind: TagKind,
    superset: Option<TagId>,
    subset: Option<TagId>,
}

/// The registry of annotation-class descriptors.
///
/// A `Hierarchy` is a plain mutable value with explicit ownership: pass it
/// by reference to whatever constructs tiers, and create a fresh one per
/// test. There is no process-wide registry.
///
/// # Examples
///
/// ```
/// use tieralign_core::hierarchy::{Hierarchy, TagKind};
///
/// let mut hierarchy = Hierarchy::new();
/// let word = hierarchy.register("Word", TagKind::Interval);
/// let phone = hierarchy.register("Phone", TagKind::Interval);
///
/// hierarchy.declare_contained(word, phone).unwrap();
///
/// assert_eq!(hierarchy.subset_of(word), Some(phone));
/// assert_eq!(hierarchy.superset_of(phone), Some(word));
/// ```
#[derive(Debug, Default)]
pub struct Hierarchy {
    tags: Vec<TagEntry>,
    top_count: usize,
    bottom_count: usize,
}

impl Hierarchy {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new tag of the given kind and returns its handle.
    pub fn register(&mut self, name: &str, kind: TagKind) -> TagId {
        let id = TagId(self.tags.len() as u32);
        self.tags.push(TagEntry {
            name: Id::new(name),
            kind,
            superset: None,
            subset: None,
        });
        id
    }

    /// Registers a fresh, uniquely named Top sentinel.
    ///
    /// Each call mints a new sentinel (`Top_0`, `Top_1`, ...) so that
    /// independently built chains never collide.
    pub fn top_sentinel(&mut self) -> TagId {
        let name = format!("Top_{}", self.top_count);
        self.top_count += 1;
        self.register(&name, TagKind::Top)
    }

    /// Registers a fresh, uniquely named Bottom sentinel.
    pub fn bottom_sentinel(&mut self) -> TagId {
        let name = format!("Bottom_{}", self.bottom_count);
        self.bottom_count += 1;
        self.register(&name, TagKind::Bottom)
    }

    fn entry(&self, tag: TagId) -> Result<&TagEntry, HierarchyError> {
        self.tags
            .get(tag.index())
            .ok_or(HierarchyError::UnknownTag(tag.index()))
    }

    /// Returns the name of a tag.
    ///
    /// # Panics
    /// Panics if the handle does not belong to this hierarchy.
    pub fn name(&self, tag: TagId) -> Id {
        self.tags[tag.index()].name
    }

    /// Returns the kind of a tag.
    ///
    /// # Panics
    /// Panics if the handle does not belong to this hierarchy.
    pub fn kind(&self, tag: TagId) -> TagKind {
        self.tags[tag.index()].kind
    }

    /// Whether the tag is a Top sentinel.
    pub fn is_top(&self, tag: TagId) -> bool {
        self.kind(tag) == TagKind::Top
    }

    /// Whether the tag is a Bottom sentinel.
    pub fn is_bottom(&self, tag: TagId) -> bool {
        self.kind(tag) == TagKind::Bottom
    }

    /// The tag declared as the direct container of `tag`, if any.
    pub fn superset_of(&self, tag: TagId) -> Option<TagId> {
        self.tags.get(tag.index()).and_then(|entry| entry.superset)
    }

    /// The tag `tag` is declared to contain, if any.
    pub fn subset_of(&self, tag: TagId) -> Option<TagId> {
        self.tags.get(tag.index()).and_then(|entry| entry.subset)
    }

    /// Number of registered tags, sentinels included.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Declares `superset` as the tag allowed to contain `tag`.
    ///
    /// Also sets `tag` as the subset of `superset` (the edge is
    /// bidirectional) unless that is already the case, so that chains built
    /// from either end stay consistent.
    ///
    /// # Errors
    ///
    /// Fails if `superset` is `tag` itself, if `tag` is a Top sentinel or a
    /// point tag, if `superset` cannot contain anything (Bottom or point
    /// kinds), or if either handle is unknown.
    pub fn declare_container(
        &mut self,
        tag: TagId,
        superset: TagId,
    ) -> Result<(), HierarchyError> {
        if tag == superset {
            return Err(HierarchyError::SelfReference(
                self.entry(tag)?.name.to_string(),
            ));
        }
        match self.entry(tag)?.kind {
            TagKind::Top => {
                return Err(HierarchyError::TopHasNoContainer(
                    self.entry(tag)?.name.to_string(),
                ));
            }
            TagKind::Point => {
                return Err(HierarchyError::NotChainable {
                    tag: self.entry(tag)?.name.to_string(),
                    kind: TagKind::Point,
                });
            }
            TagKind::Interval | TagKind::Bottom => {}
        }
        match self.entry(superset)?.kind {
            TagKind::Bottom => {
                return Err(HierarchyError::BottomHasNoContents(
                    self.entry(superset)?.name.to_string(),
                ));
            }
            TagKind::Point => {
                return Err(HierarchyError::NotAContainer {
                    tag: self.entry(superset)?.name.to_string(),
                    kind: TagKind::Point,
                });
            }
            TagKind::Interval | TagKind::Top => {}
        }

        self.tags[tag.index()].superset = Some(superset);
        // Mirror the edge, guarding against infinite recursion.
        if self.tags[superset.index()].subset != Some(tag) {
            self.declare_contained(superset, tag)?;
        }
        Ok(())
    }

    /// Declares `subset` as the tag `tag` is allowed to contain.
    ///
    /// Symmetric to [`Hierarchy::declare_container`]; also sets `tag` as the
    /// superset of `subset` unless already set.
    ///
    /// # Errors
    ///
    /// Fails if `subset` is `tag` itself, if `tag` is a Bottom sentinel or
    /// a point tag, if `subset` cannot be contained (Top or point kinds),
    /// or if either handle is unknown.
    pub fn declare_contained(&mut self, tag: TagId, subset: TagId) -> Result<(), HierarchyError> {
        if tag == subset {
            return Err(HierarchyError::SelfReference(
                self.entry(tag)?.name.to_string(),
            ));
        }
        match self.entry(tag)?.kind {
            TagKind::Bottom => {
                return Err(HierarchyError::BottomHasNoContents(
                    self.entry(tag)?.name.to_string(),
                ));
            }
            TagKind::Point => {
                return Err(HierarchyError::NotAContainer {
                    tag: self.entry(tag)?.name.to_string(),
                    kind: TagKind::Point,
                });
            }
            TagKind::Interval | TagKind::Top => {}
        }
        match self.entry(subset)?.kind {
            TagKind::Top => {
                return Err(HierarchyError::TopHasNoContainer(
                    self.entry(subset)?.name.to_string(),
                ));
            }
            TagKind::Point => {
                return Err(HierarchyError::NotChainable {
                    tag: self.entry(subset)?.name.to_string(),
                    kind: TagKind::Point,
                });
            }
            TagKind::Interval | TagKind::Bottom => {}
        }

        self.tags[tag.index()].subset = Some(subset);
        if self.tags[subset.index()].superset != Some(tag) {
            self.declare_container(subset, tag)?;
        }
        Ok(())
    }

    /// Looks up a non-sentinel tag by name.
    ///
    /// Zero or multiple matches are advisory conditions, not errors: both
    /// return `None` with a warning, since callers holding only a name can
    /// usually recover by other means.
    pub fn tag_by_name(&self, name: &str) -> Option<TagId> {
        let mut matches = self.tags.iter().enumerate().filter(|(_, entry)| {
            entry.name == *name && matches!(entry.kind, TagKind::Interval | TagKind::Point)
        });

        let first = matches.next();
        if matches.next().is_some() {
            warn!(name; "multiple tags match this name");
            return None;
        }
        match first {
            Some((idx, _)) => Some(TagId(idx as u32)),
            None => {
                warn!(name; "no tag matches this name");
                None
            }
        }
    }
}
