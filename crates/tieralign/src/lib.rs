//! Tieralign - hierarchically aligned interval and point annotation tiers.
//!
//! Annotation tiers (words, syllables, phones) from forced alignment live
//! in parallel, with every word spanning the phones inside it. This crate
//! models those tiers as an arena of nodes related three ways: precedence
//! (`prev`/`fol` within a tier), containment (parent/children across
//! tiers), and tag identity (the class chain declared in a
//! [`hierarchy::Hierarchy`]). A [`TierGroup`] arranges a speaker's tiers
//! along their tag chain and keeps them aligned.
//!
//! # Examples
//!
//! ```
//! use tieralign::{Arena, Tier, TierGroup};
//! use tieralign_core::chain::{ChainConfig, build_chain};
//! use tieralign_core::entry::Interval;
//! use tieralign_core::hierarchy::Hierarchy;
//!
//! let mut hierarchy = Hierarchy::new();
//! let tags = build_chain(&mut hierarchy, &["Word", "Phone"], &ChainConfig::default())
//!     .unwrap();
//!
//! let mut arena = Arena::new();
//! let words = Tier::from_intervals(
//!     &mut arena,
//!     &hierarchy,
//!     tags[0],
//!     "words",
//!     &[Interval::new(0.0, 10.0, "the"), Interval::new(10.0, 25.0, "dog")],
//! )
//! .unwrap();
//! let phones = Tier::from_intervals(
//!     &mut arena,
//!     &hierarchy,
//!     tags[1],
//!     "phones",
//!     &[
//!         Interval::new(0.0, 5.0, "DH"),
//!         Interval::new(5.0, 10.0, "AH0"),
//!         Interval::new(10.0, 15.0, "D"),
//!         Interval::new(15.0, 20.0, "AO1"),
//!         Interval::new(20.0, 25.0, "G"),
//!     ],
//! )
//! .unwrap();
//!
//! let group = TierGroup::new(&mut arena, &hierarchy, vec![words, phones]).unwrap();
//!
//! let the = group.get(0).unwrap().get(0).unwrap();
//! assert_eq!(arena.node(the).children().len(), 2);
//! assert_eq!(group.get(1).unwrap().get_index_at_time(&arena, 12.0), Some(2));
//! ```

pub mod arena;
pub mod error;
pub mod group;
pub mod list;
pub mod tier;

pub use tieralign_core::{chain, entry, hierarchy, identifier};

pub use arena::{Arena, Node, NodeId};
pub use error::{RelationError, Result};
pub use group::{Anchor, PointGroup, TierGroup, TimingFrom};
pub use list::NodeList;
pub use tier::Tier;
