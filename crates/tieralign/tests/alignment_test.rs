//! Integration tests for the public tier-alignment API
//!
//! These tests walk the full word/phone workflow through the public
//! surface: chain construction, tier construction, grouping, lookup,
//! fusion, cleanup, and export.

use tieralign::{Arena, Tier, TierGroup};
use tieralign_core::chain::{ChainConfig, build_chain};
use tieralign_core::entry::Interval;
use tieralign_core::hierarchy::{Hierarchy, TagId};

fn the_dog(arena: &mut Arena) -> (Hierarchy, Vec<TagId>, TierGroup) {
    let mut hierarchy = Hierarchy::new();
    let tags = build_chain(&mut hierarchy, &["Word", "Phone"], &ChainConfig::default())
        .expect("chain should build");

    let words = Tier::from_intervals(
        arena,
        &hierarchy,
        tags[0],
        "words",
        &[
            Interval::new(0.0, 10.0, "the"),
            Interval::new(10.0, 25.0, "dog"),
        ],
    )
    .expect("word tier should build");
    let phones = Tier::from_intervals(
        arena,
        &hierarchy,
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
    .expect("phone tier should build");

    let group = TierGroup::new(arena, &hierarchy, vec![words, phones])
        .expect("group should assemble");
    (hierarchy, tags, group)
}

fn child_labels(arena: &Arena, group: &TierGroup, level: usize, index: usize) -> Vec<String> {
    let node = group.get(level).unwrap().get(index).unwrap();
    arena
        .node(node)
        .children()
        .iter()
        .map(|child| arena.node(child).label().to_string())
        .collect()
}

#[test]
fn test_words_adopt_their_phones() {
    let mut arena = Arena::new();
    let (_, _, group) = the_dog(&mut arena);

    assert_eq!(child_labels(&arena, &group, 0, 0), vec!["DH", "AH0"]);
    assert_eq!(child_labels(&arena, &group, 0, 1), vec!["D", "AO1", "G"]);

    for index in 0..2 {
        let word = group.get(0).unwrap().get(index).unwrap();
        assert!(arena.validate(word), "word {index} should tile snugly");
    }
}

#[test]
fn test_time_lookup() {
    let mut arena = Arena::new();
    let (_, _, group) = the_dog(&mut arena);

    let words = group.get(0).unwrap();
    assert_eq!(words.get_index_at_time(&arena, 12.0), Some(1));
    assert_eq!(words.get_index_at_time(&arena, 10.0), Some(1));
    assert_eq!(words.get_index_at_time(&arena, -3.0), None);

    assert_eq!(
        group.get_indexes_at_time(&arena, 12.0),
        vec![Some(1), Some(2)]
    );
}

#[test]
fn test_precedence_is_symmetric() {
    let mut arena = Arena::new();
    let (_, _, group) = the_dog(&mut arena);

    let phones = group.get(1).unwrap();
    for index in 0..phones.len() {
        let node = phones.get(index).unwrap();
        if let Some(fol) = arena.node(node).fol() {
            if !arena.node(fol).is_boundary() {
                assert_eq!(arena.node(fol).prev(), Some(node));
            }
        }
        if let Some(prev) = arena.node(node).prev() {
            if !arena.node(prev).is_boundary() {
                assert_eq!(arena.node(prev).fol(), Some(node));
            }
        }
    }
}

#[test]
fn test_fuse_merges_words_and_children() {
    let mut arena = Arena::new();
    let (_, _, mut group) = the_dog(&mut arena);

    let words_before = group.get(0).unwrap().len();
    let word_nodes: Vec<_> = group.get(0).unwrap().iter().collect();

    let the = word_nodes[0];
    let fusee = arena
        .fuse_following(the, |a, b| format!("{a} {b}"))
        .expect("adjacent words should fuse");

    assert_eq!(arena.node(the).label(), "the dog");
    assert_eq!(fusee, word_nodes[1]);
    // The fused word spans both originals and owns all five phones.
    assert_eq!(arena.node(the).children().len(), 5);
    assert!(arena.validate(the));

    group.pop(&mut arena, 0, fusee).expect("level is in range");
    assert_eq!(group.get(0).unwrap().len(), words_before - 1);
}

#[test]
fn test_cleanup_is_idempotent() {
    let mut arena = Arena::new();
    let mut hierarchy = Hierarchy::new();
    let tags = build_chain(&mut hierarchy, &["Word", "Phone"], &ChainConfig::default())
        .expect("chain should build");

    let words = Tier::from_intervals(
        &mut arena,
        &hierarchy,
        tags[0],
        "words",
        &[Interval::new(0.0, 10.0, "the")],
    )
    .expect("word tier should build");
    let phones = Tier::from_intervals(
        &mut arena,
        &hierarchy,
        tags[1],
        "phones",
        &[
            Interval::new(0.0, 5.0, "DH"),
            Interval::new(6.0, 10.0, "AH0"),
            Interval::new(11.0, 14.0, "D"),
        ],
    )
    .expect("phone tier should build");
    let mut group = TierGroup::new(&mut arena, &hierarchy, vec![words, phones])
        .expect("group should assemble");

    group.cleanup(&mut arena, &hierarchy).expect("cleanup should succeed");
    let word_count = group.get(0).unwrap().len();
    let phone_count = group.get(1).unwrap().len();

    // Every word now tiles snugly.
    for index in 0..word_count {
        let word = group.get(0).unwrap().get(index).unwrap();
        assert!(arena.validate(word));
    }

    group.cleanup(&mut arena, &hierarchy).expect("cleanup should succeed");
    assert_eq!(group.get(0).unwrap().len(), word_count);
    assert_eq!(group.get(1).unwrap().len(), phone_count);
}

#[test]
fn test_export_round_trip() {
    let mut arena = Arena::new();
    let (_, _, group) = the_dog(&mut arena);

    let words = group.get(0).unwrap().to_intervals(&arena);
    assert_eq!(
        words,
        vec![
            Interval::new(0.0, 10.0, "the"),
            Interval::new(10.0, 25.0, "dog"),
        ]
    );

    let phones = group.get(1).unwrap().to_intervals(&arena);
    assert_eq!(phones.len(), 5);
    assert_eq!(phones[0].label, "DH");
    assert_eq!(phones[4].label, "G");
}
