//! Stress tests: large trees, long operation runs, and `SyncBTree` under
//! concurrent readers and writers.
//!
//! Run in release mode; the million-item tests are slow in debug builds:
//! ```bash
//! cargo test --test stress_tests --release
//! ```

#![allow(clippy::pedantic)]
#![expect(clippy::unwrap_used)]

mod common;

use isobtree::{BTree, Natural, Options, PathHint, SyncBTree};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

const MILLION: u64 = 1_000_000;

/// A fixed permutation of `0..n` for `n` coprime with 7919.
fn scrambled(n: u64) -> impl Iterator<Item = u64> {
    (0..n).map(move |i| (i * 7_919 + 13) % n)
}

// =============================================================================
// Large single-threaded trees
// =============================================================================

#[test]
fn million_in_order() {
    common::init_tracing();

    let mut tree: BTree<u64> = BTree::new();
    for i in 0..MILLION {
        tree.insert(i);
    }

    assert!(tree.height() > 0);
    assert_eq!(tree.len(), MILLION as usize);
    tree.validate().unwrap();

    let mut visited = 0usize;
    let mut expected = 500_000u64;
    tree.ascend(Some(&500_000), |x| {
        assert_eq!(*x, expected);
        expected += 1;
        visited += 1;
        true
    });
    assert_eq!(visited, 500_000);

    for expected in 0..MILLION {
        assert_eq!(tree.pop_first(), Some(expected));
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
}

#[test]
fn million_scrambled_with_rank_and_hints() {
    common::init_tracing();

    let mut tree: BTree<u64> = BTree::new();
    let mut hint = PathHint::new();
    for k in scrambled(MILLION) {
        assert_eq!(tree.insert_hint(k, &mut hint), None);
    }
    assert_eq!(tree.len(), MILLION as usize);

    for i in (0..MILLION as usize).step_by(9_973) {
        assert_eq!(tree.get_at(i), Some(&(i as u64)));
    }

    // Drain from both ends and the middle
    for i in 0..100_000u64 {
        assert_eq!(tree.pop_last(), Some(MILLION - 1 - i));
        assert_eq!(tree.pop_first(), Some(i));
        let mid = tree.len() / 2;
        let expected = *tree.get_at(mid).unwrap();
        assert_eq!(tree.remove_at(mid), Some(expected));
    }
    assert_eq!(tree.len(), MILLION as usize - 300_000);
    tree.validate().unwrap();
}

#[test]
fn load_million_sorted() {
    let mut tree: BTree<u64> = BTree::new();
    for i in 0..MILLION {
        assert_eq!(tree.load(i), None);
    }

    assert_eq!(tree.len(), MILLION as usize);
    assert_eq!(tree.first(), Some(&0));
    assert_eq!(tree.last(), Some(&(MILLION - 1)));
    tree.validate().unwrap();
}

#[test]
fn string_range_matches_btreeset() {
    let words = ["ab", "aba", "abc", "a", "aa", "aaa", "b", "a-", "a!"];

    for degree in [0, 2, 3] {
        let mut tree: BTree<String> = BTree::with_options(Natural, Options::new().with_degree(degree));
        for w in words {
            tree.insert(w.to_owned());
        }
        let oracle: BTreeSet<String> = words.iter().map(|w| w.to_string()).collect();

        let mut seen = Vec::new();
        tree.ascend_range(&"ab".to_owned(), &"ac".to_owned(), |s| {
            seen.push(s.clone());
            true
        });

        let expected: Vec<String> = oracle
            .range("ab".to_owned().."ac".to_owned())
            .cloned()
            .collect();
        assert_eq!(seen, expected);
        assert_eq!(seen, ["ab", "aba", "abc"]);
    }
}

#[test]
fn churn_small_degree() {
    let mut tree = BTree::with_options(Natural, Options::new().with_degree(2));
    let mut oracle = BTreeSet::new();

    for round in 0..20u64 {
        for k in scrambled(10_007) {
            let k = (k + round * 31) % 10_007;
            if (k + round) % 3 == 0 {
                assert_eq!(tree.remove(&k), oracle.take(&k));
            } else {
                assert_eq!(tree.insert(k).is_some(), !oracle.insert(k));
            }
        }
        tree.validate().unwrap();
        assert_eq!(tree.len(), oracle.len());
    }

    assert_eq!(tree.values(), oracle.into_iter().collect::<Vec<_>>());
}

// =============================================================================
// SyncBTree readers and writers
// =============================================================================

#[test]
fn sync_readers_and_writers() {
    common::init_tracing();

    const WRITERS: u64 = 4;
    const PER_WRITER: u64 = 25_000;

    let tree: Arc<SyncBTree<u64>> = Arc::new(SyncBTree::new());
    let done = Arc::new(AtomicBool::new(false));
    let scans = Arc::new(AtomicUsize::new(0));

    let writers: Vec<_> = (0..WRITERS)
        .map(|t| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let mut hint = PathHint::new();
                for i in 0..PER_WRITER {
                    tree.insert_hint(i * WRITERS + t, &mut hint);
                }
                // Remove every other key this thread added
                for i in (0..PER_WRITER).step_by(2) {
                    assert_eq!(tree.remove(&(i * WRITERS + t)), Some(i * WRITERS + t));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let tree = Arc::clone(&tree);
            let done = Arc::clone(&done);
            let scans = Arc::clone(&scans);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let guard = tree.read();
                    let mut count = 0usize;
                    let mut prev: Option<u64> = None;
                    guard.scan(|x| {
                        assert!(prev.is_none_or(|p| p < *x));
                        prev = Some(*x);
                        count += 1;
                        true
                    });
                    assert_eq!(count, guard.len());
                    drop(guard);
                    scans.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for h in writers {
        h.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for h in readers {
        h.join().unwrap();
    }

    assert_eq!(tree.len() as u64, WRITERS * PER_WRITER / 2);
    tree.validate().unwrap();
    tracing::info!(scans = scans.load(Ordering::Relaxed), "reader scans completed");
}

#[test]
fn sync_mutating_traversals_are_exclusive() {
    let tree: Arc<SyncBTree<(u64, u64)>> = Arc::new(SyncBTree::new());
    for i in 0..10_000 {
        tree.load((i, 0));
    }

    // Each thread bumps every counter once; the write lock serialises them.
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                tree.scan_mut(|item| {
                    item.1 += 1;
                    true
                });
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    tree.scan(|item| {
        assert_eq!(item.1, 8);
        true
    });
}
