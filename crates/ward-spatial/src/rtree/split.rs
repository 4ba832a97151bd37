//! Node splitting and subtree selection.
//!
//! Insertion uses Guttman's heuristics: descend into the child needing the
//! least enlargement, and split overflowing nodes with the quadratic
//! algorithm, which picks the two entries that would waste the most volume
//! if grouped together as seeds and then assigns the rest one at a time.

use std::cmp::Ordering;

use crate::aabb::Aabb;
use crate::rtree::node::Bounded;

/// Cost key used to compare candidate boxes: volume first, margin second.
///
/// Region boxes are often flat (one block high), so volume alone ties far
/// too often to be useful.
fn cost_cmp(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1))
}

fn growth(current: &Aabb, added: &Aabb) -> (f64, f64) {
    let union = current.union(added);
    (
        union.volume() - current.volume(),
        union.margin() - current.margin(),
    )
}

/// Picks the child whose box grows least to cover `bbox`.
///
/// Ties go to the smaller child box, then to the child with fewer entries.
pub(crate) fn choose_subtree<T: Bounded>(
    children: &[T],
    bbox: &Aabb,
    len_of: impl Fn(&T) -> usize,
) -> usize {
    let mut best = 0;
    let mut best_key: Option<((f64, f64), (f64, f64), usize)> = None;

    for (index, child) in children.iter().enumerate() {
        let current = child.bbox();
        let key = (
            growth(current, bbox),
            (current.volume(), current.margin()),
            len_of(child),
        );
        let better = best_key.as_ref().is_none_or(|best| {
            cost_cmp(key.0, best.0)
                .then(cost_cmp(key.1, best.1))
                .then(key.2.cmp(&best.2))
                == Ordering::Less
        });
        if better {
            best = index;
            best_key = Some(key);
        }
    }

    best
}

/// Returns the pair of indices that waste the most space when boxed together.
fn pick_seeds<T: Bounded>(items: &[T]) -> (usize, usize) {
    let mut seeds = (0, 1);
    let mut worst: Option<(f64, f64)> = None;

    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let a = items[i].bbox();
            let b = items[j].bbox();
            let union = a.union(b);
            let waste = (
                union.volume() - a.volume() - b.volume(),
                union.margin() - a.margin() - b.margin(),
            );
            if worst.is_none_or(|w| cost_cmp(waste, w) == Ordering::Greater) {
                worst = Some(waste);
                seeds = (i, j);
            }
        }
    }

    seeds
}

/// Splits an overflowing set of entries into two groups.
///
/// Both groups receive at least `min` entries. `items` must hold at least
/// two entries and at least `2 * min`.
pub(crate) fn quadratic_split<T: Bounded>(mut items: Vec<T>, min: usize) -> (Vec<T>, Vec<T>) {
    let (first, second) = pick_seeds(&items);

    // `second > first`, so removing it first leaves `first` in place.
    let seed_b = items.swap_remove(second);
    let seed_a = items.swap_remove(first);

    let mut box_a = *seed_a.bbox();
    let mut box_b = *seed_b.bbox();
    let mut group_a = vec![seed_a];
    let mut group_b = vec![seed_b];

    while !items.is_empty() {
        // Top up whichever group would otherwise end below the minimum.
        if group_a.len() + items.len() <= min {
            for item in items.drain(..) {
                box_a = box_a.union(item.bbox());
                group_a.push(item);
            }
            break;
        }
        if group_b.len() + items.len() <= min {
            for item in items.drain(..) {
                box_b = box_b.union(item.bbox());
                group_b.push(item);
            }
            break;
        }

        // Pick the entry with the strongest preference for one group.
        let mut next = 0;
        let mut strongest = f64::NEG_INFINITY;
        for (index, item) in items.iter().enumerate() {
            let da = growth(&box_a, item.bbox());
            let db = growth(&box_b, item.bbox());
            let preference = (da.0 - db.0).abs() + (da.1 - db.1).abs() * f64::EPSILON;
            if preference > strongest {
                strongest = preference;
                next = index;
            }
        }

        let item = items.swap_remove(next);
        let da = growth(&box_a, item.bbox());
        let db = growth(&box_b, item.bbox());
        let to_a = match cost_cmp(da, db) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => match cost_cmp(
                (box_a.volume(), box_a.margin()),
                (box_b.volume(), box_b.margin()),
            ) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => group_a.len() <= group_b.len(),
            },
        };

        if to_a {
            box_a = box_a.union(item.bbox());
            group_a.push(item);
        } else {
            box_b = box_b.union(item.bbox());
            group_b.push(item);
        }
    }

    (group_a, group_b)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rtree::node::Entry;
    use nalgebra::Point3;

    fn entry(key: u32, x: f64) -> Entry<u32> {
        Entry {
            key,
            bbox: Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0)).unwrap(),
        }
    }

    #[test]
    fn test_split_respects_minimum() {
        let items: Vec<_> = (0..9).map(|i| entry(i, f64::from(i) * 2.0)).collect();
        let (a, b) = quadratic_split(items, 4);
        assert_eq!(a.len() + b.len(), 9);
        assert!(a.len() >= 4);
        assert!(b.len() >= 4);
    }

    #[test]
    fn test_split_separates_clusters() {
        let mut items: Vec<_> = (0..4).map(|i| entry(i, f64::from(i))).collect();
        items.extend((4..8).map(|i| entry(i, 1000.0 + f64::from(i))));
        let (a, b) = quadratic_split(items, 2);

        let low = |g: &[Entry<u32>]| g.iter().all(|e| e.key < 4);
        let high = |g: &[Entry<u32>]| g.iter().all(|e| e.key >= 4);
        assert!((low(&a) && high(&b)) || (high(&a) && low(&b)));
    }

    #[test]
    fn test_split_flat_boxes() {
        // Zero-volume boxes must still split by extent.
        let items: Vec<_> = (0..6)
            .map(|i| Entry {
                key: i,
                bbox: Aabb::point(Point3::new(f64::from(i) * 10.0, 0.0, 0.0)),
            })
            .collect();
        let (a, b) = quadratic_split(items, 2);
        assert!(a.len() >= 2 && b.len() >= 2);
    }

    #[test]
    fn test_choose_subtree_least_enlargement() {
        let children = vec![entry(0, 0.0), entry(1, 10.0), entry(2, 20.0)];
        let target = Aabb::new(Point3::new(10.2, 0.2, 0.2), Point3::new(10.8, 0.8, 0.8)).unwrap();
        assert_eq!(choose_subtree(&children, &target, |_| 1), 1);
    }

    #[test]
    fn test_choose_subtree_tie_prefers_smaller_box() {
        let big = Entry {
            key: 0,
            bbox: Aabb::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0)).unwrap(),
        };
        let small = Entry {
            key: 1,
            bbox: Aabb::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0)).unwrap(),
        };
        let target = Aabb::point(Point3::new(1.0, 1.0, 1.0));
        assert_eq!(choose_subtree(&[big, small], &target, |_| 1), 1);
    }
}
