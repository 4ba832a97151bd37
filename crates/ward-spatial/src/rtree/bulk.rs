//! Sort-Tile-Recursive bulk loading.
//!
//! Entries are sorted by box center along X and cut into vertical slabs,
//! each slab is sorted along Y and cut into columns, and each column is
//! sorted along Z and cut into nodes. The same tiling is then applied to
//! the nodes to build the next level, until a single root remains.
//!
//! Node sizes are spread evenly across a level instead of filling every
//! node to capacity, so the last node never ends up below the minimum.

use crate::aabb::Aabb;
use crate::rtree::node::{Bounded, Child, Entry, Node};

fn center_on(bbox: &Aabb, axis: usize) -> f64 {
    // Twice the center; only the ordering matters.
    match axis {
        0 => bbox.min.x + bbox.max.x,
        1 => bbox.min.y + bbox.max.y,
        _ => bbox.min.z + bbox.max.z,
    }
}

fn sort_along<T: Bounded>(items: &mut [T], axis: usize) {
    items.sort_by(|a, b| center_on(a.bbox(), axis).total_cmp(&center_on(b.bbox(), axis)));
}

/// Sizes for `len` items packed into the fewest nodes of at most `max`,
/// spread so that no two sizes differ by more than one.
pub(crate) fn even_sizes(len: usize, max: usize) -> Vec<usize> {
    let groups = len.div_ceil(max).max(1);
    let base = len / groups;
    let extra = len % groups;
    (0..groups).map(|i| base + usize::from(i < extra)).collect()
}

/// Number of slabs per axis for `groups` nodes tiled in three dimensions.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn slabs_for(groups: usize) -> usize {
    ((groups as f64).cbrt().ceil() as usize).max(1)
}

/// Splits a run of node sizes into at most `parts` consecutive runs.
fn runs(sizes: &[usize], parts: usize) -> std::slice::Chunks<'_, usize> {
    let per = sizes.len().div_ceil(parts.max(1)).max(1);
    sizes.chunks(per)
}

/// Tiles `items` into groups of at most `max`, nearby items together.
pub(crate) fn tile<T: Bounded>(mut items: Vec<T>, max: usize) -> Vec<Vec<T>> {
    let sizes = even_sizes(items.len(), max);
    let slabs = slabs_for(sizes.len());
    let mut groups = Vec::with_capacity(sizes.len());

    sort_along(&mut items, 0);
    let mut items = items.into_iter();

    for slab_sizes in runs(&sizes, slabs) {
        let slab_len: usize = slab_sizes.iter().sum();
        let mut slab: Vec<T> = items.by_ref().take(slab_len).collect();
        sort_along(&mut slab, 1);
        let mut slab = slab.into_iter();

        for column_sizes in runs(slab_sizes, slabs) {
            let column_len: usize = column_sizes.iter().sum();
            let mut column: Vec<T> = slab.by_ref().take(column_len).collect();
            sort_along(&mut column, 2);
            let mut column = column.into_iter();

            for &size in column_sizes {
                groups.push(column.by_ref().take(size).collect());
            }
        }
    }

    groups
}

/// Builds a tree from leaf entries. Returns the root and the tree height.
pub(crate) fn build<K>(entries: Vec<Entry<K>>, max: usize) -> (Node<K>, usize) {
    if entries.len() <= max {
        return (Node::Leaf(entries), 1);
    }

    let mut level: Vec<Node<K>> = tile(entries, max).into_iter().map(Node::Leaf).collect();
    let mut height = 1;

    while level.len() > max {
        let children: Vec<Child<K>> = level.into_iter().map(Child::new).collect();
        level = tile(children, max)
            .into_iter()
            .map(Node::Internal)
            .collect();
        height += 1;
    }

    let root = if level.len() == 1 {
        level.pop().unwrap_or_else(Node::empty_leaf)
    } else {
        height += 1;
        Node::Internal(level.into_iter().map(Child::new).collect())
    };

    (root, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_sizes_never_underfill() {
        assert_eq!(even_sizes(17, 16), vec![9, 8]);
        assert_eq!(even_sizes(16, 16), vec![16]);
        assert_eq!(even_sizes(33, 16), vec![11, 11, 11]);
        for len in 17..500 {
            let sizes = even_sizes(len, 16);
            assert_eq!(sizes.iter().sum::<usize>(), len);
            assert!(sizes.iter().all(|&s| (8..=16).contains(&s)), "{len}: {sizes:?}");
        }
    }

    #[test]
    fn test_slabs_for() {
        assert_eq!(slabs_for(1), 1);
        assert_eq!(slabs_for(2), 2);
        assert_eq!(slabs_for(9), 3);
        assert_eq!(slabs_for(28), 4);
    }

    #[test]
    fn test_runs_cover_all_sizes() {
        let sizes = [4, 4, 4, 4, 4];
        let collected: Vec<usize> = runs(&sizes, 2).flatten().copied().collect();
        assert_eq!(collected, sizes);
        assert_eq!(runs(&sizes, 2).count(), 2);
    }
}
