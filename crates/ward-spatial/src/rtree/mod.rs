//! R-tree over axis-aligned boxes.
//!
//! [`RTree`] maps keys to [`Aabb`]s and answers "which boxes contain this
//! point" and "which boxes touch this box" without scanning every entry.
//!
//! # Structure
//!
//! - Every leaf sits at the same depth.
//! - Every node except the root holds between `min_children` and
//!   `max_children` entries.
//! - Every internal node stores, per child, the exact box covering that
//!   child's subtree.
//!
//! Nodes are shared through `Arc`, so `clone()` is cheap and a mutation on
//! the clone copies only the root-to-leaf paths it rewrites. A published
//! tree can keep serving readers while a modified copy is being prepared.
//!
//! # Example
//!
//! ```
//! use ward_spatial::{Aabb, RTree};
//! use nalgebra::Point3;
//!
//! let mut tree = RTree::new();
//! tree.insert("spawn", Aabb::new(Point3::new(-10.0, 0.0, -10.0), Point3::new(10.0, 64.0, 10.0))?)?;
//! tree.insert("arena", Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 10.0, 5.0))?)?;
//!
//! let mut hits = tree.query_point(&Point3::new(2.0, 5.0, 2.0));
//! hits.sort_unstable();
//! assert_eq!(hits, vec!["arena", "spawn"]);
//!
//! tree.remove(&"arena")?;
//! assert_eq!(tree.query_point(&Point3::new(2.0, 5.0, 2.0)), vec!["spawn"]);
//! # Ok::<(), ward_spatial::SpatialError>(())
//! ```

mod bulk;
mod node;
mod split;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use hashbrown::HashMap;
use nalgebra::Point3;
use smallvec::SmallVec;

use crate::aabb::Aabb;
use crate::config::RTreeConfig;
use crate::error::SpatialError;
use node::{Child, Entry, Node};

/// Traversal stack; deep enough for any tree that fits in memory.
type Stack<'a, K> = SmallVec<[&'a Node<K>; 32]>;

/// Shape statistics for an [`RTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Number of indexed keys.
    pub entries: usize,
    /// Number of levels; a tree whose root is a leaf has height 1.
    pub height: usize,
    /// Total number of nodes.
    pub nodes: usize,
}

/// Work done by a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryStats {
    /// Nodes whose entries were tested.
    pub nodes_visited: usize,
    /// Leaf entries tested against the query.
    pub entries_tested: usize,
}

/// A spatial index from keys to axis-aligned boxes.
///
/// Keys are unique; inserting an existing key is an error. A key's box is
/// fixed while it is indexed. To move it, remove it and insert it again.
#[derive(Clone)]
pub struct RTree<K> {
    root: Arc<Node<K>>,
    boxes: HashMap<K, Aabb>,
    height: usize,
    config: RTreeConfig,
}

impl<K> fmt::Debug for RTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTree")
            .field("len", &self.boxes.len())
            .field("height", &self.height)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<K: Clone + Eq + Hash> Default for RTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> RTree<K> {
    /// Creates an empty tree with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::empty(RTreeConfig::default())
    }

    /// Creates an empty tree with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn with_config(config: RTreeConfig) -> Result<Self, SpatialError> {
        check_config(&config)?;
        Ok(Self::empty(config))
    }

    fn empty(config: RTreeConfig) -> Self {
        Self {
            root: Arc::new(Node::empty_leaf()),
            boxes: HashMap::new(),
            height: 1,
            config,
        }
    }

    /// Returns the number of indexed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Returns the tree configuration.
    #[must_use]
    pub const fn config(&self) -> &RTreeConfig {
        &self.config
    }

    /// Returns the number of levels. An empty tree has height 1.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` if `key` is indexed.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.boxes.contains_key(key)
    }

    /// Returns the box indexed under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&Aabb> {
        self.boxes.get(key)
    }

    /// Iterates over all keys in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.boxes.keys()
    }

    /// Iterates over all `(key, box)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Aabb)> {
        self.boxes.iter()
    }

    /// Returns the box covering every entry, or `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.bbox()
    }

    /// Returns shape statistics.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            entries: self.boxes.len(),
            height: self.height,
            nodes: self.root.node_count(),
        }
    }

    /// Calls `visit` for every entry whose box contains `point`.
    ///
    /// Boxes are closed: a point on a face counts as inside.
    pub fn for_each_containing(&self, point: &Point3<f64>, mut visit: impl FnMut(&K, &Aabb)) {
        self.walk(
            |bbox| bbox.contains(point),
            |entry| visit(&entry.key, &entry.bbox),
        );
    }

    /// Calls `visit` for every entry whose box intersects `area`.
    ///
    /// Boxes that only share a face or an edge with `area` are reported.
    pub fn for_each_intersecting(&self, area: &Aabb, mut visit: impl FnMut(&K, &Aabb)) {
        self.walk(
            |bbox| bbox.intersects(area),
            |entry| visit(&entry.key, &entry.bbox),
        );
    }

    /// Returns the keys of all entries whose box contains `point`.
    ///
    /// Order is unspecified.
    #[must_use]
    pub fn query_point(&self, point: &Point3<f64>) -> Vec<K> {
        let mut hits = Vec::new();
        self.for_each_containing(point, |key, _| hits.push(key.clone()));
        hits
    }

    /// Returns the keys of all entries whose box intersects `area`.
    ///
    /// Order is unspecified.
    #[must_use]
    pub fn query_box(&self, area: &Aabb) -> Vec<K> {
        let mut hits = Vec::new();
        self.for_each_intersecting(area, |key, _| hits.push(key.clone()));
        hits
    }

    /// Like [`query_point`](Self::query_point), also reporting the work done.
    #[must_use]
    pub fn query_point_with_stats(&self, point: &Point3<f64>) -> (Vec<K>, QueryStats) {
        let mut hits = Vec::new();
        let stats = self.walk(
            |bbox| bbox.contains(point),
            |entry| hits.push(entry.key.clone()),
        );
        (hits, stats)
    }

    /// Depth-first traversal that only descends into children whose box
    /// passes `accept`, and reports every accepted leaf entry.
    fn walk(
        &self,
        accept: impl Fn(&Aabb) -> bool,
        mut visit: impl FnMut(&Entry<K>),
    ) -> QueryStats {
        let mut stats = QueryStats::default();
        let mut stack: Stack<'_, K> = SmallVec::new();
        stack.push(self.root.as_ref());

        while let Some(node) = stack.pop() {
            stats.nodes_visited += 1;
            match node {
                Node::Leaf(entries) => {
                    for entry in entries {
                        stats.entries_tested += 1;
                        if accept(&entry.bbox) {
                            visit(entry);
                        }
                    }
                }
                Node::Internal(children) => {
                    for child in children {
                        if accept(&child.bbox) {
                            stack.push(child.node.as_ref());
                        }
                    }
                }
            }
        }

        stats
    }
}

impl<K: Clone + Eq + Hash + fmt::Display> RTree<K> {
    /// Builds a tree from `(key, box)` pairs with Sort-Tile-Recursive
    /// packing.
    ///
    /// Equivalent to inserting every pair one by one, but produces a tree
    /// with less node overlap in a fraction of the time.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::InvalidConfig`] if `config` does not validate.
    /// - [`SpatialError::InvalidBox`] if any box is malformed.
    /// - [`SpatialError::DuplicateKey`] if a key appears twice.
    pub fn bulk_load(
        items: impl IntoIterator<Item = (K, Aabb)>,
        config: RTreeConfig,
    ) -> Result<Self, SpatialError> {
        check_config(&config)?;

        let items = items.into_iter();
        let mut boxes = HashMap::with_capacity(items.size_hint().0);
        let mut entries = Vec::with_capacity(items.size_hint().0);

        for (key, bbox) in items {
            bbox.validate()?;
            if boxes.insert(key.clone(), bbox).is_some() {
                return Err(SpatialError::DuplicateKey(key.to_string()));
            }
            entries.push(Entry { key, bbox });
        }

        let (root, height) = bulk::build(entries, config.max_children());
        Ok(Self {
            root: Arc::new(root),
            boxes,
            height,
            config,
        })
    }

    /// Indexes `key` under `bbox`.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::InvalidBox`] if `bbox` is malformed.
    /// - [`SpatialError::DuplicateKey`] if `key` is already indexed.
    pub fn insert(&mut self, key: K, bbox: Aabb) -> Result<(), SpatialError> {
        bbox.validate()?;
        if self.boxes.contains_key(&key) {
            return Err(SpatialError::DuplicateKey(key.to_string()));
        }

        self.insert_entry(Entry {
            key: key.clone(),
            bbox,
        });
        self.boxes.insert(key, bbox);
        Ok(())
    }

    /// Removes `key` and returns the box it was indexed under.
    ///
    /// Nodes left below the minimum fill are dissolved and their entries
    /// reinserted from the root.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::KeyNotFound`] if `key` is not indexed.
    /// - [`SpatialError::CorruptTree`] if the key is recorded but no leaf
    ///   holds it. The tree is left unchanged.
    pub fn remove(&mut self, key: &K) -> Result<Aabb, SpatialError> {
        let bbox = *self
            .boxes
            .get(key)
            .ok_or_else(|| SpatialError::KeyNotFound(key.to_string()))?;

        let mut path = Vec::with_capacity(self.height);
        if !find_path(&self.root, key, &bbox, &mut path) {
            return Err(SpatialError::corrupt(format!(
                "key {key} is recorded but no leaf holds it"
            )));
        }

        let mut orphans = Vec::new();
        remove_along(
            Arc::make_mut(&mut self.root),
            &path,
            key,
            self.config.min_children(),
            &mut orphans,
        );
        self.boxes.remove(key);
        self.shrink_root();

        for entry in orphans {
            self.insert_entry(entry);
        }

        Ok(bbox)
    }

    /// Removes every entry, keeping the configuration.
    pub fn clear(&mut self) {
        *self = Self::empty(self.config);
    }

    /// Checks every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::CorruptTree`] describing the first violation.
    pub fn check_invariants(&self) -> Result<(), SpatialError> {
        let mut seen = 0;
        self.check_node(&self.root, 1, true, &mut seen)?;
        if seen != self.boxes.len() {
            return Err(SpatialError::corrupt(format!(
                "leaves hold {seen} entries but {} keys are recorded",
                self.boxes.len()
            )));
        }
        Ok(())
    }

    fn check_node(
        &self,
        node: &Node<K>,
        depth: usize,
        is_root: bool,
        seen: &mut usize,
    ) -> Result<(), SpatialError> {
        let len = node.len();
        let max = self.config.max_children();
        let min = self.config.min_children();

        if len > max {
            return Err(SpatialError::corrupt(format!(
                "node at depth {depth} holds {len} entries, max is {max}"
            )));
        }
        if !is_root && len < min {
            return Err(SpatialError::corrupt(format!(
                "node at depth {depth} holds {len} entries, min is {min}"
            )));
        }

        match node {
            Node::Leaf(entries) => {
                if depth != self.height {
                    return Err(SpatialError::corrupt(format!(
                        "leaf at depth {depth}, tree height is {}",
                        self.height
                    )));
                }
                for entry in entries {
                    match self.boxes.get(&entry.key) {
                        Some(recorded) if *recorded == entry.bbox => {}
                        Some(_) => {
                            return Err(SpatialError::corrupt(format!(
                                "leaf box for {} differs from the recorded box",
                                entry.key
                            )));
                        }
                        None => {
                            return Err(SpatialError::corrupt(format!(
                                "leaf holds unrecorded key {}",
                                entry.key
                            )));
                        }
                    }
                }
                *seen += entries.len();
            }
            Node::Internal(children) => {
                if is_root && children.len() < 2 {
                    return Err(SpatialError::corrupt(
                        "internal root has fewer than two children",
                    ));
                }
                for child in children {
                    if child.node.bbox() != Some(child.bbox) {
                        return Err(SpatialError::corrupt(format!(
                            "child box at depth {depth} does not match its contents"
                        )));
                    }
                    self.check_node(&child.node, depth + 1, false, seen)?;
                }
            }
        }

        Ok(())
    }

    fn insert_entry(&mut self, entry: Entry<K>) {
        let max = self.config.max_children();
        let min = self.config.min_children();
        let split = insert_into(Arc::make_mut(&mut self.root), entry, max, min);
        if let Some(sibling) = split {
            let old_root = std::mem::replace(&mut self.root, Arc::new(Node::empty_leaf()));
            self.root = Arc::new(Node::Internal(vec![Child::from_arc(old_root), sibling]));
            self.height += 1;
        }
    }

    fn shrink_root(&mut self) {
        loop {
            let replacement = match self.root.as_ref() {
                Node::Internal(children) if children.len() == 1 => Arc::clone(&children[0].node),
                Node::Internal(children) if children.is_empty() => Arc::new(Node::empty_leaf()),
                _ => return,
            };
            let collapsed_empty = replacement.len() == 0 && matches!(*replacement, Node::Leaf(_));
            self.root = replacement;
            if collapsed_empty {
                self.height = 1;
                return;
            }
            self.height -= 1;
        }
    }
}

fn check_config(config: &RTreeConfig) -> Result<(), SpatialError> {
    let issues = config.validate();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(SpatialError::InvalidConfig(issues.join("; ")))
    }
}

/// Inserts `entry` below `node`. Returns a new sibling if `node` split.
fn insert_into<K: Clone>(
    node: &mut Node<K>,
    entry: Entry<K>,
    max: usize,
    min: usize,
) -> Option<Child<K>> {
    match node {
        Node::Leaf(entries) => {
            entries.push(entry);
            if entries.len() <= max {
                return None;
            }
            let (keep, moved) = split::quadratic_split(std::mem::take(entries), min);
            *entries = keep;
            Some(Child::new(Node::Leaf(moved)))
        }
        Node::Internal(children) => {
            let index = split::choose_subtree(children, &entry.bbox, |c| c.node.len());
            let target = &mut children[index];
            target.bbox = target.bbox.union(&entry.bbox);
            let sibling = insert_into(Arc::make_mut(&mut target.node), entry, max, min)?;

            target.refresh();
            children.push(sibling);
            if children.len() <= max {
                return None;
            }
            let (keep, moved) = split::quadratic_split(std::mem::take(children), min);
            *children = keep;
            Some(Child::new(Node::Internal(moved)))
        }
    }
}

/// Records in `path` the child indices leading to the leaf holding `key`.
fn find_path<K: Eq>(node: &Node<K>, key: &K, bbox: &Aabb, path: &mut Vec<usize>) -> bool {
    match node {
        Node::Leaf(entries) => entries.iter().any(|e| &e.key == key),
        Node::Internal(children) => {
            for (index, child) in children.iter().enumerate() {
                if child.bbox.contains_box(bbox) {
                    path.push(index);
                    if find_path(&child.node, key, bbox, path) {
                        return true;
                    }
                    path.pop();
                }
            }
            false
        }
    }
}

/// Removes `key` from the leaf at the end of `path`, dissolving underfull
/// nodes on the way back up. Entries of dissolved nodes go to `orphans`.
fn remove_along<K: Clone + Eq>(
    node: &mut Node<K>,
    path: &[usize],
    key: &K,
    min: usize,
    orphans: &mut Vec<Entry<K>>,
) {
    match node {
        Node::Leaf(entries) => {
            if let Some(position) = entries.iter().position(|e| &e.key == key) {
                entries.swap_remove(position);
            }
        }
        Node::Internal(children) => {
            let Some((&index, rest)) = path.split_first() else {
                return;
            };
            let child = &mut children[index];
            remove_along(Arc::make_mut(&mut child.node), rest, key, min, orphans);

            if child.node.len() < min {
                let dissolved = children.swap_remove(index);
                dissolved.node.collect_entries(orphans);
            } else {
                child.refresh();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn cube(x: f64, y: f64, z: f64, size: f64) -> Aabb {
        Aabb::new(Point3::new(x, y, z), Point3::new(x + size, y + size, z + size)).unwrap()
    }

    fn grid_tree(n: u32, config: RTreeConfig) -> RTree<u32> {
        let mut tree = RTree::with_config(config).unwrap();
        for i in 0..n {
            let x = f64::from(i % 20) * 10.0;
            let z = f64::from(i / 20) * 10.0;
            tree.insert(i, cube(x, 0.0, z, 5.0)).unwrap();
        }
        tree
    }

    fn small_config() -> RTreeConfig {
        RTreeConfig::new().with_max_children(4).with_min_children(2)
    }

    #[test]
    fn test_empty_tree() {
        let tree: RTree<u32> = RTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert!(tree.bounds().is_none());
        assert!(tree.query_point(&Point3::origin()).is_empty());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_and_query_point() {
        let mut tree = RTree::new();
        tree.insert(1, cube(0.0, 0.0, 0.0, 10.0)).unwrap();
        tree.insert(2, cube(5.0, 5.0, 5.0, 10.0)).unwrap();
        tree.insert(3, cube(100.0, 0.0, 0.0, 1.0)).unwrap();

        let mut hits = tree.query_point(&Point3::new(7.0, 7.0, 7.0));
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2]);
        assert_eq!(tree.query_point(&Point3::new(100.5, 0.5, 0.5)), vec![3]);
        assert!(tree.query_point(&Point3::new(50.0, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let mut tree = RTree::new();
        tree.insert("a", cube(0.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(tree.query_point(&Point3::new(1.0, 1.0, 1.0)), vec!["a"]);
        assert_eq!(tree.query_point(&Point3::new(0.0, 0.5, 1.0)), vec!["a"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut tree = RTree::new();
        tree.insert(7, cube(0.0, 0.0, 0.0, 1.0)).unwrap();
        let err = tree.insert(7, cube(5.0, 0.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, SpatialError::DuplicateKey(k) if k == "7"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_invalid_box_rejected() {
        let mut tree = RTree::new();
        let bad = Aabb::from_corners(Point3::origin(), Point3::new(f64::INFINITY, 0.0, 0.0));
        assert!(tree.insert(1, bad).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RTreeConfig::new().with_max_children(3);
        assert!(matches!(
            RTree::<u32>::with_config(config),
            Err(SpatialError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_splits_keep_invariants() {
        let tree = grid_tree(200, small_config());
        assert_eq!(tree.len(), 200);
        assert!(tree.height() > 2);
        tree.check_invariants().unwrap();

        for i in 0..200_u32 {
            let x = f64::from(i % 20) * 10.0 + 2.5;
            let z = f64::from(i / 20) * 10.0 + 2.5;
            assert_eq!(tree.query_point(&Point3::new(x, 2.5, z)), vec![i]);
        }
    }

    #[test]
    fn test_remove_condenses() {
        let mut tree = grid_tree(200, small_config());
        for i in (0..200_u32).step_by(3) {
            tree.remove(&i).unwrap();
            tree.check_invariants().unwrap();
        }
        for i in 0..200_u32 {
            let x = f64::from(i % 20) * 10.0 + 2.5;
            let z = f64::from(i / 20) * 10.0 + 2.5;
            let hits = tree.query_point(&Point3::new(x, 2.5, z));
            if i % 3 == 0 {
                assert!(hits.is_empty(), "{i} should be gone");
            } else {
                assert_eq!(hits, vec![i]);
            }
        }
    }

    #[test]
    fn test_remove_everything() {
        let mut tree = grid_tree(60, small_config());
        for i in 0..60_u32 {
            let bbox = *tree.get(&i).unwrap();
            assert_eq!(tree.remove(&i).unwrap(), bbox);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_missing_key() {
        let mut tree: RTree<u32> = RTree::new();
        assert!(tree.remove(&3).unwrap_err().is_not_found());
    }

    #[test]
    fn test_clone_is_isolated() {
        let original = grid_tree(100, small_config());
        let mut copy = original.clone();
        copy.remove(&10).unwrap();
        copy.insert(1000, cube(500.0, 0.0, 500.0, 1.0)).unwrap();

        assert!(original.contains_key(&10));
        assert!(!original.contains_key(&1000));
        assert_eq!(original.len(), 100);
        assert_eq!(copy.len(), 100);
        original.check_invariants().unwrap();
        copy.check_invariants().unwrap();
    }

    #[test]
    fn test_query_box_touching_faces() {
        let mut tree = RTree::new();
        tree.insert(1, cube(0.0, 0.0, 0.0, 1.0)).unwrap();
        tree.insert(2, cube(3.0, 0.0, 0.0, 1.0)).unwrap();
        let probe = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0)).unwrap();
        assert_eq!(tree.query_box(&probe), vec![1]);
    }

    #[test]
    fn test_bulk_load_matches_insert() {
        let items: Vec<(u32, Aabb)> = (0..500_u32)
            .map(|i| {
                let x = f64::from(i % 25) * 4.0;
                let y = f64::from((i / 25) % 4) * 4.0;
                let z = f64::from(i / 100) * 4.0;
                (i, cube(x, y, z, 6.0))
            })
            .collect();
        let bulk = RTree::bulk_load(items.clone(), RTreeConfig::default()).unwrap();
        bulk.check_invariants().unwrap();
        assert_eq!(bulk.len(), 500);

        let mut incremental = RTree::new();
        for (key, bbox) in items {
            incremental.insert(key, bbox).unwrap();
        }

        let probe = Point3::new(13.0, 5.0, 9.0);
        let mut a = bulk.query_point(&probe);
        let mut b = incremental.query_point(&probe);
        a.sort_unstable();
        b.sort_unstable();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_bulk_load_small_and_empty() {
        let empty = RTree::<u32>::bulk_load(Vec::new(), RTreeConfig::default()).unwrap();
        assert!(empty.is_empty());
        empty.check_invariants().unwrap();

        let one = RTree::bulk_load(vec![(1_u32, cube(0.0, 0.0, 0.0, 1.0))], RTreeConfig::default())
            .unwrap();
        assert_eq!(one.height(), 1);
        one.check_invariants().unwrap();
    }

    #[test]
    fn test_bulk_load_duplicate_key() {
        let items = vec![(1_u32, cube(0.0, 0.0, 0.0, 1.0)), (1, cube(2.0, 0.0, 0.0, 1.0))];
        assert!(matches!(
            RTree::bulk_load(items, RTreeConfig::default()),
            Err(SpatialError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_bulk_load_then_mutate() {
        let items: Vec<(u32, Aabb)> = (0..300_u32)
            .map(|i| (i, cube(f64::from(i) * 3.0, 0.0, 0.0, 2.0)))
            .collect();
        let mut tree = RTree::bulk_load(items, small_config()).unwrap();
        tree.check_invariants().unwrap();

        for i in 0..150_u32 {
            tree.remove(&(i * 2)).unwrap();
        }
        tree.insert(9999, cube(-10.0, 0.0, 0.0, 1.0)).unwrap();
        tree.check_invariants().unwrap();
        assert_eq!(tree.len(), 151);
    }

    #[test]
    fn test_query_visits_few_nodes() {
        let items: Vec<(u32, Aabb)> = (0..10_000_u32)
            .map(|i| {
                let x = f64::from(i % 100) * 10.0;
                let z = f64::from(i / 100) * 10.0;
                (i, cube(x, 0.0, z, 5.0))
            })
            .collect();
        let tree = RTree::bulk_load(items, RTreeConfig::default()).unwrap();

        let (hits, stats) = tree.query_point_with_stats(&Point3::new(502.0, 2.0, 502.0));
        assert_eq!(hits, vec![5050]);
        assert!(stats.entries_tested < 400, "{stats:?}");
        assert!(stats.nodes_visited < 40, "{stats:?}");
    }

    #[test]
    fn test_stats() {
        let tree = grid_tree(50, small_config());
        let stats = tree.stats();
        assert_eq!(stats.entries, 50);
        assert_eq!(stats.height, tree.height());
        assert!(stats.nodes >= 50 / 4);
    }

    #[test]
    fn test_clear() {
        let mut tree = grid_tree(30, small_config());
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.config().max_children(), 4);
        tree.check_invariants().unwrap();
    }
}
