//! Tree nodes.
//!
//! Children are held behind `Arc` so that cloning a tree is cheap and a
//! mutation copies only the nodes on the path it touches (`Arc::make_mut`).

use std::sync::Arc;

use crate::aabb::Aabb;

/// Anything that carries a bounding box: leaf entries and child links.
pub(crate) trait Bounded {
    fn bbox(&self) -> &Aabb;
}

/// A leaf entry: one indexed key and its box.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K> {
    pub(crate) key: K,
    pub(crate) bbox: Aabb,
}

impl<K> Bounded for Entry<K> {
    fn bbox(&self) -> &Aabb {
        &self.bbox
    }
}

/// A link from an internal node to a child, with the child's covering box.
#[derive(Debug, Clone)]
pub(crate) struct Child<K> {
    pub(crate) bbox: Aabb,
    pub(crate) node: Arc<Node<K>>,
}

impl<K> Child<K> {
    /// Wraps a node, computing its covering box.
    ///
    /// Nodes handed to this are never empty; an empty node would get a
    /// zero-size box at the origin, which the invariant check reports.
    pub(crate) fn new(node: Node<K>) -> Self {
        Self::from_arc(Arc::new(node))
    }

    pub(crate) fn from_arc(node: Arc<Node<K>>) -> Self {
        let bbox = node.bbox().unwrap_or_default();
        Self { bbox, node }
    }

    /// Recomputes the covering box after the child changed.
    pub(crate) fn refresh(&mut self) {
        if let Some(bbox) = self.node.bbox() {
            self.bbox = bbox;
        }
    }
}

impl<K> Bounded for Child<K> {
    fn bbox(&self) -> &Aabb {
        &self.bbox
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node<K> {
    Leaf(Vec<Entry<K>>),
    Internal(Vec<Child<K>>),
}

impl<K> Node<K> {
    pub(crate) const fn empty_leaf() -> Self {
        Self::Leaf(Vec::new())
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Leaf(entries) => entries.len(),
            Self::Internal(children) => children.len(),
        }
    }

    /// Returns the box covering everything below this node.
    pub(crate) fn bbox(&self) -> Option<Aabb> {
        match self {
            Self::Leaf(entries) => Aabb::covering(entries.iter().map(|e| &e.bbox)),
            Self::Internal(children) => Aabb::covering(children.iter().map(|c| &c.bbox)),
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub(crate) fn node_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Internal(children) => {
                1 + children.iter().map(|c| c.node.node_count()).sum::<usize>()
            }
        }
    }
}

impl<K: Clone> Node<K> {
    /// Appends clones of every leaf entry below this node.
    pub(crate) fn collect_entries(&self, out: &mut Vec<Entry<K>>) {
        match self {
            Self::Leaf(entries) => out.extend(entries.iter().cloned()),
            Self::Internal(children) => {
                for child in children {
                    child.node.collect_entries(out);
                }
            }
        }
    }
}
