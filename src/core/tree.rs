use fxhash::FxHashMap;
use thiserror::Error;

use crate::core::types::{ClassificationId, Rank};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Unknown id {0}: not present in the classification tree")]
    UnknownId(ClassificationId),

    #[error("Cannot compute the LCA of an empty id set")]
    EmptySet,

    #[error("Invalid node id {0}: tree ids must be positive")]
    InvalidId(ClassificationId),

    #[error("Duplicate node id {0}")]
    DuplicateId(ClassificationId),

    #[error("Node {id} refers to missing parent {parent}")]
    MissingParent {
        id: ClassificationId,
        parent: ClassificationId,
    },

    #[error("Tree has more than one root ({0} and {1})")]
    MultipleRoots(ClassificationId, ClassificationId),

    #[error("Tree has no root")]
    NoRoot,

    #[error("Cycle detected while walking up from node {0}")]
    Cycle(ClassificationId),
}

/// A node as supplied to [`TaxonomyTree::from_nodes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: ClassificationId,
    /// Parent id; `None` (or the node's own id) marks the root
    pub parent: Option<ClassificationId>,
    pub rank: Rank,
}

impl TreeNode {
    pub fn new(id: ClassificationId, parent: Option<ClassificationId>, rank: Rank) -> Self {
        Self { id, parent, rank }
    }
}

#[derive(Debug, Clone)]
struct NodeEntry {
    parent: Option<ClassificationId>,
    rank: Rank,
    depth: u32,
}

/// Rooted tree over classification ids.
///
/// Built once and read-only afterwards. Depths are computed at construction
/// so ancestor queries and LCA only walk the part of the path that matters.
#[derive(Debug, Clone)]
pub struct TaxonomyTree {
    nodes: FxHashMap<ClassificationId, NodeEntry>,
    root: ClassificationId,
}

impl TaxonomyTree {
    /// Build a tree from its nodes, validating the structure.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::InvalidId` for non-positive ids, `DuplicateId`,
    /// `MissingParent`, `MultipleRoots`, `NoRoot` or `Cycle` if the nodes do
    /// not describe a single rooted tree.
    pub fn from_nodes<I>(nodes: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = TreeNode>,
    {
        let mut parents: FxHashMap<ClassificationId, (Option<ClassificationId>, Rank)> =
            FxHashMap::default();
        let mut order = Vec::new();

        for node in nodes {
            if node.id <= 0 {
                return Err(TreeError::InvalidId(node.id));
            }
            // NCBI convention: the root is its own parent
            let parent = node.parent.filter(|&p| p != node.id);
            if parents.insert(node.id, (parent, node.rank)).is_some() {
                return Err(TreeError::DuplicateId(node.id));
            }
            order.push(node.id);
        }
        order.sort_unstable();

        let mut root = None;
        for &id in &order {
            match parents[&id].0 {
                None => match root {
                    None => root = Some(id),
                    Some(other) => return Err(TreeError::MultipleRoots(other, id)),
                },
                Some(parent) if !parents.contains_key(&parent) => {
                    return Err(TreeError::MissingParent { id, parent });
                }
                Some(_) => {}
            }
        }
        let root = root.ok_or(TreeError::NoRoot)?;

        let mut depths: FxHashMap<ClassificationId, u32> = FxHashMap::default();
        depths.insert(root, 0);
        for &id in &order {
            let mut path = Vec::new();
            let mut current = id;
            let base = loop {
                if let Some(&depth) = depths.get(&current) {
                    break depth;
                }
                if path.len() > order.len() {
                    return Err(TreeError::Cycle(id));
                }
                path.push(current);
                current = match parents[&current].0 {
                    Some(parent) => parent,
                    None => return Err(TreeError::Cycle(id)),
                };
            };
            for (i, node) in path.iter().rev().enumerate() {
                #[allow(clippy::cast_possible_truncation)] // Bounded by the node count
                depths.insert(*node, base + i as u32 + 1);
            }
        }

        let nodes = parents
            .into_iter()
            .map(|(id, (parent, rank))| {
                let depth = depths.get(&id).copied().unwrap_or_default();
                (
                    id,
                    NodeEntry {
                        parent,
                        rank,
                        depth,
                    },
                )
            })
            .collect();

        Ok(Self { nodes, root })
    }

    /// The root id
    #[must_use]
    pub fn root(&self) -> ClassificationId {
        self.root
    }

    #[must_use]
    pub fn contains(&self, id: ClassificationId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn entry(&self, id: ClassificationId) -> Result<&NodeEntry, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::UnknownId(id))
    }

    /// Parent of a node (`None` for the root)
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownId` if the id is not in the tree.
    pub fn parent(&self, id: ClassificationId) -> Result<Option<ClassificationId>, TreeError> {
        Ok(self.entry(id)?.parent)
    }

    /// Rank of a node
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownId` if the id is not in the tree.
    pub fn rank(&self, id: ClassificationId) -> Result<Rank, TreeError> {
        Ok(self.entry(id)?.rank)
    }

    /// Number of edges between a node and the root
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownId` if the id is not in the tree.
    pub fn depth(&self, id: ClassificationId) -> Result<u32, TreeError> {
        Ok(self.entry(id)?.depth)
    }

    /// Path from a node up to the root, both included
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownId` if the id is not in the tree.
    pub fn ancestors(&self, id: ClassificationId) -> Result<Vec<ClassificationId>, TreeError> {
        let mut entry = self.entry(id)?;
        let mut path = Vec::with_capacity(entry.depth as usize + 1);
        path.push(id);
        while let Some(parent) = entry.parent {
            path.push(parent);
            entry = self.entry(parent)?;
        }
        Ok(path)
    }

    /// Check whether `node` lies in the subtree rooted at `ancestor`.
    /// A node is its own descendant.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownId` if either id is not in the tree.
    pub fn is_descendant(
        &self,
        ancestor: ClassificationId,
        node: ClassificationId,
    ) -> Result<bool, TreeError> {
        let target_depth = self.entry(ancestor)?.depth;
        let mut current = node;
        let mut entry = self.entry(node)?;
        while entry.depth > target_depth {
            match entry.parent {
                Some(parent) => {
                    current = parent;
                    entry = self.entry(parent)?;
                }
                None => break,
            }
        }
        Ok(current == ancestor)
    }

    fn step_up(&self, id: ClassificationId) -> Result<ClassificationId, TreeError> {
        Ok(self.entry(id)?.parent.unwrap_or(self.root))
    }

    fn lca_pair(
        &self,
        a: ClassificationId,
        b: ClassificationId,
    ) -> Result<ClassificationId, TreeError> {
        let (mut a, mut b) = (a, b);
        let mut depth_a = self.entry(a)?.depth;
        let mut depth_b = self.entry(b)?.depth;

        while depth_a > depth_b {
            a = self.step_up(a)?;
            depth_a -= 1;
        }
        while depth_b > depth_a {
            b = self.step_up(b)?;
            depth_b -= 1;
        }
        while a != b {
            a = self.step_up(a)?;
            b = self.step_up(b)?;
        }
        Ok(a)
    }

    /// Lowest common ancestor of a set of ids.
    ///
    /// The result is the deepest node lying on every candidate's path to the
    /// root. A singleton returns itself and the input order does not matter.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::EmptySet` for an empty input and
    /// `TreeError::UnknownId` if any id is not in the tree.
    pub fn lca<I>(&self, ids: I) -> Result<ClassificationId, TreeError>
    where
        I: IntoIterator<Item = ClassificationId>,
    {
        let ids: Vec<ClassificationId> = ids.into_iter().collect();
        // Validate everything up front so the error does not depend on order
        for &id in &ids {
            self.entry(id)?;
        }

        let mut iter = ids.into_iter();
        let mut result = iter.next().ok_or(TreeError::EmptySet)?;
        for id in iter {
            if result == self.root {
                break;
            }
            result = self.lca_pair(result, id)?;
        }
        Ok(result)
    }
}
