//! Concept hierarchy trees.
//!
//! A concept hierarchy is a hand-authored taxonomy that generalizes raw
//! attribute values into broader concepts. [`HierarchyTree`] builds the tree
//! from tokenized path records, assigns a positional code to every node, and
//! converts an unbalanced tree (leaves at mixed depths) into a balanced one
//! (all leaves at a uniform depth) by padding shallow leaves with self-named
//! descendants.
//!
//! # Examples
//!
//! ```
//! use diverso::hierarchy::HierarchyTree;
//!
//! let mut tree = HierarchyTree::new();
//! tree.insert(&["A", "A1", "a1x"]).unwrap();
//! tree.insert(&["A", "A1", "a1y"]).unwrap();
//! tree.insert(&["B", "B1", "b1x"]).unwrap();
//!
//! assert_eq!(tree.height(), 4); // root + 3 levels
//!
//! let codes = tree.leaf_codes();
//! assert_eq!(codes["a1x"], "0+0+0+0");
//! assert_eq!(codes["b1x"], "0+1+0+0");
//! ```

use std::collections::HashMap;

use crate::error::{DiversoError, Result};

/// A node in a concept hierarchy tree.
///
/// Nodes live in an arena owned by the tree and reference their children by
/// index; there are no back-references and no sharing.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Value at this level (attribute value or generalized label).
    pub name: String,
    /// Plus-joined path string, unique per node, e.g. `"0+2+1"`.
    ///
    /// Assigned at insertion time as `parent.code + "+" + child_index` where
    /// `child_index` is the 0-based insertion index among siblings. Codes are
    /// positional, not content hashes: they are stable only as long as sibling
    /// insertion order is stable.
    pub code: String,
    /// Depth in the tree; the root is level 1.
    pub level: usize,
    /// Child node indices, in insertion order.
    pub children: Vec<usize>,
}

impl Node {
    /// Check if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An ordered, named multi-way tree built from hierarchy paths.
///
/// The root is a permanent sentinel named `"root"` with code `"0"` at level 1.
/// The tree is built once per run by repeated [`HierarchyTree::insert`] calls
/// and is read-only afterwards; balancing produces a padded shape via
/// [`HierarchyTree::balanced`].
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyTree {
    nodes: Vec<Node>,
}

impl Default for HierarchyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyTree {
    /// Creates a tree containing only the root sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "root".to_string(),
                code: "0".to_string(),
                level: 1,
                children: Vec::new(),
            }],
        }
    }

    /// Returns the number of nodes in the tree (root included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns false; the root sentinel always exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the node at the given arena index.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    #[must_use]
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Inserts a hierarchy path, root-adjacent name first.
    ///
    /// Walks from the root; at each level descends into an existing same-named
    /// child or creates a new one. Inserting the same path twice does not
    /// duplicate nodes.
    ///
    /// # Errors
    ///
    /// Returns [`DiversoError::InvalidPath`] for an empty path. Nothing is
    /// mutated in that case, so callers may treat the error as a no-op.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S]) -> Result<()> {
        if path.is_empty() {
            return Err(DiversoError::invalid_path("empty hierarchy path"));
        }

        let mut cur = 0;
        for name in path {
            let name = name.as_ref();
            let existing = self.nodes[cur]
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].name == name);

            cur = match existing {
                Some(child) => child,
                None => {
                    let id = self.nodes.len();
                    let parent = &self.nodes[cur];
                    let node = Node {
                        name: name.to_string(),
                        code: format!("{}+{}", parent.code, parent.children.len()),
                        level: parent.level + 1,
                        children: Vec::new(),
                    };
                    self.nodes.push(node);
                    self.nodes[cur].children.push(id);
                    id
                }
            };
        }
        Ok(())
    }

    /// Returns the maximum level over all leaf nodes.
    ///
    /// A tree holding only the root has height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut stack = vec![0];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_leaf() {
                height = height.max(node.level);
            } else {
                stack.extend(node.children.iter().copied());
            }
        }
        height
    }

    /// Returns the leaf name → code mapping for the current tree shape.
    ///
    /// Computed by a pre-order traversal. Multiple leaves sharing a name
    /// collapse to one entry, last write wins: the diversity computation
    /// identifies concepts by leaf name, so names must be unique across leaves
    /// for the codes to be meaningful.
    #[must_use]
    pub fn leaf_codes(&self) -> HashMap<String, String> {
        let mut codes = HashMap::new();
        let mut stack = vec![0];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_leaf() {
                codes.insert(node.name.clone(), node.code.clone());
            }
            stack.extend(node.children.iter().rev().copied());
        }
        codes
    }

    /// Pads every leaf shallower than `target_height` in place.
    ///
    /// Each such leaf receives a chain of self-named descendants (same name,
    /// level + 1, next sibling code) until its deepest descendant sits at
    /// exactly `target_height`. Leaves already at or above `target_height` are
    /// left untouched; balancing only ever adds depth. The name is preserved
    /// exactly so the leaf-name → code lookup still resolves.
    pub fn balance(&mut self, target_height: usize) {
        let mut stack = vec![0];
        while let Some(id) = stack.pop() {
            if self.nodes[id].is_leaf() && self.nodes[id].level < target_height {
                let child = self.nodes.len();
                let node = Node {
                    name: self.nodes[id].name.clone(),
                    code: format!("{}+0", self.nodes[id].code),
                    level: self.nodes[id].level + 1,
                    children: Vec::new(),
                };
                self.nodes.push(node);
                self.nodes[id].children.push(child);
                stack.push(child);
            } else {
                stack.extend(self.nodes[id].children.iter().copied());
            }
        }
    }

    /// Returns a balanced copy of this tree, leaving `self` untouched.
    ///
    /// Call [`HierarchyTree::leaf_codes`] separately on the unbalanced and the
    /// balanced tree to obtain the two code maps over the same leaf names.
    #[must_use]
    pub fn balanced(&self, target_height: usize) -> Self {
        let mut tree = self.clone();
        tree.balance(target_height);
        tree
    }
}
