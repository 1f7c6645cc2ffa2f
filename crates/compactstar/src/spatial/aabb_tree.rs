//! Axis-aligned bounding box tree over a polygon soup
//!
//! The tree is built once from the full polygon set of a static mesh and is
//! read-only afterwards. Each node's box is split in two along its longest
//! axis; polygons go to every half one of their vertices falls in, so a
//! polygon straddling a cut is stored in both subtrees. Queries therefore
//! may return duplicates but never lose a polygon near a partition border.
//!
//! Nodes live in a [`SlotMap`] arena owned by the tree. Children are owned
//! through the arena, and the parent link is a plain key used for walking
//! up the tree only.

use std::collections::TryReserveError;

use log::{debug, trace};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::config::{CollisionConfig, Config, ConfigError};
use crate::physics::collision::{Aabb, Polygon, Ray};

new_key_type! {
    /// Key of a node inside an [`AabbTree`]
    pub struct NodeKey;
}

/// Tree construction errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Growing polygon storage failed
    #[error("Allocation failed while building AABB tree: {0}")]
    Allocation(#[from] TryReserveError),

    /// The collision configuration is unusable
    #[error("Cannot build AABB tree: {0}")]
    Config(#[from] ConfigError),
}

/// What a node holds: polygons for a leaf, two children otherwise
#[derive(Debug, Clone)]
pub enum NodeContent {
    /// Terminal node with the polygons assigned to it (possibly none)
    Leaf(Vec<Polygon>),
    /// Branching node
    Interior {
        /// Child built from the lower half of the split box
        left: NodeKey,
        /// Child built from the upper half of the split box
        right: NodeKey,
    },
}

/// Single node in the AABB tree
#[derive(Debug, Clone)]
pub struct AabbNode {
    bounds: Aabb,
    parent: Option<NodeKey>,
    depth: usize,
    content: NodeContent,
}

impl AabbNode {
    /// Tight box around every polygon below this node
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Node content
    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, NodeContent::Leaf(_))
    }

    /// Polygons stored on this node, empty for interior nodes
    pub fn polygons(&self) -> &[Polygon] {
        match &self.content {
            NodeContent::Leaf(polygons) => polygons,
            NodeContent::Interior { .. } => &[],
        }
    }

    /// Left and right children of an interior node
    pub fn children(&self) -> Option<(NodeKey, NodeKey)> {
        match self.content {
            NodeContent::Leaf(_) => None,
            NodeContent::Interior { left, right } => Some((left, right)),
        }
    }
}

/// Shape of a built tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of nodes, leaves included
    pub node_count: usize,
    /// Number of leaves
    pub leaf_count: usize,
    /// Polygons stored across all leaves, duplicates included
    pub stored_polygons: usize,
    /// Deepest node depth
    pub max_depth: usize,
    /// Polygon count of the fullest leaf
    pub largest_leaf: usize,
}

/// Bounding volume hierarchy of axis-aligned boxes over a polygon set
#[derive(Debug, Clone, Default)]
pub struct AabbTree {
    nodes: SlotMap<NodeKey, AabbNode>,
    root: Option<NodeKey>,
}

impl AabbTree {
    /// Build a tree with the default collision configuration
    pub fn build(polygons: &[Polygon]) -> Result<Self, BuildError> {
        Self::build_with_config(polygons, &CollisionConfig::default())
    }

    /// Build a tree over `polygons`
    ///
    /// The configuration is validated first. An empty polygon set yields a
    /// tree made of a single empty leaf. On failure every node built so far
    /// is released before the error is returned.
    pub fn build_with_config(polygons: &[Polygon], config: &CollisionConfig) -> Result<Self, BuildError> {
        config.validate()?;

        let mut owned = Vec::new();
        owned.try_reserve_exact(polygons.len())?;
        owned.extend_from_slice(polygons);

        let mut builder = TreeBuilder {
            nodes: SlotMap::with_key(),
            epsilon: config.epsilon,
            max_depth: config.max_depth,
        };
        let root = builder.build_node(owned, None, 0)?;

        let tree = Self {
            nodes: builder.nodes,
            root: Some(root),
        };

        let stats = tree.stats();
        debug!(
            "Built AABB tree from {} polygons: {} nodes, {} leaves, depth {}, {} stored polygons",
            polygons.len(),
            stats.node_count,
            stats.leaf_count,
            stats.max_depth,
            stats.stored_polygons
        );

        Ok(tree)
    }

    /// Root node key, `None` once the root has been released
    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    /// Box enclosing the whole tree, [`Aabb::EMPTY`] for an empty tree
    pub fn root_box(&self) -> Aabb {
        self.root
            .and_then(|key| self.nodes.get(key))
            .map_or(Aabb::EMPTY, |node| node.bounds)
    }

    /// Look a node up by key
    pub fn node(&self, key: NodeKey) -> Option<&AabbNode> {
        self.nodes.get(key)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no node at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collect every polygon that may intersect `ray`
    ///
    /// This is a broad-phase query: the result holds the content of every
    /// leaf whose box the ray crosses, duplicates included, and the caller
    /// runs the exact test on it.
    pub fn resolve(&self, ray: &Ray) -> Vec<Polygon> {
        let mut polygons = Vec::new();
        self.resolve_into(ray, &mut polygons);
        polygons
    }

    /// Same as [`AabbTree::resolve`], reusing `polygons` (cleared first)
    pub fn resolve_into(&self, ray: &Ray, polygons: &mut Vec<Polygon>) {
        polygons.clear();
        if let Some(root) = self.root {
            self.resolve_node(root, &|bounds| bounds.intersect_ray(ray).is_some(), polygons);
        }
        trace!("Ray query returned {} candidate polygons", polygons.len());
    }

    /// Collect every polygon stored in a leaf whose box overlaps `area`
    pub fn resolve_box(&self, area: &Aabb) -> Vec<Polygon> {
        let mut polygons = Vec::new();
        if let Some(root) = self.root {
            if !area.is_empty() {
                self.resolve_node(root, &|bounds| bounds.intersects(area), &mut polygons);
            }
        }
        trace!("Box query returned {} candidate polygons", polygons.len());
        polygons
    }

    fn resolve_node<F>(&self, key: NodeKey, hits: &F, polygons: &mut Vec<Polygon>)
    where
        F: Fn(&Aabb) -> bool,
    {
        let Some(node) = self.nodes.get(key) else {
            return;
        };

        if !hits(&node.bounds) {
            return;
        }

        match &node.content {
            NodeContent::Leaf(stored) => polygons.extend_from_slice(stored),
            NodeContent::Interior { left, right } => {
                // Sibling boxes may overlap, so both sides are always visited
                self.resolve_node(*left, hits, polygons);
                self.resolve_node(*right, hits, polygons);
            }
        }
    }

    /// All leaves reachable from the root, left to right
    pub fn leaves(&self) -> Vec<&AabbNode> {
        let mut leaves = Vec::new();
        if let Some(root) = self.root {
            self.collect_leaves(root, &mut leaves);
        }
        leaves
    }

    fn collect_leaves<'a>(&'a self, key: NodeKey, leaves: &mut Vec<&'a AabbNode>) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        match node.content {
            NodeContent::Leaf(_) => leaves.push(node),
            NodeContent::Interior { left, right } => {
                self.collect_leaves(left, leaves);
                self.collect_leaves(right, leaves);
            }
        }
    }

    /// Keys from `key`'s parent up to the root
    pub fn ancestors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        std::iter::successors(self.nodes.get(key).and_then(AabbNode::parent), move |current| {
            self.nodes.get(*current).and_then(AabbNode::parent)
        })
    }

    /// Release the subtree rooted at `key`
    ///
    /// Children are released before the node itself. Releasing a key that
    /// is not in the tree does nothing.
    pub fn release(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.remove(key) else {
            return;
        };

        if let NodeContent::Interior { left, right } = node.content {
            self.release(left);
            self.release(right);
        }

        if self.root == Some(key) {
            self.root = None;
        }
    }

    /// Release every node
    pub fn clear(&mut self) {
        if let Some(root) = self.root {
            self.release(root);
        }
        self.nodes.clear();
    }

    /// Count nodes, leaves and stored polygons
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for node in self.nodes.values() {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(node.depth);
            if let NodeContent::Leaf(polygons) = &node.content {
                stats.leaf_count += 1;
                stats.stored_polygons += polygons.len();
                stats.largest_leaf = stats.largest_leaf.max(polygons.len());
            }
        }
        stats
    }
}

/// Recursive construction state
struct TreeBuilder {
    nodes: SlotMap<NodeKey, AabbNode>,
    epsilon: f32,
    max_depth: usize,
}

impl TreeBuilder {
    fn build_node(
        &mut self,
        polygons: Vec<Polygon>,
        parent: Option<NodeKey>,
        depth: usize,
    ) -> Result<NodeKey, BuildError> {
        let bounds = Aabb::from_polygons(&polygons);

        if polygons.is_empty() || depth >= self.max_depth {
            return Ok(self.insert_leaf(bounds, parent, depth, polygons));
        }

        let (left_box, right_box) = bounds.split();

        let mut left = Vec::new();
        let mut right = Vec::new();
        left.try_reserve(polygons.len())?;
        right.try_reserve(polygons.len())?;

        for polygon in &polygons {
            let in_left = self.touches(&left_box, polygon);
            let in_right = self.touches(&right_box, polygon);
            if in_left {
                left.push(*polygon);
            }
            if in_right {
                right.push(*polygon);
            }
        }

        let total = polygons.len();
        let splits = |half: &Vec<Polygon>| !half.is_empty() && half.len() < total;

        if !(splits(&left) && splits(&right)) {
            // No progress: the leaf keeps the whole set, in input order
            return Ok(self.insert_leaf(bounds, parent, depth, polygons));
        }

        drop(polygons);

        let key = self.insert_leaf(bounds, parent, depth, Vec::new());
        let left_key = self.build_node(left, Some(key), depth + 1)?;
        let right_key = self.build_node(right, Some(key), depth + 1)?;
        self.nodes[key].content = NodeContent::Interior {
            left: left_key,
            right: right_key,
        };

        Ok(key)
    }

    /// Whether any vertex of `polygon` lies in `half`, within tolerance
    fn touches(&self, half: &Aabb, polygon: &Polygon) -> bool {
        polygon
            .vertices
            .iter()
            .any(|vertex| half.contains_point_with_tolerance(vertex, self.epsilon))
    }

    fn insert_leaf(
        &mut self,
        bounds: Aabb,
        parent: Option<NodeKey>,
        depth: usize,
        polygons: Vec<Polygon>,
    ) -> NodeKey {
        self.nodes.insert(AabbNode {
            bounds,
            parent,
            depth,
            content: NodeContent::Leaf(polygons),
        })
    }
}
