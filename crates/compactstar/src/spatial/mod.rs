//! Spatial partitioning data structures
//!
//! Provides the bounding volume hierarchy the collision queries run
//! against.

mod aabb_tree;

pub use aabb_tree::{AabbNode, AabbTree, BuildError, NodeContent, NodeKey, TreeStats};
