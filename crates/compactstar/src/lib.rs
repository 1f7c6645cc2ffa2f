//! # CompactStar
//!
//! Collision core of the CompactStar engine.
//!
//! ## Features
//!
//! - **Polygon Extraction**: Triangles from triangle, strip, fan, quad and quad strip buffers
//! - **AABB Trees**: Longest-axis bounding volume hierarchy over a static polygon soup
//! - **Ray Resolution**: Broad-phase candidate lists for picking and movement
//! - **Sliding Response**: Characters and cameras slide along walls and rest on the ground
//!
//! ## Quick Start
//!
//! ```rust
//! use compactstar::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // One triangle, 3 floats per vertex
//!     let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//!     let polygons = extract_polygons(&vertices, 3, VertexTopology::Triangles)?;
//!
//!     let tree = AabbTree::build(&polygons)?;
//!     let ray = Ray::new(Vec3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
//!     assert_eq!(tree.resolve(&ray).len(), 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, ConfigError},
        foundation::math::Vec3,
        physics::{
            build_collision_meshes,
            collision::{
                extract_indexed_polygons, extract_polygons, ground_position, slide, sphere_polygon_contact,
                Aabb, BoundingSphere, ExtractError, Plane, Polygon, Ray, RayHit, Segment, VertexTopology,
            },
            CollisionError, CollisionMesh,
        },
        spatial::{AabbTree, BuildError, NodeKey, TreeStats},
    };
}
