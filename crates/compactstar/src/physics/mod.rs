//! Physics module for collision detection and response
//!
//! Static level geometry is indexed by an AABB tree; characters and cameras
//! are bounding spheres that query it for picking, ground detection and
//! sliding movement.

pub mod collision;
pub mod collision_system;

#[cfg(test)]
mod tests;

pub use collision::{
    Aabb,
    BoundingSphere,
    Plane,
    Polygon,
    Ray,
    RayHit,
    VertexTopology,
};
pub use collision_system::{build_collision_meshes, CollisionError, CollisionMesh};
