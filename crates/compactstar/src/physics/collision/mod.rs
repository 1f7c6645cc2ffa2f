//! Collision geometry and response
//!
//! # Module Organization
//!
//! - [`primitives`] - Geometric primitives (planes, boxes, rays, polygons, spheres)
//! - [`extract`] - Triangle extraction from mesh vertex buffers
//! - [`response`] - Sliding and ground response applied after a contact
//!
//! # Key Types
//!
//! - [`Polygon`] - Triangle stored in the AABB tree
//! - [`Aabb`], [`Plane`], [`Ray`] - Shapes the broad and narrow phases test against
//! - [`BoundingSphere`] - Collision body of characters and cameras

pub mod extract;
pub mod primitives;
pub mod response;

// Re-export commonly used types
pub use extract::{extract_indexed_polygons, extract_polygons, ExtractError, VertexTopology};
pub use primitives::{Aabb, BoundingSphere, Plane, Polygon, Ray, RayHit, Segment};
pub use response::{ground_position, slide, sphere_polygon_contact};
