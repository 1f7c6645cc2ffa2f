//! Static mesh collision pipeline
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! A [`CollisionMesh`] owns the AABB tree of one static mesh. Every query
//! first resolves the tree (broad-phase) to a short candidate list, then
//! runs the exact polygon test on the candidates only (narrow-phase), and
//! finally applies the sliding response when a body touches a polygon.

use log::{debug, trace};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::CollisionConfig;
use crate::foundation::math::{Vec2, Vec3};
use crate::physics::collision::{
    extract_polygons, ground_position, slide, sphere_polygon_contact, BoundingSphere, ExtractError,
    Polygon, Ray, RayHit, VertexTopology,
};
use crate::spatial::{AabbTree, BuildError};

/// Errors raised while turning mesh data into a collision mesh
#[derive(Error, Debug)]
pub enum CollisionError {
    /// The vertex buffer could not be decoded
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The tree could not be built
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Collision geometry of a single static mesh
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    tree: AabbTree,
    config: CollisionConfig,
}

impl CollisionMesh {
    /// Build the collision mesh of a polygon soup
    pub fn new(polygons: &[Polygon], config: CollisionConfig) -> Result<Self, BuildError> {
        let tree = AabbTree::build_with_config(polygons, &config)?;
        Ok(Self { tree, config })
    }

    /// Build the collision mesh of a raw vertex buffer
    pub fn from_vertices(
        vertices: &[f32],
        stride: usize,
        topology: VertexTopology,
        config: CollisionConfig,
    ) -> Result<Self, CollisionError> {
        let polygons = extract_polygons(vertices, stride, topology)?;
        Ok(Self::new(&polygons, config)?)
    }

    /// The underlying AABB tree
    pub fn tree(&self) -> &AabbTree {
        &self.tree
    }

    /// Settings the mesh was built with
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Closest polygon hit by `ray`
    pub fn pick(&self, ray: &Ray) -> Option<RayHit> {
        let candidates = self.tree.resolve(ray);

        let hit = candidates
            .iter()
            .filter_map(|polygon| {
                let (t, u, v) = polygon.intersect_ray(ray)?;
                Some(RayHit {
                    distance: t,
                    point: ray.point_at(t),
                    normal: polygon.normal()?,
                    barycentric: Vec2::new(u, v),
                    polygon: *polygon,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        trace!(
            "Pick tested {} candidates, hit: {}",
            candidates.len(),
            hit.is_some()
        );
        hit
    }

    /// Resting position of `sphere` on the ground under it
    ///
    /// The ground is searched along the configured ground direction from the
    /// sphere center. When several polygons lie below, the nearest one wins.
    /// Returns `None` when there is no ground under the sphere.
    pub fn ground(&self, sphere: &BoundingSphere) -> Option<Vec3> {
        let direction = self.config.ground_direction.try_normalize(f32::EPSILON)?;
        let ray = Ray::new(sphere.center, direction);

        self.tree
            .resolve(&ray)
            .iter()
            .filter_map(|polygon| ground_position(sphere, polygon, direction))
            .min_by(|a, b| {
                let a = (a - sphere.center).dot(&direction);
                let b = (b - sphere.center).dot(&direction);
                a.total_cmp(&b)
            })
    }

    /// Move `sphere` towards `target`, sliding along every polygon it would
    /// touch there
    ///
    /// Returns the corrected center. Candidates come from the ray along the
    /// move and from the box around the sphere at its destination, so walls
    /// beside the path are found as well as obstacles straight ahead. A
    /// target less than one radius past a wall is pushed back in front of
    /// it; a move that ends farther past the wall is not detected.
    pub fn slide_sphere(&self, sphere: &BoundingSphere, target: Vec3) -> Vec3 {
        let mut candidates = self.tree.resolve(&Ray::through(sphere.center, target));
        let destination = BoundingSphere::new(target, sphere.radius);
        candidates.extend(self.tree.resolve_box(&destination.bounding_box()));

        let mut position = target;
        let mut contacts = 0;
        for polygon in &candidates {
            let body = BoundingSphere::new(position, sphere.radius);
            if let Some(plane) = sphere_polygon_contact(&body, polygon) {
                // Push back to the side the move started from
                let plane = plane.facing(sphere.center);
                position = slide(&plane, position, sphere.radius);
                contacts += 1;
            }
        }

        trace!(
            "Sphere move tested {} candidates, {} contacts",
            candidates.len(),
            contacts
        );
        position
    }
}

/// Build one collision mesh per polygon set
///
/// Trees share no state, so they are built in parallel. The result keeps
/// the order of `polygon_sets`; the first failure aborts the whole batch.
pub fn build_collision_meshes(
    polygon_sets: &[Vec<Polygon>],
    config: &CollisionConfig,
) -> Result<Vec<CollisionMesh>, BuildError> {
    let meshes = polygon_sets
        .par_iter()
        .map(|polygons| CollisionMesh::new(polygons, config.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Built {} collision meshes", meshes.len());
    Ok(meshes)
}
