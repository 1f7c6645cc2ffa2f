//! Collision response
//!
//! Turns a detected contact into the position a moving body should occupy.
//! Bodies slide along the planes they touch instead of stopping dead, and
//! rest on the ground at their radius above it.

use super::primitives::{BoundingSphere, Plane, Polygon, Ray};
use crate::foundation::math::Vec3;

/// Correct `position` so a body of `radius` touches `plane` without
/// crossing it
///
/// The plane is oriented: its normal points to the free side. A position
/// closer than `radius` to the plane (or behind it) is pushed back along the
/// normal until it is exactly `radius` away; any other position is returned
/// unchanged.
pub fn slide(plane: &Plane, position: Vec3, radius: f32) -> Vec3 {
    let distance = plane.distance_to_point(position);
    if distance < radius {
        position - plane.normal * (distance - radius)
    } else {
        position
    }
}

/// Position of `sphere` resting on `polygon` when dropped along
/// `ground_direction`
///
/// Casts a ray from the sphere center along the ground direction and, if
/// it hits the polygon, returns the hit point lifted by the sphere radius
/// against that direction. Returns `None` when the polygon is not under the
/// sphere.
pub fn ground_position(sphere: &BoundingSphere, polygon: &Polygon, ground_direction: Vec3) -> Option<Vec3> {
    let direction = ground_direction.try_normalize(f32::EPSILON)?;
    let ray = Ray::new(sphere.center, direction);
    let (t, _, _) = polygon.intersect_ray(&ray)?;
    Some(ray.point_at(t) - direction * sphere.radius)
}

/// Sliding plane of `polygon` when `sphere` touches it
///
/// The returned plane carries the polygon and faces the sphere center, so
/// it can be fed to [`slide`] directly for a body at rest. A moving body has
/// to face the plane towards the position it came from instead, see
/// [`Plane::facing`]. Degenerate polygons never collide.
pub fn sphere_polygon_contact(sphere: &BoundingSphere, polygon: &Polygon) -> Option<Plane> {
    let plane = polygon.plane()?;
    let distance = plane.distance_to_point(sphere.center);
    if distance.abs() > sphere.radius {
        return None;
    }

    let closest = polygon.closest_point(sphere.center);
    if !sphere.contains_point(closest) {
        return None;
    }

    Some(plane.facing(sphere.center))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor_plane() -> Plane {
        Plane::from_point_normal(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0)).unwrap()
    }

    fn floor_polygon() -> Polygon {
        Polygon::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, -10.0),
        )
    }

    #[test]
    fn test_slide_at_contact_is_identity() {
        let position = Vec3::new(3.0, 0.5, -2.0);
        assert_eq!(slide(&floor_plane(), position, 0.5), position);
    }

    #[test]
    fn test_slide_clear_of_plane_is_identity() {
        let position = Vec3::new(3.0, 4.0, -2.0);
        assert_eq!(slide(&floor_plane(), position, 0.5), position);
    }

    #[test]
    fn test_slide_pushes_penetrating_position_to_radius() {
        let plane = floor_plane();
        let corrected = slide(&plane, Vec3::new(3.0, 0.2, -2.0), 0.5);
        assert_relative_eq!(corrected, Vec3::new(3.0, 0.5, -2.0), epsilon = 1.0e-6);
        assert_relative_eq!(plane.distance_to_point(corrected), 0.5, epsilon = 1.0e-6);
    }

    #[test]
    fn test_slide_on_tilted_plane() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)).unwrap();
        let corrected = slide(&plane, Vec3::new(0.0, 1.0, 0.0), 2.0);
        assert_relative_eq!(plane.distance_to_point(corrected), 2.0, epsilon = 1.0e-5);
    }

    #[test]
    fn test_ground_position() {
        let sphere = BoundingSphere::new(Vec3::new(1.0, 5.0, 1.0), 0.5);
        let ground = ground_position(&sphere, &floor_polygon(), Vec3::new(0.0, -1.0, 0.0)).unwrap();
        assert_relative_eq!(ground, Vec3::new(1.0, 0.5, 1.0), epsilon = 1.0e-6);
    }

    #[test]
    fn test_ground_position_misses_distant_polygon() {
        let sphere = BoundingSphere::new(Vec3::new(50.0, 5.0, 0.0), 0.5);
        assert!(ground_position(&sphere, &floor_polygon(), Vec3::new(0.0, -1.0, 0.0)).is_none());
        assert!(ground_position(&sphere, &floor_polygon(), Vec3::zeros()).is_none());
    }

    #[test]
    fn test_sphere_polygon_contact_faces_sphere() {
        let polygon = floor_polygon();

        let above = BoundingSphere::new(Vec3::new(0.0, 0.3, 0.0), 0.5);
        let plane = sphere_polygon_contact(&above, &polygon).unwrap();
        assert!(plane.distance_to_point(above.center) > 0.0);

        let below = BoundingSphere::new(Vec3::new(0.0, -0.3, 0.0), 0.5);
        let plane = sphere_polygon_contact(&below, &polygon).unwrap();
        assert!(plane.distance_to_point(below.center) > 0.0);
    }

    #[test]
    fn test_sphere_polygon_contact_on_border() {
        let polygon = floor_polygon();
        let beside = BoundingSphere::new(Vec3::new(10.3, 0.0, -10.0), 0.5);
        assert!(sphere_polygon_contact(&beside, &polygon).is_some());

        let far = BoundingSphere::new(Vec3::new(11.0, 0.0, -10.0), 0.5);
        assert!(sphere_polygon_contact(&far, &polygon).is_none());
    }

    #[test]
    fn test_sphere_away_from_plane_has_no_contact() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5);
        assert!(sphere_polygon_contact(&sphere, &floor_polygon()).is_none());
    }
}
