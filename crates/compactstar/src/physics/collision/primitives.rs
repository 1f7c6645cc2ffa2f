//! Primitive collision shapes and intersection algorithms
//!
//! Provides the geometric building blocks of the collision core: planes,
//! axis-aligned boxes, rays, segments, polygons and spheres, with the
//! intersection tests the tree and the response code rely on.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants, Axis, Vec2, Vec3};

/// A ray for ray casting and picking
///
/// The direction does not need to be normalized. Only points in front of the
/// origin (`t >= 0`) belong to the ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Creates a ray going from `from` through `to`
    pub fn through(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }

    /// Same ray with a unit-length direction
    pub fn normalized(&self) -> Self {
        Self::new(self.origin, self.direction.normalize())
    }

    /// Get a point along the ray at parameter t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Segment start point
    pub start: Vec3,
    /// Segment end point
    pub end: Vec3,
}

impl Segment {
    /// Creates a new segment
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Length of the segment
    pub fn length(&self) -> f32 {
        (self.end - self.start).norm()
    }

    /// Closest point of the segment to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge = self.end - self.start;
        let length_sq = edge.norm_squared();
        if length_sq <= f32::EPSILON {
            return self.start;
        }
        let t = ((point - self.start).dot(&edge) / length_sq).clamp(0.0, 1.0);
        self.start + edge * t
    }
}

/// Plane defined by a unit normal and a distance, `n·x + d = 0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal vector
    pub normal: Vec3,
    /// The `d` term of the plane equation
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance, normalizing the normal
    ///
    /// The distance is scaled together with the normal so the plane keeps
    /// describing the same set of points. Returns `None` for a zero normal.
    pub fn new(normal: Vec3, distance: f32) -> Option<Self> {
        let length = normal.norm();
        if length <= constants::DETERMINANT_EPSILON {
            return None;
        }
        Some(Self {
            normal: normal / length,
            distance: distance / length,
        })
    }

    /// Create the plane through `point` with the given normal
    ///
    /// Returns `None` for a zero normal.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Option<Self> {
        let normal = normal.try_normalize(constants::DETERMINANT_EPSILON)?;
        Some(Self {
            normal,
            distance: -normal.dot(&point),
        })
    }

    /// Create the plane through three points, wound counter-clockwise
    ///
    /// Returns `None` when the points are collinear.
    pub fn from_points(v0: Vec3, v1: Vec3, v2: Vec3) -> Option<Self> {
        let normal = (v1 - v0).cross(&(v2 - v0));
        let length = normal.norm();
        if length <= constants::DETERMINANT_EPSILON {
            return None;
        }
        Self::from_point_normal(v0, normal / length)
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// The same plane facing the other way
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// The same plane, flipped if needed so `point` is on its front side
    ///
    /// A point lying on the plane keeps the current orientation.
    pub fn facing(&self, point: Vec3) -> Self {
        if self.distance_to_point(point) < 0.0 {
            self.flipped()
        } else {
            *self
        }
    }

    /// Parameter along the infinite line carried by `ray` where it crosses the
    /// plane, `None` when the line is parallel to the plane
    pub fn intersect_line(&self, ray: &Ray) -> Option<f32> {
        let denominator = self.normal.dot(&ray.direction);
        if denominator.abs() <= f32::EPSILON {
            return None;
        }
        Some(-self.distance_to_point(ray.origin) / denominator)
    }

    /// Point where the ray crosses the plane
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        let t = self.intersect_line(ray)?;
        (t >= 0.0).then(|| (t, ray.point_at(t)))
    }

    /// Point where the segment crosses the plane
    pub fn intersect_segment(&self, segment: &Segment) -> Option<Vec3> {
        let ray = Ray::through(segment.start, segment.end);
        let t = self.intersect_line(&ray)?;
        (0.0..=1.0).contains(&t).then(|| ray.point_at(t))
    }
}

/// Axis-Aligned Bounding Box
///
/// [`Aabb::EMPTY`] is the state of a box that has absorbed no point yet. It
/// is distinct from a zero-volume box built from a single point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// A box containing nothing
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Tight box around a set of points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for point in points {
            aabb.extend_point(point);
        }
        aabb
    }

    /// Tight box around a set of polygons
    pub fn from_polygons<'a>(polygons: impl IntoIterator<Item = &'a Polygon>) -> Self {
        let mut aabb = Self::EMPTY;
        for polygon in polygons {
            aabb.extend_polygon(polygon);
        }
        aabb
    }

    /// Whether no point has been absorbed yet
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box so it contains `point`
    pub fn extend_point(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grow the box so it contains every vertex of `polygon`
    pub fn extend_polygon(&mut self, polygon: &Polygon) {
        for vertex in &polygon.vertices {
            self.extend_point(vertex);
        }
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths of the box
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Longest edge of the box, preferring X, then Y, then Z on ties
    pub fn longest_axis(&self) -> Axis {
        let size = self.size().abs();
        if size.x >= size.y && size.x >= size.z {
            Axis::X
        } else if size.y >= size.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Cut the box in two halves at the middle of its longest axis
    pub fn split(&self) -> (Aabb, Aabb) {
        let axis = self.longest_axis().index();
        let middle = self.min[axis] + (self.max[axis] - self.min[axis]) * 0.5;

        let mut left = *self;
        let mut right = *self;
        left.max[axis] = middle;
        right.min[axis] = middle;
        (left, right)
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.contains_point_with_tolerance(point, 0.0)
    }

    /// Check if a point lies in this AABB grown by `tolerance` on every side
    pub fn contains_point_with_tolerance(&self, point: &Vec3, tolerance: f32) -> bool {
        point.x >= self.min.x - tolerance && point.x <= self.max.x + tolerance &&
        point.y >= self.min.y - tolerance && point.y <= self.max.y + tolerance &&
        point.z >= self.min.z - tolerance && point.z <= self.max.z + tolerance
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// Returns the entry and exit parameters along the ray, the entry clamped
    /// to 0 when the origin is inside the box. Axes where the direction is zero
    /// only hit when the origin lies between the slab planes.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];

            if direction == 0.0 {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let t1 = (self.min[axis] - origin) * inv;
            let t2 = (self.max[axis] - origin) * inv;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_far >= t_near && t_far >= 0.0 {
            Some((t_near.max(0.0), t_far))
        } else {
            None
        }
    }
}

/// A triangle, the only shape the collision core tests against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// The three vertices, in source winding order
    pub vertices: [Vec3; 3],
}

impl Polygon {
    /// Creates a new polygon
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { vertices: [v0, v1, v2] }
    }

    /// Calculates the unit normal of the polygon (right-hand rule)
    ///
    /// Returns `None` for degenerate polygons.
    pub fn normal(&self) -> Option<Vec3> {
        self.plane().map(|plane| plane.normal)
    }

    /// The plane carrying this polygon
    pub fn plane(&self) -> Option<Plane> {
        let [v0, v1, v2] = self.vertices;
        Plane::from_points(v0, v1, v2)
    }

    /// Calculates the centroid (center point) of the polygon
    pub fn centroid(&self) -> Vec3 {
        let [v0, v1, v2] = self.vertices;
        (v0 + v1 + v2) / 3.0
    }

    /// Tight box around the polygon
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Möller-Trumbore ray-triangle intersection algorithm
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    ///
    /// See: "Fast, Minimum Storage Ray/Triangle Intersection" by Möller & Trumbore
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        let [v0, v1, v2] = self.vertices;

        // Calculate edges from v0
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        // Calculate determinant
        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle?
        if a.abs() < constants::DETERMINANT_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - v0;
        let u = f * s.dot(&h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        // Calculate t (distance along ray)
        let t = f * edge2.dot(&q);

        (t >= 0.0).then_some((t, u, v))
    }

    /// Whether a point lying on the polygon plane is inside the polygon
    /// borders, within `tolerance` in barycentric space
    pub fn contains_coplanar_point(&self, point: Vec3, tolerance: f32) -> bool {
        let [v0, v1, v2] = self.vertices;
        let e0 = v1 - v0;
        let e1 = v2 - v0;
        let p = point - v0;

        let d00 = e0.dot(&e0);
        let d01 = e0.dot(&e1);
        let d11 = e1.dot(&e1);
        let d20 = p.dot(&e0);
        let d21 = p.dot(&e1);

        let denominator = d00 * d11 - d01 * d01;
        if denominator.abs() <= f32::EPSILON {
            return false;
        }

        let v = (d11 * d20 - d01 * d21) / denominator;
        let w = (d00 * d21 - d01 * d20) / denominator;
        let u = 1.0 - v - w;

        u >= -tolerance && v >= -tolerance && w >= -tolerance
    }

    /// Get the closest point on the polygon to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let v0_to_point = point - v0;

        let d1 = edge1.dot(&v0_to_point);
        let d2 = edge2.dot(&v0_to_point);

        // Vertex region outside v0
        if d1 <= 0.0 && d2 <= 0.0 {
            return v0;
        }

        // Vertex region outside v1
        let v1_to_point = point - v1;
        let d3 = edge1.dot(&v1_to_point);
        let d4 = edge2.dot(&v1_to_point);
        if d3 >= 0.0 && d4 <= d3 {
            return v1;
        }

        // Vertex region outside v2
        let v2_to_point = point - v2;
        let d5 = edge1.dot(&v2_to_point);
        let d6 = edge2.dot(&v2_to_point);
        if d6 >= 0.0 && d5 <= d6 {
            return v2;
        }

        // Edge regions
        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return v0 + edge1 * v;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return v0 + edge2 * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return v1 + (v2 - v1) * w;
        }

        // Inside the face
        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        v0 + edge1 * v + edge2 * w
    }
}

/// A bounding sphere, the collision body of characters and cameras
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if a point lies inside or on the sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let radius_sum = self.radius + other.radius;
        (self.center - other.center).norm_squared() <= radius_sum * radius_sum
    }

    /// Box enclosing the sphere
    pub fn bounding_box(&self) -> Aabb {
        let extent = Vec3::repeat(self.radius);
        Aabb::new(self.center - extent, self.center + extent)
    }
}

/// Result of an exact ray/polygon test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Parameter along the ray where the polygon was hit
    pub distance: f32,
    /// The point of intersection
    pub point: Vec3,
    /// The unit normal of the polygon that was hit
    pub normal: Vec3,
    /// Barycentric `(u, v)` weights of `vertices[1]` and `vertices[2]` at the hit point
    pub barycentric: Vec2,
    /// The polygon that was hit
    pub polygon: Polygon,
}
