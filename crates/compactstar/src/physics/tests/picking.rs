//! Picking through interleaved vertex buffers

use approx::assert_relative_eq;

use crate::config::CollisionConfig;
use crate::foundation::math::Vec3;
use crate::physics::collision::{extract_polygons, Polygon, Ray, VertexTopology};
use crate::physics::CollisionMesh;
use crate::spatial::AabbTree;

/// Position followed by a normal, as the renderer uploads it
const STRIDE: usize = 6;

fn interleaved(positions: &[[f32; 3]]) -> Vec<f32> {
    positions
        .iter()
        .flat_map(|p| [p[0], p[1], p[2], 0.0, 0.0, 1.0])
        .collect()
}

#[test]
fn test_single_triangle_scenario() {
    crate::foundation::logging::init_for_tests();

    let vertices = interleaved(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let polygons = extract_polygons(&vertices, STRIDE, VertexTopology::Triangles).unwrap();
    assert_eq!(polygons.len(), 1);

    let tree = AabbTree::build(&polygons).unwrap();
    let root_box = tree.root_box();
    assert_eq!(root_box.min, Vec3::zeros());
    assert_eq!(root_box.max, Vec3::new(1.0, 1.0, 0.0));

    let hit = Ray::new(Vec3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(tree.resolve(&hit), polygons);

    let miss = Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
    assert!(tree.resolve(&miss).is_empty());
}

#[test]
fn test_fan_picking() {
    crate::foundation::logging::init_for_tests();

    // Hexagon-ish fan around the origin in the z = 0 plane
    let mut positions = vec![[0.0, 0.0, 0.0]];
    for step in 0..=12 {
        let angle = step as f32 * std::f32::consts::TAU / 12.0;
        positions.push([angle.cos() * 4.0, angle.sin() * 4.0, 0.0]);
    }
    let vertices = interleaved(&positions);

    let mesh = CollisionMesh::from_vertices(&vertices, STRIDE, VertexTopology::TriangleFan, CollisionConfig::default())
        .unwrap();
    assert!(mesh.tree().stats().leaf_count >= 1);

    for (x, y) in [(0.5, 0.5), (-2.0, 1.0), (1.5, -2.5), (-1.0, -1.0)] {
        let ray = Ray::new(Vec3::new(x, y, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = mesh.pick(&ray).unwrap();
        assert_relative_eq!(hit.point, Vec3::new(x, y, 0.0), epsilon = 1.0e-4);
        assert_relative_eq!(hit.distance, 10.0, epsilon = 1.0e-4);
    }

    let outside = Ray::new(Vec3::new(4.5, 4.5, 10.0), Vec3::new(0.0, 0.0, -1.0));
    assert!(mesh.pick(&outside).is_none());
}

#[test]
fn test_pick_matches_brute_force() {
    // Staircase of quads, each step 1 unit higher and 1 unit further along x
    let mut polygons: Vec<Polygon> = Vec::new();
    for step in 0..10 {
        let (x, z) = (step as f32, step as f32);
        let quad = [
            x, 0.0, z,
            x + 1.0, 0.0, z,
            x, 3.0, z,
            x + 1.0, 3.0, z,
        ];
        polygons.extend(extract_polygons(&quad, 3, VertexTopology::Quads).unwrap());
    }
    let mesh = CollisionMesh::new(&polygons, CollisionConfig::default()).unwrap();

    for i in 0..20 {
        let x = i as f32 * 0.5 + 0.25;
        let ray = Ray::new(Vec3::new(x, 1.5, 20.0), Vec3::new(0.0, 0.0, -1.0));

        let expected = polygons
            .iter()
            .filter_map(|polygon| polygon.intersect_ray(&ray).map(|(t, _, _)| t))
            .min_by(f32::total_cmp);
        let picked = mesh.pick(&ray).map(|hit| hit.distance);

        assert_eq!(picked.is_some(), expected.is_some());
        if let (Some(picked), Some(expected)) = (picked, expected) {
            assert_relative_eq!(picked, expected, epsilon = 1.0e-5);
        }
    }
}
