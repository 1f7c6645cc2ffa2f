//! Polygon extraction from vertex buffers
//!
//! Mesh loaders hand the collision core a flat `f32` buffer in which every
//! vertex occupies `stride` floats, position first, followed by whatever the
//! renderer interleaves (normal, color, texture coordinates). This module
//! turns such a buffer into the triangle list the AABB tree is built from.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::primitives::Polygon;
use crate::foundation::math::Vec3;

/// Number of floats holding a vertex position
const POSITION_COMPONENTS: usize = 3;

/// Primitive layout of a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexTopology {
    /// Every 3 vertices form a triangle
    Triangles,
    /// Each vertex after the second forms a triangle with the two before it
    TriangleStrip,
    /// Each vertex after the second forms a triangle with the previous one and the first
    TriangleFan,
    /// Every 4 vertices form a quad
    Quads,
    /// Each pair of vertices after the first pair forms a quad with the previous pair
    QuadStrip,
}

impl VertexTopology {
    /// Smallest vertex count that produces a primitive
    pub const fn min_vertices(self) -> usize {
        match self {
            Self::Triangles | Self::TriangleStrip | Self::TriangleFan => 3,
            Self::Quads | Self::QuadStrip => 4,
        }
    }

    /// Number of triangles produced from `vertex_count` vertices
    pub const fn triangle_count(self, vertex_count: usize) -> usize {
        if vertex_count < self.min_vertices() {
            return 0;
        }
        match self {
            Self::Triangles => vertex_count / 3,
            Self::TriangleStrip | Self::TriangleFan => vertex_count - 2,
            Self::Quads => (vertex_count / 4) * 2,
            Self::QuadStrip => ((vertex_count - 2) / 2) * 2,
        }
    }

    fn check_vertex_count(self, vertex_count: usize) -> Result<(), ExtractError> {
        if vertex_count < self.min_vertices() {
            return Err(ExtractError::InsufficientVertices {
                topology: self,
                required: self.min_vertices(),
                found: vertex_count,
            });
        }

        let complete = match self {
            Self::Triangles => vertex_count % 3 == 0,
            Self::Quads => vertex_count % 4 == 0,
            Self::QuadStrip => vertex_count % 2 == 0,
            Self::TriangleStrip | Self::TriangleFan => true,
        };

        if complete {
            Ok(())
        } else {
            Err(ExtractError::IncompleteTopology { topology: self, vertex_count })
        }
    }

    /// Vertex slots of every triangle described by `vertex_count` vertices
    ///
    /// Strips keep the source winding by swapping the first two slots of
    /// every odd triangle. Quads are always cut along the v3-v2 diagonal.
    pub fn triangle_indices(self, vertex_count: usize) -> Result<Vec<[usize; 3]>, ExtractError> {
        self.check_vertex_count(vertex_count)?;

        let mut triangles = Vec::with_capacity(self.triangle_count(vertex_count));

        match self {
            Self::Triangles => {
                for first in (0..vertex_count).step_by(3) {
                    triangles.push([first, first + 1, first + 2]);
                }
            }
            Self::TriangleStrip => {
                for i in 0..vertex_count - 2 {
                    if i % 2 == 0 {
                        triangles.push([i, i + 1, i + 2]);
                    } else {
                        triangles.push([i + 1, i, i + 2]);
                    }
                }
            }
            Self::TriangleFan => {
                for i in 1..vertex_count - 1 {
                    triangles.push([0, i, i + 1]);
                }
            }
            Self::Quads => {
                for first in (0..vertex_count).step_by(4) {
                    push_quad(&mut triangles, first);
                }
            }
            Self::QuadStrip => {
                for first in (0..vertex_count - 2).step_by(2) {
                    push_quad(&mut triangles, first);
                }
            }
        }

        Ok(triangles)
    }
}

fn push_quad(triangles: &mut Vec<[usize; 3]>, first: usize) {
    let (v1, v2, v3, v4) = (first, first + 1, first + 2, first + 3);
    triangles.push([v1, v2, v3]);
    triangles.push([v3, v2, v4]);
}

/// Polygon extraction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The stride leaves no room for a position
    #[error("Invalid stride {0}: a vertex needs at least 3 floats")]
    InvalidStride(usize),

    /// The buffer does not hold a whole number of vertices
    #[error("Buffer length {length} is not a multiple of stride {stride}")]
    StrideMismatch {
        /// Number of floats in the buffer
        length: usize,
        /// Floats per vertex
        stride: usize,
    },

    /// Not enough vertices for a single primitive
    #[error("{topology:?} needs at least {required} vertices, found {found}")]
    InsufficientVertices {
        /// Declared topology
        topology: VertexTopology,
        /// Minimum vertex count
        required: usize,
        /// Vertex count in the buffer
        found: usize,
    },

    /// Trailing vertices that do not complete a primitive
    #[error("{vertex_count} vertices do not form whole {topology:?} primitives")]
    IncompleteTopology {
        /// Declared topology
        topology: VertexTopology,
        /// Vertex count in the buffer
        vertex_count: usize,
    },

    /// An index refers past the end of the vertex buffer
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index
        index: u32,
        /// Vertex count in the buffer
        vertex_count: usize,
    },
}

/// Read-only view over an interleaved vertex buffer
#[derive(Debug, Clone, Copy)]
struct VertexBuffer<'a> {
    data: &'a [f32],
    stride: usize,
}

impl<'a> VertexBuffer<'a> {
    fn new(data: &'a [f32], stride: usize) -> Result<Self, ExtractError> {
        if stride < POSITION_COMPONENTS {
            return Err(ExtractError::InvalidStride(stride));
        }
        if data.len() % stride != 0 {
            return Err(ExtractError::StrideMismatch { length: data.len(), stride });
        }
        Ok(Self { data, stride })
    }

    fn vertex_count(&self) -> usize {
        self.data.len() / self.stride
    }

    fn position(&self, vertex: usize) -> Vec3 {
        let offset = vertex * self.stride;
        Vec3::new(self.data[offset], self.data[offset + 1], self.data[offset + 2])
    }
}

/// Extract the triangles of a non-indexed vertex buffer
///
/// An empty buffer is an empty mesh and yields no polygons. Any other
/// malformed input is rejected as a whole; no partial triangle list is ever
/// returned.
pub fn extract_polygons(
    vertices: &[f32],
    stride: usize,
    topology: VertexTopology,
) -> Result<Vec<Polygon>, ExtractError> {
    let buffer = VertexBuffer::new(vertices, stride).map_err(log_rejected)?;
    if buffer.vertex_count() == 0 {
        return Ok(Vec::new());
    }

    let triangles = topology
        .triangle_indices(buffer.vertex_count())
        .map_err(log_rejected)?;

    Ok(triangles
        .into_iter()
        .map(|[a, b, c]| Polygon::new(buffer.position(a), buffer.position(b), buffer.position(c)))
        .collect())
}

/// Extract the triangles of an indexed vertex buffer
///
/// The topology is applied to the index list, so an indexed strip decodes
/// exactly like the equivalent non-indexed strip.
pub fn extract_indexed_polygons(
    vertices: &[f32],
    stride: usize,
    indices: &[u32],
    topology: VertexTopology,
) -> Result<Vec<Polygon>, ExtractError> {
    let buffer = VertexBuffer::new(vertices, stride).map_err(log_rejected)?;
    if indices.is_empty() {
        return Ok(Vec::new());
    }

    let vertex_count = buffer.vertex_count();
    let mut resolved = Vec::with_capacity(indices.len());
    for &index in indices {
        match usize::try_from(index) {
            Ok(slot) if slot < vertex_count => resolved.push(slot),
            _ => return Err(log_rejected(ExtractError::IndexOutOfRange { index, vertex_count })),
        }
    }

    let triangles = topology
        .triangle_indices(resolved.len())
        .map_err(log_rejected)?;

    Ok(triangles
        .into_iter()
        .map(|[a, b, c]| {
            Polygon::new(
                buffer.position(resolved[a]),
                buffer.position(resolved[b]),
                buffer.position(resolved[c]),
            )
        })
        .collect())
}

fn log_rejected(error: ExtractError) -> ExtractError {
    warn!("Rejected vertex buffer: {error}");
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Buffer of `count` vertices with an interleaved 2-float payload after each position
    fn interleaved(count: usize) -> Vec<f32> {
        let mut data = Vec::with_capacity(count * 5);
        for i in 0..count {
            let i = i as f32;
            data.extend_from_slice(&[i, i * 10.0, i * 100.0, -1.0, -1.0]);
        }
        data
    }

    fn vertex(i: usize) -> Vec3 {
        let i = i as f32;
        Vec3::new(i, i * 10.0, i * 100.0)
    }

    #[test]
    fn test_triangle_list() {
        let polygons = extract_polygons(&interleaved(6), 5, VertexTopology::Triangles).unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[1], Polygon::new(vertex(3), vertex(4), vertex(5)));
    }

    #[test]
    fn test_triangle_strip_keeps_winding() {
        let polygons = extract_polygons(&interleaved(5), 5, VertexTopology::TriangleStrip).unwrap();
        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0], Polygon::new(vertex(0), vertex(1), vertex(2)));
        assert_eq!(polygons[1], Polygon::new(vertex(2), vertex(1), vertex(3)));
        assert_eq!(polygons[2], Polygon::new(vertex(2), vertex(3), vertex(4)));
    }

    #[test]
    fn test_triangle_fan() {
        let polygons = extract_polygons(&interleaved(5), 5, VertexTopology::TriangleFan).unwrap();
        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0], Polygon::new(vertex(0), vertex(1), vertex(2)));
        assert_eq!(polygons[2], Polygon::new(vertex(0), vertex(3), vertex(4)));
    }

    #[test]
    fn test_quads_use_fixed_diagonal() {
        let polygons = extract_polygons(&interleaved(8), 5, VertexTopology::Quads).unwrap();
        assert_eq!(polygons.len(), 4);
        assert_eq!(polygons[0], Polygon::new(vertex(0), vertex(1), vertex(2)));
        assert_eq!(polygons[1], Polygon::new(vertex(2), vertex(1), vertex(3)));
        assert_eq!(polygons[3], Polygon::new(vertex(6), vertex(5), vertex(7)));
    }

    #[test]
    fn test_quad_strip() {
        let polygons = extract_polygons(&interleaved(6), 5, VertexTopology::QuadStrip).unwrap();
        assert_eq!(polygons.len(), 4);
        assert_eq!(polygons[2], Polygon::new(vertex(2), vertex(3), vertex(4)));
        assert_eq!(polygons[3], Polygon::new(vertex(4), vertex(3), vertex(5)));
    }

    #[test]
    fn test_triangle_counts_match_topology_formula() {
        let cases = [
            (VertexTopology::Triangles, 9),
            (VertexTopology::TriangleStrip, 7),
            (VertexTopology::TriangleFan, 10),
            (VertexTopology::Quads, 12),
            (VertexTopology::QuadStrip, 10),
        ];

        for (topology, count) in cases {
            let polygons = extract_polygons(&interleaved(count), 5, topology).unwrap();
            assert_eq!(polygons.len(), topology.triangle_count(count), "{topology:?}");
        }

        assert_eq!(VertexTopology::TriangleStrip.triangle_count(7), 5);
        assert_eq!(VertexTopology::QuadStrip.triangle_count(10), 8);
    }

    #[test]
    fn test_empty_buffer_is_empty_mesh() {
        let polygons = extract_polygons(&[], 3, VertexTopology::Triangles).unwrap();
        assert!(polygons.is_empty());
    }

    #[test]
    fn test_stride_errors() {
        assert_eq!(
            extract_polygons(&interleaved(3), 2, VertexTopology::Triangles),
            Err(ExtractError::InvalidStride(2))
        );
        assert_eq!(
            extract_polygons(&interleaved(3), 4, VertexTopology::Triangles),
            Err(ExtractError::StrideMismatch { length: 15, stride: 4 })
        );
    }

    #[test]
    fn test_insufficient_vertices() {
        let result = extract_polygons(&interleaved(2), 5, VertexTopology::Triangles);
        assert!(matches!(result, Err(ExtractError::InsufficientVertices { required: 3, found: 2, .. })));

        let result = extract_polygons(&interleaved(3), 5, VertexTopology::QuadStrip);
        assert!(matches!(result, Err(ExtractError::InsufficientVertices { required: 4, found: 3, .. })));
    }

    #[test]
    fn test_incomplete_primitives() {
        let result = extract_polygons(&interleaved(7), 5, VertexTopology::Triangles);
        assert!(matches!(result, Err(ExtractError::IncompleteTopology { vertex_count: 7, .. })));

        let result = extract_polygons(&interleaved(7), 5, VertexTopology::QuadStrip);
        assert!(matches!(result, Err(ExtractError::IncompleteTopology { .. })));
    }

    #[test]
    fn test_indexed_extraction() {
        let vertices = interleaved(4);
        let polygons = extract_indexed_polygons(
            &vertices,
            5,
            &[0, 1, 2, 2, 1, 3],
            VertexTopology::Triangles,
        )
        .unwrap();

        let quads = extract_polygons(&vertices, 5, VertexTopology::Quads).unwrap();
        assert_eq!(polygons, quads);
    }

    #[test]
    fn test_indexed_out_of_range() {
        let result = extract_indexed_polygons(&interleaved(3), 5, &[0, 1, 3], VertexTopology::Triangles);
        assert_eq!(result, Err(ExtractError::IndexOutOfRange { index: 3, vertex_count: 3 }));
    }
}
