//! Icosahedron bootstrap: 12 vertices and 20 root triangles in 5 groups.

use glam::DVec3;

use super::{SkeletonVertexData, SubdivTriangleSkeleton};
use crate::ids::{SkTriGroupId, SkTriId, SkVrtxId};
use crate::shape::{SphereShape, SurfaceShape};

pub const ICO_VERTEX_COUNT: usize = 12;
pub const ICO_TRI_COUNT: usize = 20;
pub const ICO_GROUP_COUNT: usize = 5;

const PHI: f64 = 1.618_033_988_749_895;

/// Unnormalized corner directions.
const ICO_VERTICES: [[f64; 3]; ICO_VERTEX_COUNT] = [
  [-1.0, PHI, 0.0],
  [1.0, PHI, 0.0],
  [-1.0, -PHI, 0.0],
  [1.0, -PHI, 0.0],
  [0.0, -1.0, PHI],
  [0.0, 1.0, PHI],
  [0.0, -1.0, -PHI],
  [0.0, 1.0, -PHI],
  [PHI, 0.0, -1.0],
  [PHI, 0.0, 1.0],
  [-PHI, 0.0, -1.0],
  [-PHI, 0.0, 1.0],
];

/// Counter-clockwise seen from outside.
const ICO_FACES: [[usize; 3]; ICO_TRI_COUNT] = [
  [0, 11, 5],
  [0, 5, 1],
  [0, 1, 7],
  [0, 7, 10],
  [0, 10, 11],
  [1, 5, 9],
  [5, 11, 4],
  [11, 10, 2],
  [10, 7, 6],
  [7, 1, 8],
  [3, 9, 4],
  [3, 4, 2],
  [3, 2, 6],
  [3, 6, 8],
  [3, 8, 9],
  [4, 9, 5],
  [2, 4, 11],
  [6, 2, 10],
  [8, 6, 7],
  [9, 8, 1],
];

/// Ids created by [`create_skeleton_icosahedron`].
#[derive(Clone, Debug)]
pub struct IcoSphereTris {
  pub vertices: [SkVrtxId; ICO_VERTEX_COUNT],
  pub groups: [SkTriGroupId; ICO_GROUP_COUNT],
  pub tris: [SkTriId; ICO_TRI_COUNT],
}

/// Add a fully connected icosahedron of `radius` meters to an empty
/// skeleton.
pub fn create_skeleton_icosahedron(
  skeleton: &mut SubdivTriangleSkeleton,
  sk_data: &mut SkeletonVertexData,
  radius: f64,
) -> IcoSphereTris {
  let sphere = SphereShape::new(radius);

  let vertices: [SkVrtxId; ICO_VERTEX_COUNT] = std::array::from_fn(|i| {
    let vrtx = skeleton.vrtx_create_root();
    let pos = sphere.project(DVec3::from_array(ICO_VERTICES[i]));
    sk_data.set_vertex(vrtx, pos, sphere.normal_at(pos).as_vec3());
    vrtx
  });

  let groups: [SkTriGroupId; ICO_GROUP_COUNT] = std::array::from_fn(|g| {
    let corners = std::array::from_fn(|i| ICO_FACES[g * 4 + i].map(|v| vertices[v]));
    skeleton.tri_group_create_root(corners)
  });

  let tris: [SkTriId; ICO_TRI_COUNT] = std::array::from_fn(|i| groups[i / 4].triangle((i % 4) as u8));
  skeleton.tri_connect_edges(&tris);
  sk_data.update_tri_centers(skeleton, &sphere, groups);

  IcoSphereTris {
    vertices,
    groups,
    tris,
  }
}
