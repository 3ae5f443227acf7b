//! Fixed-point positions and normals for skeleton vertices.
//!
//! Planet-scale coordinates do not fit in `f32` with centimeter precision,
//! so skeleton positions are `i64` with `2^precision` units per meter.
//! Mesh buffers are filled in `f32` relative to the planet center.

use glam::{DVec3, I64Vec3, Vec3};

use super::SubdivTriangleSkeleton;
use crate::ids::{ArenaId, SkTriGroupId, SkTriId, SkVrtxId};
use crate::shape::SurfaceShape;

/// Per-vertex and per-triangle data, indexed by skeleton ids.
#[derive(Clone, Debug, Default)]
pub struct SkeletonVertexData {
  pub positions: Vec<I64Vec3>,
  pub normals: Vec<Vec3>,
  /// Surface point at each triangle's center, by [`SkTriId`].
  pub centers: Vec<I64Vec3>,
  /// Units per meter is `2^precision`.
  pub precision: i32,
}

impl SkeletonVertexData {
  pub fn new(precision: i32) -> Self {
    Self {
      precision,
      ..Default::default()
    }
  }

  #[inline]
  pub fn units_per_meter(&self) -> f64 {
    2f64.powi(self.precision)
  }

  #[inline]
  pub fn to_meters(&self, pos: I64Vec3) -> DVec3 {
    pos.as_dvec3() / self.units_per_meter()
  }

  #[inline]
  pub fn from_meters(&self, pos: DVec3) -> I64Vec3 {
    (pos * self.units_per_meter()).round().as_i64vec3()
  }

  #[inline]
  pub fn position_meters(&self, vrtx: SkVrtxId) -> DVec3 {
    self.to_meters(self.positions[vrtx.index()])
  }

  #[inline]
  pub fn center_meters(&self, tri: SkTriId) -> DVec3 {
    self.to_meters(self.centers[tri.index()])
  }

  fn ensure_vertex_capacity(&mut self, capacity: usize) {
    if self.positions.len() < capacity {
      self.positions.resize(capacity, I64Vec3::ZERO);
      self.normals.resize(capacity, Vec3::ZERO);
    }
  }

  pub fn set_vertex(&mut self, vrtx: SkVrtxId, meters: DVec3, normal: Vec3) {
    self.ensure_vertex_capacity(vrtx.index() + 1);
    self.positions[vrtx.index()] = self.from_meters(meters);
    self.normals[vrtx.index()] = normal;
  }

  /// Place midpoint vertices by projecting the middle of their parents onto
  /// the surface.
  ///
  /// `created` must be in creation order so parents are placed before their
  /// midpoints. Vertices that were freed again are skipped.
  pub fn place_new_vertices<S: SurfaceShape>(
    &mut self,
    skeleton: &SubdivTriangleSkeleton,
    shape: &S,
    created: &[SkVrtxId],
  ) {
    self.ensure_vertex_capacity(skeleton.vrtx_ids().capacity());
    for &vrtx in created {
      if !skeleton.vrtx_ids().exists(vrtx) {
        continue;
      }
      let Some([a, b]) = skeleton.vrtx_parents(vrtx) else {
        continue;
      };
      let middle = (self.position_meters(a) + self.position_meters(b)) * 0.5;
      let on_surface = shape.project(middle);
      self.set_vertex(vrtx, on_surface, shape.normal_at(on_surface).as_vec3());
    }
  }

  /// Compute the center of every triangle in `groups`.
  pub fn update_tri_centers<S: SurfaceShape>(
    &mut self,
    skeleton: &SubdivTriangleSkeleton,
    shape: &S,
    groups: impl IntoIterator<Item = SkTriGroupId>,
  ) {
    let capacity = skeleton.tri_group_ids().capacity() * 4;
    if self.centers.len() < capacity {
      self.centers.resize(capacity, I64Vec3::ZERO);
    }
    for group in groups {
      for tri in group.triangles() {
        let sum: DVec3 = skeleton
          .tri(tri)
          .vertices
          .iter()
          .map(|v| self.position_meters(*v))
          .sum();
        self.centers[tri.index()] = self.from_meters(shape.project(sum / 3.0));
      }
    }
  }
}
