//! Surface shapes that new vertices are projected onto.

use glam::DVec3;

/// Maps points in planet space (meters, planet centered) onto the surface.
///
/// Skeleton midpoints and chunk fill vertices are placed by projecting the
/// linear interpolation of their parents.
pub trait SurfaceShape {
  /// Project `point` onto the surface.
  fn project(&self, point: DVec3) -> DVec3;

  /// Unit surface normal at a point already on the surface.
  fn normal_at(&self, point: DVec3) -> DVec3;
}

/// Sphere centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereShape {
  pub radius: f64,
}

impl SphereShape {
  pub fn new(radius: f64) -> Self {
    Self { radius }
  }
}

impl SurfaceShape for SphereShape {
  #[inline]
  fn project(&self, point: DVec3) -> DVec3 {
    point.normalize_or_zero() * self.radius
  }

  #[inline]
  fn normal_at(&self, point: DVec3) -> DVec3 {
    point.normalize_or_zero()
  }
}
