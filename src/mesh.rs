//! Structured meshes of the rectangular model domain.
//!
//! The sweep treats meshes as opaque engine input; all it ever asks of one
//! is its local mesh size. [`StructuredMesh`] is the uniform rectangle
//! partition the study runs on, split into quadrilaterals or right
//! triangles.

use crate::Resolution;

/// Cell shape of the structured mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
  Triangle,
  Quadrilateral,
}

impl ElementKind {
  pub const ALL: [ElementKind; 2] = [Self::Triangle, Self::Quadrilateral];

  pub fn label(self) -> &'static str {
    match self {
      Self::Triangle => "tri",
      Self::Quadrilateral => "quad",
    }
  }
}

impl std::fmt::Display for ElementKind {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

pub struct Rect {
  min: na::Vector2<f64>,
  max: na::Vector2<f64>,
}

impl Rect {
  pub fn new_min_max(min: na::Vector2<f64>, max: na::Vector2<f64>) -> Self {
    assert!(min.x < max.x && min.y < max.y);
    Self { min, max }
  }
  pub fn new_unit_square() -> Self {
    Self::new_min_max(na::Vector2::zeros(), na::Vector2::new(1.0, 1.0))
  }

  pub fn min(&self) -> &na::Vector2<f64> {
    &self.min
  }
  pub fn max(&self) -> &na::Vector2<f64> {
    &self.max
  }
  pub fn side_lengths(&self) -> na::Vector2<f64> {
    self.max - self.min
  }
  pub fn area(&self) -> f64 {
    let sides = self.side_lengths();
    sides.x * sides.y
  }
}

/// Uniform partition of a rectangle into `n x n` boxes, each box either one
/// quadrilateral cell or two right-triangle cells split along the diagonal.
pub struct StructuredMesh {
  rect: Rect,
  nboxes_axis: usize,
  element_kind: ElementKind,
}

// constructors
impl StructuredMesh {
  pub fn new(rect: Rect, nboxes_axis: usize, element_kind: ElementKind) -> Self {
    assert!(nboxes_axis >= 1);
    Self {
      rect,
      nboxes_axis,
      element_kind,
    }
  }
  pub fn new_unit_square(nboxes_axis: Resolution, element_kind: ElementKind) -> Self {
    Self::new(Rect::new_unit_square(), nboxes_axis, element_kind)
  }
}

// getters
impl StructuredMesh {
  pub fn rect(&self) -> &Rect {
    &self.rect
  }
  pub fn element_kind(&self) -> ElementKind {
    self.element_kind
  }
  pub fn nboxes_axis(&self) -> usize {
    self.nboxes_axis
  }
  pub fn nboxes(&self) -> usize {
    self.nboxes_axis * self.nboxes_axis
  }
  pub fn ncells(&self) -> usize {
    match self.element_kind {
      ElementKind::Quadrilateral => self.nboxes(),
      ElementKind::Triangle => 2 * self.nboxes(),
    }
  }
  pub fn box_lengths(&self) -> na::Vector2<f64> {
    self.rect.side_lengths() / self.nboxes_axis as f64
  }

  /// Diameter of a cell. Both cell kinds share the box diagonal as their
  /// longest chord.
  pub fn cell_diameter(&self) -> f64 {
    self.box_lengths().norm()
  }

  /// Measure of a single cell; the partition is uniform.
  pub fn cell_measure(&self) -> f64 {
    let box_measure = self.rect.area() / self.nboxes() as f64;
    match self.element_kind {
      ElementKind::Quadrilateral => box_measure,
      ElementKind::Triangle => box_measure / 2.0,
    }
  }

  /// Sample sites of the mesh, one column per cell: box centers for
  /// quadrilaterals, centroids of the lower/upper triangle per box for
  /// triangles. Boxes are ordered row-major, x fastest.
  pub fn cell_centers(&self) -> na::DMatrix<f64> {
    let lengths = self.box_lengths();
    let mut centers = na::DMatrix::zeros(2, self.ncells());

    let mut icell = 0;
    for iy in 0..self.nboxes_axis {
      for ix in 0..self.nboxes_axis {
        let origin =
          self.rect.min() + na::Vector2::new(ix as f64 * lengths.x, iy as f64 * lengths.y);
        match self.element_kind {
          ElementKind::Quadrilateral => {
            centers
              .column_mut(icell)
              .copy_from(&(origin + 0.5 * lengths));
            icell += 1;
          }
          ElementKind::Triangle => {
            // Lower triangle (origin, +x, +x+y), upper triangle (origin, +y, +x+y).
            let lower = origin + na::Vector2::new(2.0 / 3.0 * lengths.x, 1.0 / 3.0 * lengths.y);
            let upper = origin + na::Vector2::new(1.0 / 3.0 * lengths.x, 2.0 / 3.0 * lengths.y);
            centers.column_mut(icell).copy_from(&lower);
            centers.column_mut(icell + 1).copy_from(&upper);
            icell += 2;
          }
        }
      }
    }
    centers
  }
}

/// External collaborator that turns (element kind, resolution) into a mesh.
pub trait MeshProvider {
  type Mesh;

  fn build(&self, kind: ElementKind, resolution: Resolution) -> Self::Mesh;
  /// Local mesh size of a built mesh, fed into parameter resolution.
  fn cell_diameter(&self, mesh: &Self::Mesh) -> f64;
}

/// Uniform meshes of the unit square, the model domain of the study.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitSquareMeshes;

impl MeshProvider for UnitSquareMeshes {
  type Mesh = StructuredMesh;

  fn build(&self, kind: ElementKind, resolution: Resolution) -> StructuredMesh {
    StructuredMesh::new_unit_square(resolution, kind)
  }
  fn cell_diameter(&self, mesh: &StructuredMesh) -> f64 {
    mesh.cell_diameter()
  }
}
