//! Interface to the discretization engine.
//!
//! The engine is the expensive external collaborator: it assembles and
//! solves one formulation family on one mesh. Every `solve` is a blocking
//! call and the driver runs nothing concurrently with it, since engines may
//! assume exclusive use of process-wide solver state.

use crate::{error::Divergence, registry::FormulationFamily, resolver::ResolvedParameters, Degree};

/// Computed and exact fields of one solve, sampled over the mesh, plus the
/// consistent source term. Consumed once for error computation.
pub struct FieldPair {
  pub pressure: na::DVector<f64>,
  /// One column per sample site.
  pub velocity: na::DMatrix<f64>,
  pub pressure_exact: na::DVector<f64>,
  pub velocity_exact: na::DMatrix<f64>,
  pub source: na::DVector<f64>,
}

impl FieldPair {
  pub fn new(
    pressure: na::DVector<f64>,
    velocity: na::DMatrix<f64>,
    pressure_exact: na::DVector<f64>,
    velocity_exact: na::DMatrix<f64>,
    source: na::DVector<f64>,
  ) -> Self {
    let nsamples = pressure.len();
    assert!(nsamples > 0);
    assert_eq!(velocity.ncols(), nsamples);
    assert_eq!(pressure_exact.len(), nsamples);
    assert_eq!(velocity_exact.ncols(), nsamples);
    assert_eq!(source.len(), nsamples);
    Self {
      pressure,
      velocity,
      pressure_exact,
      velocity_exact,
      source,
    }
  }

  pub fn nsamples(&self) -> usize {
    self.pressure.len()
  }
}

pub trait DiscretizationEngine<M> {
  fn solve(
    &self,
    family: FormulationFamily,
    mesh: &M,
    degree: Degree,
    params: &ResolvedParameters,
  ) -> Result<FieldPair, Divergence>;

  /// Error norm of a solved field pair. Which norm is used belongs to the
  /// engine; the sweep only consumes the scalar.
  fn error_norm(&self, mesh: &M, fields: &FieldPair) -> f64 {
    let _ = mesh;
    rms_error(fields)
  }
}

/// Discrete root-mean-square of the pressure and velocity mismatches, the
/// default norm when an engine does not supply its own.
pub fn rms_error(fields: &FieldPair) -> f64 {
  let diff_p = &fields.pressure - &fields.pressure_exact;
  let diff_v = &fields.velocity - &fields.velocity_exact;
  ((diff_p.norm_squared() + diff_v.norm_squared()) / fields.nsamples() as f64).sqrt()
}

/// Discrete L2-type error over a uniform partition with the given cell
/// measure.
pub fn l2_error(fields: &FieldPair, cell_measure: f64) -> f64 {
  let diff_p = &fields.pressure - &fields.pressure_exact;
  let diff_v = &fields.velocity - &fields.velocity_exact;
  (cell_measure * (diff_p.norm_squared() + diff_v.norm_squared())).sqrt()
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;

  fn offset_pair(nsamples: usize, offset: f64) -> FieldPair {
    let pressure_exact = na::DVector::from_fn(nsamples, |i, _| (i as f64).sin());
    let velocity_exact = na::DMatrix::from_fn(2, nsamples, |i, j| (i + j) as f64);
    FieldPair::new(
      pressure_exact.clone().add_scalar(offset),
      velocity_exact.clone(),
      pressure_exact,
      velocity_exact,
      na::DVector::zeros(nsamples),
    )
  }

  #[test]
  fn rms_of_uniform_offset() {
    let fields = offset_pair(50, 3e-2);
    assert_relative_eq!(rms_error(&fields), 3e-2, epsilon = 1e-14);
  }

  #[test]
  fn exact_match_has_zero_error() {
    let fields = offset_pair(50, 0.0);
    assert_relative_eq!(rms_error(&fields), 0.0);
    assert_relative_eq!(l2_error(&fields, 0.01), 0.0);
  }

  #[test]
  fn l2_weights_by_cell_measure() {
    let fields = offset_pair(100, 1.0);
    // 100 samples with unit mismatch and cell measure 1/100 integrate to 1.
    assert_relative_eq!(l2_error(&fields, 0.01), 1.0, epsilon = 1e-14);
  }
}
