//! Error taxonomy of the sweep.
//!
//! Setup errors abort the whole run before any case executes. A
//! [`Divergence`] or [`InsufficientData`] is recorded against its case in
//! the report and never aborts the sweep.

use thiserror::Error;

/// Startup-class failures. No partial catalog or configuration is usable,
/// so these abort the run immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
  #[error("unknown formulation `{0}`")]
  UnknownFormulation(String),
  #[error("catalog/registry mismatch: without recipe {without_recipe:?}, without family {without_family:?}")]
  CatalogInconsistency {
    /// Ids registered with a family but no recipe.
    without_recipe: Vec<String>,
    /// Ids registered with a recipe but no family.
    without_family: Vec<String>,
  },
  #[error("invalid sweep configuration: {0}")]
  InvalidConfig(String),
}

/// Engine-reported non-convergence or singular solve. A data point, not a
/// transient condition: recorded against the case, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("solve diverged: {reason}")]
pub struct Divergence {
  pub reason: String,
}

impl Divergence {
  pub fn new(reason: impl Into<String>) -> Self {
    let reason = reason.into();
    Self { reason }
  }
}

/// Fewer than two error samples: no consecutive pair to fit a rate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate fit needs at least two resolutions, got {0}")]
pub struct InsufficientData(pub usize);
