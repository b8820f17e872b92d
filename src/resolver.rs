//! Per-case resolution of stabilization coefficients.
//!
//! Base values are shared by every sweep case of a formulation, so scaling
//! them in place would compound across cases. [`resolve`] therefore always
//! derives a fresh value set from the untouched recipe.

use crate::catalog::{CoefficientSlot, StabilizationRecipe};

use indexmap::IndexMap;

/// Whether stabilization weights follow the local mesh size or stay fixed
/// across refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterMode {
  MeshDependent,
  Constant,
}

impl ParameterMode {
  pub const ALL: [ParameterMode; 2] = [Self::MeshDependent, Self::Constant];

  pub fn label(self) -> &'static str {
    match self {
      Self::MeshDependent => "meshpar",
      Self::Constant => "constpar",
    }
  }
}

impl std::fmt::Display for ParameterMode {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Case-local coefficient values, the flat mapping handed to the
/// discretization engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
  values: IndexMap<CoefficientSlot, f64>,
  mode: ParameterMode,
}

impl ResolvedParameters {
  pub fn get(&self, slot: CoefficientSlot) -> Option<f64> {
    self.values.get(&slot).copied()
  }
  pub fn mode(&self) -> ParameterMode {
    self.mode
  }
  pub fn iter(&self) -> impl Iterator<Item = (CoefficientSlot, f64)> + '_ {
    self.values.iter().map(|(&slot, &value)| (slot, value))
  }
  pub fn len(&self) -> usize {
    self.values.len()
  }
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Derives the coefficient values for one sweep case.
///
/// In mesh-dependent mode every slot marked mesh-dependent is scaled by the
/// square of the local mesh size; all other slots keep their base value.
pub fn resolve(
  recipe: &StabilizationRecipe,
  mode: ParameterMode,
  local_mesh_size: f64,
) -> ResolvedParameters {
  let h2 = local_mesh_size * local_mesh_size;
  let values = recipe
    .iter()
    .map(|(slot, coeff)| {
      let value = if coeff.mesh_dependent && mode == ParameterMode::MeshDependent {
        coeff.base * h2
      } else {
        coeff.base
      };
      (slot, value)
    })
    .collect();
  ResolvedParameters { values, mode }
}
