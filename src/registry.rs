//! Formulation registry: which engine entry point serves which variant.

use crate::{catalog::Catalog, error::SetupError, FormulationId};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// The engine entry points. Several formulations share one family and
/// differ only in the recipe applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulationFamily {
  /// Continuous Galerkin least-squares mixed forms.
  ContinuousGalerkinLs,
  /// Discontinuous Galerkin least-squares forms with edge penalties.
  DiscontinuousGalerkinLs,
  /// Hybridized mixed forms solved through static condensation.
  StabilizedHybrid,
}

impl FormulationFamily {
  pub fn name(self) -> &'static str {
    match self {
      Self::ContinuousGalerkinLs => "cgls",
      Self::DiscontinuousGalerkinLs => "dgls",
      Self::StabilizedHybrid => "sdhm",
    }
  }
}

impl std::fmt::Display for FormulationFamily {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Mapping from formulation id to its engine family.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  families: IndexMap<FormulationId, FormulationFamily>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_entries(
    entries: impl IntoIterator<Item = (FormulationId, FormulationFamily)>,
  ) -> Self {
    let families = entries.into_iter().collect();
    Self { families }
  }

  pub fn insert(&mut self, id: FormulationId, family: FormulationFamily) {
    self.families.insert(id, family);
  }

  pub fn family(&self, name: &str) -> Result<FormulationFamily, SetupError> {
    self
      .families
      .get(name)
      .copied()
      .ok_or_else(|| SetupError::UnknownFormulation(name.to_string()))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.families.contains_key(name)
  }
  pub fn ids(&self) -> impl Iterator<Item = FormulationId> + '_ {
    self.families.keys().copied()
  }
  pub fn entries(&self) -> impl Iterator<Item = (FormulationId, FormulationFamily)> + '_ {
    self.families.iter().map(|(&id, &family)| (id, family))
  }
  pub fn len(&self) -> usize {
    self.families.len()
  }
  pub fn is_empty(&self) -> bool {
    self.families.is_empty()
  }

  /// Family bindings of the convergence study, matching
  /// [`Catalog::builtin`] key for key.
  pub fn builtin() -> &'static Registry {
    &BUILTIN
  }
}

static BUILTIN: Lazy<Registry> = Lazy::new(|| {
  use FormulationFamily::*;

  let mut registry = Registry::new();

  for id in ["cgls_full", "cgls_div", "mgls_full", "mgls", "mvh_full", "mvh_div", "mvh"] {
    registry.insert(id, ContinuousGalerkinLs);
  }
  for id in ["dgls_full", "dgls_div", "dmgls_full", "dmgls", "dmvh_full", "dmvh_div", "dmvh"] {
    registry.insert(id, DiscontinuousGalerkinLs);
  }
  for id in ["sdhm_full", "sdhm_div", "hmgls_full", "hmgls", "hmvh_full", "hmvh_div", "hmvh"] {
    registry.insert(id, StabilizedHybrid);
  }

  registry
});

/// Catalog and registry must key exactly the same formulation set. A
/// mismatch would otherwise surface as a missing-key failure mid-sweep.
pub fn verify_consistency(catalog: &Catalog, registry: &Registry) -> Result<(), SetupError> {
  let without_recipe: Vec<String> = registry
    .ids()
    .filter(|id| !catalog.contains(id))
    .map(str::to_string)
    .collect();
  let without_family: Vec<String> = catalog
    .ids()
    .filter(|id| !registry.contains(id))
    .map(str::to_string)
    .collect();

  if without_recipe.is_empty() && without_family.is_empty() {
    Ok(())
  } else {
    Err(SetupError::CatalogInconsistency {
      without_recipe,
      without_family,
    })
  }
}
