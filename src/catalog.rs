//! Catalog of stabilization recipes, one per formulation variant.
//!
//! A recipe fixes which coefficient slots a formulation consumes and their
//! base values. Base values are immutable once the catalog is built; the
//! resolver derives per-case values from them without ever writing back.

use crate::{error::SetupError, FormulationId};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Interior penalty weights of the discontinuous variants.
pub const ETA_U: f64 = 10.0;
pub const ETA_P: f64 = 100.0 * ETA_U;
/// Trace penalty weight of the hybridized variants.
pub const BETA_0: f64 = 1.0e-15;

/// Coefficient slots a recipe may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoefficientSlot {
  Delta0,
  Delta1,
  Delta2,
  Delta3,
  /// Velocity jump penalty.
  EtaU,
  /// Pressure jump penalty.
  EtaP,
  /// Trace penalty driving the static condensation.
  Beta0,
}

impl CoefficientSlot {
  pub fn name(self) -> &'static str {
    match self {
      Self::Delta0 => "delta_0",
      Self::Delta1 => "delta_1",
      Self::Delta2 => "delta_2",
      Self::Delta3 => "delta_3",
      Self::EtaU => "eta_u",
      Self::EtaP => "eta_p",
      Self::Beta0 => "beta_0",
    }
  }
}

impl std::fmt::Display for CoefficientSlot {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// One stabilization weight: base value and whether it picks up the squared
/// local mesh size in mesh-dependent parameter mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient {
  pub base: f64,
  pub mesh_dependent: bool,
}

impl Coefficient {
  pub fn constant(base: f64) -> Self {
    Self {
      base,
      mesh_dependent: false,
    }
  }
  pub fn mesh_scaled(base: f64) -> Self {
    Self {
      base,
      mesh_dependent: true,
    }
  }
}

/// The set of coefficient slots one formulation consumes, with base values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StabilizationRecipe {
  slots: IndexMap<CoefficientSlot, Coefficient>,
}

// constructors
impl StabilizationRecipe {
  /// Least-squares weights common to all variants. `delta_2` and `delta_3`
  /// are the slots that scale with `h^2` in mesh-dependent mode.
  pub fn deltas(delta_0: f64, delta_1: f64, delta_2: f64, delta_3: f64) -> Self {
    let mut slots = IndexMap::new();
    slots.insert(CoefficientSlot::Delta0, Coefficient::constant(delta_0));
    slots.insert(CoefficientSlot::Delta1, Coefficient::constant(delta_1));
    slots.insert(CoefficientSlot::Delta2, Coefficient::mesh_scaled(delta_2));
    slots.insert(CoefficientSlot::Delta3, Coefficient::mesh_scaled(delta_3));
    Self { slots }
  }
  /// Adds the edge penalties of the discontinuous variants.
  pub fn with_penalties(mut self, eta_u: f64, eta_p: f64) -> Self {
    self
      .slots
      .insert(CoefficientSlot::EtaU, Coefficient::constant(eta_u));
    self
      .slots
      .insert(CoefficientSlot::EtaP, Coefficient::constant(eta_p));
    self
  }
  /// Adds the trace penalty of the hybridized variants.
  pub fn with_condensation(mut self, beta_0: f64) -> Self {
    self
      .slots
      .insert(CoefficientSlot::Beta0, Coefficient::constant(beta_0));
    self
  }
}

// accessors
impl StabilizationRecipe {
  pub fn get(&self, slot: CoefficientSlot) -> Option<Coefficient> {
    self.slots.get(&slot).copied()
  }
  pub fn contains(&self, slot: CoefficientSlot) -> bool {
    self.slots.contains_key(&slot)
  }
  pub fn iter(&self) -> impl Iterator<Item = (CoefficientSlot, Coefficient)> + '_ {
    self.slots.iter().map(|(&slot, &coeff)| (slot, coeff))
  }
  pub fn len(&self) -> usize {
    self.slots.len()
  }
  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }
}

/// Read-only mapping from formulation id to its recipe.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  recipes: IndexMap<FormulationId, StabilizationRecipe>,
}

impl Catalog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_entries(
    entries: impl IntoIterator<Item = (FormulationId, StabilizationRecipe)>,
  ) -> Self {
    let recipes = entries.into_iter().collect();
    Self { recipes }
  }

  pub fn insert(&mut self, id: FormulationId, recipe: StabilizationRecipe) {
    self.recipes.insert(id, recipe);
  }

  pub fn lookup(&self, name: &str) -> Result<&StabilizationRecipe, SetupError> {
    self
      .recipes
      .get(name)
      .ok_or_else(|| SetupError::UnknownFormulation(name.to_string()))
  }

  /// Resolves an externally supplied name to the catalog's own key.
  pub fn id(&self, name: &str) -> Result<FormulationId, SetupError> {
    self
      .recipes
      .get_key_value(name)
      .map(|(&id, _)| id)
      .ok_or_else(|| SetupError::UnknownFormulation(name.to_string()))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.recipes.contains_key(name)
  }
  pub fn ids(&self) -> impl Iterator<Item = FormulationId> + '_ {
    self.recipes.keys().copied()
  }
  pub fn entries(&self) -> impl Iterator<Item = (FormulationId, &StabilizationRecipe)> + '_ {
    self.recipes.iter().map(|(&id, recipe)| (id, recipe))
  }
  pub fn len(&self) -> usize {
    self.recipes.len()
  }
  pub fn is_empty(&self) -> bool {
    self.recipes.is_empty()
  }

  /// The catalog of the convergence study: seven continuous Galerkin
  /// least-squares variants, their discontinuous counterparts and their
  /// hybridized counterparts.
  pub fn builtin() -> &'static Catalog {
    &BUILTIN
  }
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
  let deltas = StabilizationRecipe::deltas;
  let dg = |recipe: StabilizationRecipe| recipe.with_penalties(ETA_U, ETA_P);
  let hybrid = |recipe: StabilizationRecipe| recipe.with_condensation(BETA_0);

  let mut catalog = Catalog::new();

  catalog.insert("cgls_full", deltas(1.0, -0.5, 0.5, 0.5));
  catalog.insert("cgls_div", deltas(1.0, -0.5, 0.5, 0.0));
  catalog.insert("mgls_full", deltas(1.0, 0.5, 0.5, 0.5));
  catalog.insert("mgls", deltas(1.0, 0.5, 0.5, 0.0));
  catalog.insert("mvh_full", deltas(-1.0, 0.5, 0.5, 0.5));
  catalog.insert("mvh_div", deltas(-1.0, 0.5, 0.5, 0.0));
  catalog.insert("mvh", deltas(-1.0, 0.5, 0.0, 0.0));

  catalog.insert("dgls_full", dg(deltas(1.0, -0.5, 0.5, 0.5)));
  catalog.insert("dgls_div", dg(deltas(1.0, -0.5, 0.5, 0.0)));
  catalog.insert("dmgls_full", dg(deltas(1.0, 0.5, 0.5, 0.5)));
  catalog.insert("dmgls", dg(deltas(1.0, 0.5, 0.5, 0.0)));
  catalog.insert("dmvh_full", dg(deltas(-1.0, 0.5, 0.5, 0.5)));
  catalog.insert("dmvh_div", dg(deltas(-1.0, 0.5, 0.5, 0.0)));
  catalog.insert("dmvh", dg(deltas(-1.0, 0.5, 0.0, 0.0)));

  catalog.insert("sdhm_full", hybrid(deltas(1.0, -0.5, 0.5, 0.5)));
  catalog.insert("sdhm_div", hybrid(deltas(1.0, -0.5, 0.5, 0.0)));
  catalog.insert("hmgls_full", hybrid(deltas(1.0, 0.5, 0.5, 0.5)));
  catalog.insert("hmgls", hybrid(deltas(1.0, 0.5, 0.5, 0.0)));
  catalog.insert("hmvh_full", hybrid(deltas(-1.0, 0.5, 0.5, 0.5)));
  catalog.insert("hmvh_div", hybrid(deltas(-1.0, 0.5, 0.5, 0.0)));
  catalog.insert("hmvh", hybrid(deltas(-1.0, 0.5, 0.0, 0.0)));

  catalog
});

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn builtin_catalog_shape() {
    let catalog = Catalog::builtin();
    assert_eq!(catalog.len(), 21);

    // Continuous variants carry only the four deltas.
    let cgls = catalog.lookup("cgls_full").unwrap();
    assert_eq!(cgls.len(), 4);
    assert!(!cgls.contains(CoefficientSlot::EtaU));
    assert!(!cgls.contains(CoefficientSlot::Beta0));

    // Discontinuous variants add both penalties.
    let dgls = catalog.lookup("dgls_full").unwrap();
    assert_eq!(dgls.len(), 6);
    assert_eq!(dgls.get(CoefficientSlot::EtaU).unwrap().base, ETA_U);
    assert_eq!(dgls.get(CoefficientSlot::EtaP).unwrap().base, ETA_P);

    // Hybridized variants add the trace penalty.
    let sdhm = catalog.lookup("sdhm_full").unwrap();
    assert_eq!(sdhm.len(), 5);
    assert_eq!(sdhm.get(CoefficientSlot::Beta0).unwrap().base, BETA_0);
  }

  #[test]
  fn mesh_dependence_marks_only_higher_deltas() {
    for (_, recipe) in Catalog::builtin().entries() {
      for (slot, coeff) in recipe.iter() {
        let expected = matches!(slot, CoefficientSlot::Delta2 | CoefficientSlot::Delta3);
        assert_eq!(coeff.mesh_dependent, expected, "slot {slot}");
      }
    }
  }

  #[test]
  fn lookup_unknown_fails() {
    let err = Catalog::builtin().lookup("cgls_bogus").unwrap_err();
    assert_eq!(
      err,
      SetupError::UnknownFormulation("cgls_bogus".to_string())
    );
  }

  #[test]
  fn lookup_resolves_interned_id() {
    let name = String::from("mvh_div");
    let id = Catalog::builtin().id(&name).unwrap();
    assert_eq!(id, "mvh_div");
  }
}
