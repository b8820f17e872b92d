//! The h-p convergence sweep driver.
//!
//! Single-threaded orchestration over blocking engine calls: the grid is
//! embarrassingly parallel in principle, but the engine owns process-wide
//! solver state, so parallelism belongs to separate worker processes, not
//! to this loop.

use crate::{
  catalog::{Catalog, StabilizationRecipe},
  engine::DiscretizationEngine,
  error::SetupError,
  mesh::{ElementKind, MeshProvider},
  registry::{self, FormulationFamily, Registry},
  report::{Aggregator, SweepReport},
  resolver::{self, ParameterMode},
  Degree, FormulationId, Resolution,
};

use itertools::iproduct;

/// One point of the sweep grid. Created by the driver's iteration, consumed
/// once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepCase {
  pub element_kind: ElementKind,
  pub formulation: FormulationId,
  pub parameter_mode: ParameterMode,
  pub degree: Degree,
  pub resolution: Resolution,
}

impl SweepCase {
  /// Name of the case family this point belongs to. Deterministic and
  /// collision-free across the grid.
  pub fn family_name(&self) -> String {
    format!(
      "{}_{}_{}",
      self.formulation, self.parameter_mode, self.element_kind
    )
  }
}

impl std::fmt::Display for SweepCase {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(
      f,
      "{} k={} n={}",
      self.family_name(),
      self.degree,
      self.resolution
    )
  }
}

/// The grid to sweep. Formulations are given by name and validated against
/// the catalog at startup.
#[derive(Debug, Clone)]
pub struct SweepConfig {
  pub element_kinds: Vec<ElementKind>,
  pub formulations: Vec<String>,
  pub parameter_modes: Vec<ParameterMode>,
  pub min_degree: Degree,
  pub max_degree: Degree,
  /// Strictly increasing, at least two entries.
  pub resolutions: Vec<Resolution>,
}

#[derive(Debug)]
struct FormulationBinding<'a> {
  id: FormulationId,
  family: FormulationFamily,
  recipe: &'a StabilizationRecipe,
}

/// The validated sweep driver.
#[derive(Debug)]
pub struct Sweep<'a> {
  element_kinds: Vec<ElementKind>,
  formulations: Vec<FormulationBinding<'a>>,
  parameter_modes: Vec<ParameterMode>,
  min_degree: Degree,
  max_degree: Degree,
  resolutions: Vec<Resolution>,
}

impl<'a> Sweep<'a> {
  /// Checks catalog/registry consistency and the configuration. Everything
  /// that can fail does so here, before any case runs.
  pub fn new(
    catalog: &'a Catalog,
    registry: &'a Registry,
    config: SweepConfig,
  ) -> Result<Self, SetupError> {
    registry::verify_consistency(catalog, registry)?;

    let invalid = |reason: &str| Err(SetupError::InvalidConfig(reason.to_string()));
    if config.element_kinds.is_empty() {
      return invalid("no element kinds selected");
    }
    if config.formulations.is_empty() {
      return invalid("no formulations selected");
    }
    if config.parameter_modes.is_empty() {
      return invalid("no parameter modes selected");
    }
    if config.min_degree > config.max_degree {
      return invalid("degree range is empty");
    }
    if config.resolutions.len() < 2 {
      return invalid("at least two resolutions are needed to fit a rate");
    }
    if config.resolutions[0] == 0 {
      return invalid("resolutions must be positive");
    }
    if !config.resolutions.windows(2).all(|pair| pair[0] < pair[1]) {
      return invalid("resolutions must be strictly increasing");
    }

    let formulations = config
      .formulations
      .iter()
      .map(|name| {
        let id = catalog.id(name)?;
        let family = registry.family(id)?;
        let recipe = catalog.lookup(id)?;
        Ok(FormulationBinding { id, family, recipe })
      })
      .collect::<Result<Vec<_>, SetupError>>()?;

    Ok(Self {
      element_kinds: config.element_kinds,
      formulations,
      parameter_modes: config.parameter_modes,
      min_degree: config.min_degree,
      max_degree: config.max_degree,
      resolutions: config.resolutions,
    })
  }

  /// Every case family of the grid, in sweep order.
  pub fn family_names(&self) -> Vec<String> {
    iproduct!(
      &self.element_kinds,
      &self.formulations,
      &self.parameter_modes
    )
    .map(|(&element_kind, binding, &parameter_mode)| {
      format!("{}_{}_{}", binding.id, parameter_mode, element_kind)
    })
    .collect()
  }

  /// Runs the full grid: element kind × formulation × parameter mode, then
  /// degrees, then resolutions ascending. A diverged solve is recorded and
  /// skips the remaining resolutions of the current degree only.
  pub fn run<P, E>(&self, provider: &P, engine: &E) -> SweepReport
  where
    P: MeshProvider,
    E: DiscretizationEngine<P::Mesh>,
  {
    let mut aggregator = Aggregator::new();

    for (&element_kind, binding, &parameter_mode) in iproduct!(
      &self.element_kinds,
      &self.formulations,
      &self.parameter_modes
    ) {
      tracing::info!(
        "begin case {}_{}_{}",
        binding.id,
        parameter_mode,
        element_kind
      );

      for degree in self.min_degree..=self.max_degree {
        for &resolution in &self.resolutions {
          let case = SweepCase {
            element_kind,
            formulation: binding.id,
            parameter_mode,
            degree,
            resolution,
          };

          let mesh = provider.build(element_kind, resolution);
          let local_mesh_size = provider.cell_diameter(&mesh);
          let params = resolver::resolve(binding.recipe, parameter_mode, local_mesh_size);

          match engine.solve(binding.family, &mesh, degree, &params) {
            Ok(fields) => {
              let error = engine.error_norm(&mesh, &fields);
              tracing::debug!("{case}: error {error:.3e}");
              aggregator.record(&case, error);
            }
            Err(divergence) => {
              tracing::warn!("{case}: {divergence}");
              aggregator.record_divergence(&case, &divergence);
              break;
            }
          }
        }
      }

      tracing::info!("end case {}_{}_{}", binding.id, parameter_mode, element_kind);
    }

    aggregator.finalize()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  use itertools::Itertools;

  fn full_grid_config() -> SweepConfig {
    SweepConfig {
      element_kinds: ElementKind::ALL.to_vec(),
      formulations: Catalog::builtin().ids().map(String::from).collect(),
      parameter_modes: ParameterMode::ALL.to_vec(),
      min_degree: 1,
      max_degree: 4,
      resolutions: vec![5, 10, 15, 20, 25, 30],
    }
  }

  #[test]
  fn family_names_are_collision_free() {
    let sweep = Sweep::new(Catalog::builtin(), Registry::builtin(), full_grid_config()).unwrap();
    let names = sweep.family_names();
    assert_eq!(names.len(), 2 * 21 * 2);
    assert!(names.iter().all_unique());
  }

  #[test]
  fn same_tuple_same_name() {
    let case = SweepCase {
      element_kind: ElementKind::Quadrilateral,
      formulation: "sdhm_div",
      parameter_mode: ParameterMode::MeshDependent,
      degree: 2,
      resolution: 15,
    };
    assert_eq!(case.family_name(), "sdhm_div_meshpar_quad");
    assert_eq!(case.family_name(), case.family_name());
  }

  #[test]
  fn unknown_formulation_aborts_startup() {
    let mut config = full_grid_config();
    config.formulations.push("cgls_extra".to_string());
    let err = Sweep::new(Catalog::builtin(), Registry::builtin(), config).unwrap_err();
    assert_eq!(err, SetupError::UnknownFormulation("cgls_extra".to_string()));
  }

  #[test]
  fn inconsistent_registry_aborts_startup() {
    let registry = Registry::from_entries(
      Registry::builtin()
        .entries()
        .filter(|&(id, _)| id != "dmvh"),
    );
    let err = Sweep::new(Catalog::builtin(), &registry, full_grid_config()).unwrap_err();
    assert!(matches!(err, SetupError::CatalogInconsistency { .. }));
  }

  #[test]
  fn degenerate_configs_are_rejected() {
    let rejects = |mutate: fn(&mut SweepConfig)| {
      let mut config = full_grid_config();
      mutate(&mut config);
      let err = Sweep::new(Catalog::builtin(), Registry::builtin(), config).unwrap_err();
      assert!(matches!(err, SetupError::InvalidConfig(_)), "{err:?}");
    };

    rejects(|c| c.element_kinds.clear());
    rejects(|c| c.formulations.clear());
    rejects(|c| c.parameter_modes.clear());
    rejects(|c| {
      c.min_degree = 3;
      c.max_degree = 2;
    });
    rejects(|c| c.resolutions = vec![10]);
    rejects(|c| c.resolutions = vec![0, 10]);
    rejects(|c| c.resolutions = vec![10, 10, 20]);
    rejects(|c| c.resolutions = vec![20, 10]);
  }
}
