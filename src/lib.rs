extern crate nalgebra as na;

pub mod catalog;
pub mod convergence;
pub mod engine;
pub mod error;
pub mod manufactured;
pub mod mesh;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod sweep;

/// Polynomial degree of the approximation spaces.
pub type Degree = usize;
/// Subdivisions per axis of a structured mesh.
pub type Resolution = usize;
/// Name of one discretization variant, as keyed in catalog and registry.
pub type FormulationId = &'static str;
