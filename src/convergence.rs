//! Error sequences and empirical convergence rates.

use crate::{error::InsufficientData, Resolution};

/// Discretization error measured at one mesh resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSample {
  pub resolution: Resolution,
  pub error: f64,
}

impl ErrorSample {
  pub fn new(resolution: Resolution, error: f64) -> Self {
    Self { resolution, error }
  }
}

/// Empirical order between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
  Estimate(f64),
  /// The log-ratio is not finite, e.g. an exactly zero error. Reported as
  /// such, never coerced to zero or infinity.
  Undefined,
}

impl Rate {
  pub fn estimate(self) -> Option<f64> {
    match self {
      Self::Estimate(rate) => Some(rate),
      Self::Undefined => None,
    }
  }
}

/// Log-ratio rate between a coarse and a fine sample.
///
/// With mesh spacing `h ∝ 1/n` this is
/// `ln(e_coarse/e_fine) / ln(h_coarse/h_fine) = ln(e_coarse/e_fine) / ln(n_fine/n_coarse)`.
pub fn rate_between(coarse: ErrorSample, fine: ErrorSample) -> Rate {
  assert!(coarse.resolution < fine.resolution);
  let error_ratio = coarse.error / fine.error;
  let spacing_ratio = fine.resolution as f64 / coarse.resolution as f64;
  let rate = error_ratio.ln() / spacing_ratio.ln();
  if rate.is_finite() {
    Rate::Estimate(rate)
  } else {
    Rate::Undefined
  }
}

/// Rates of every consecutive pair of an ascending error sequence. Reported
/// pairwise, so pre-asymptotic stretches stay visible instead of being
/// averaged away.
pub fn observed_rates(samples: &[ErrorSample]) -> Result<Vec<Rate>, InsufficientData> {
  if samples.len() < 2 {
    return Err(InsufficientData(samples.len()));
  }
  Ok(
    samples
      .windows(2)
      .map(|pair| rate_between(pair[0], pair[1]))
      .collect(),
  )
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;

  fn samples(points: &[(Resolution, f64)]) -> Vec<ErrorSample> {
    points
      .iter()
      .map(|&(resolution, error)| ErrorSample::new(resolution, error))
      .collect()
  }

  fn estimates(rates: &[Rate]) -> Vec<f64> {
    rates.iter().map(|rate| rate.estimate().unwrap()).collect()
  }

  #[test]
  fn exact_quadratic_convergence() {
    let rates = observed_rates(&samples(&[(1, 1.0), (2, 0.25), (4, 0.0625)])).unwrap();
    for rate in estimates(&rates) {
      assert_relative_eq!(rate, 2.0, epsilon = 1e-12);
    }
  }

  /// Relabeling resolutions while preserving their ratios leaves the rates
  /// unchanged.
  #[test]
  fn rates_depend_only_on_resolution_ratios() {
    let a = observed_rates(&samples(&[(1, 1.0), (2, 0.25), (4, 0.0625)])).unwrap();
    let b = observed_rates(&samples(&[(10, 1.0), (20, 0.25), (40, 0.0625)])).unwrap();
    for (ra, rb) in estimates(&a).into_iter().zip(estimates(&b)) {
      assert_relative_eq!(ra, rb, epsilon = 1e-12);
    }
  }

  #[test]
  fn nonuniform_refinement_steps() {
    // e = h^3 on n = 5, 10, 15: the rate is exact regardless of step ratio.
    let errors: Vec<_> = [5usize, 10, 15]
      .iter()
      .map(|&n| (n, (1.0 / n as f64).powi(3)))
      .collect();
    let rates = observed_rates(&samples(&errors)).unwrap();
    for rate in estimates(&rates) {
      assert_relative_eq!(rate, 3.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn too_few_samples() {
    assert_eq!(observed_rates(&[]), Err(InsufficientData(0)));
    assert_eq!(
      observed_rates(&samples(&[(10, 1e-2)])),
      Err(InsufficientData(1))
    );
    assert!(observed_rates(&samples(&[(10, 1e-2), (20, 5e-3)])).is_ok());
  }

  #[test]
  fn zero_error_gives_undefined_rate() {
    let rates = observed_rates(&samples(&[(1, 1.0), (2, 0.0), (4, 0.0)])).unwrap();
    assert_eq!(rates, vec![Rate::Undefined, Rate::Undefined]);
  }

  #[test]
  fn undefined_does_not_poison_neighbours() {
    let rates = observed_rates(&samples(&[(1, 1.0), (2, 0.25), (4, 0.0)])).unwrap();
    assert_relative_eq!(rates[0].estimate().unwrap(), 2.0, epsilon = 1e-12);
    assert_eq!(rates[1], Rate::Undefined);
  }
}
