//! Aggregation of sweep results into convergence reports, and the writer
//! seam for persisting them.

use crate::{
  convergence::{self, ErrorSample, Rate},
  error::{Divergence, InsufficientData},
  mesh::ElementKind,
  resolver::ParameterMode,
  sweep::SweepCase,
  Degree, FormulationId, Resolution,
};

use indexmap::IndexMap;

use std::{
  fs::File,
  io::{self, BufWriter, Write},
  path::PathBuf,
};

/// A solve failure recorded against its case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceRecord {
  pub resolution: Resolution,
  pub reason: String,
}

/// Errors and fitted rates of one polynomial degree within a case.
#[derive(Debug, Clone)]
pub struct DegreeReport {
  pub degree: Degree,
  /// Ascending by resolution; ends early when a solve diverged.
  pub samples: Vec<ErrorSample>,
  /// One rate per consecutive sample pair.
  pub rates: Result<Vec<Rate>, InsufficientData>,
  pub divergence: Option<DivergenceRecord>,
}

impl DegreeReport {
  pub fn has_data(&self) -> bool {
    !self.samples.is_empty()
  }
}

/// Full convergence table of one case family
/// (formulation, parameter mode, element kind).
#[derive(Debug, Clone)]
pub struct CaseReport {
  pub name: String,
  pub formulation: FormulationId,
  pub element_kind: ElementKind,
  pub parameter_mode: ParameterMode,
  pub degrees: Vec<DegreeReport>,
}

/// All case reports of one sweep, in sweep order.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
  cases: IndexMap<String, CaseReport>,
}

impl SweepReport {
  pub fn get(&self, name: &str) -> Option<&CaseReport> {
    self.cases.get(name)
  }
  pub fn iter(&self) -> impl Iterator<Item = &CaseReport> {
    self.cases.values()
  }
  pub fn len(&self) -> usize {
    self.cases.len()
  }
  pub fn is_empty(&self) -> bool {
    self.cases.is_empty()
  }
}

/// Collects error samples while the sweep runs. Rates are fitted only in
/// [`Aggregator::finalize`], from the complete immutable sequences.
#[derive(Debug, Default)]
pub struct Aggregator {
  cases: IndexMap<String, CaseAccumulator>,
}

#[derive(Debug)]
struct CaseAccumulator {
  formulation: FormulationId,
  element_kind: ElementKind,
  parameter_mode: ParameterMode,
  degrees: IndexMap<Degree, DegreeAccumulator>,
}

#[derive(Debug, Default)]
struct DegreeAccumulator {
  samples: Vec<ErrorSample>,
  divergence: Option<DivergenceRecord>,
}

impl Aggregator {
  pub fn new() -> Self {
    Self::default()
  }

  fn degree_mut(&mut self, case: &SweepCase) -> &mut DegreeAccumulator {
    let case_acc = self
      .cases
      .entry(case.family_name())
      .or_insert_with(|| CaseAccumulator {
        formulation: case.formulation,
        element_kind: case.element_kind,
        parameter_mode: case.parameter_mode,
        degrees: IndexMap::new(),
      });
    case_acc.degrees.entry(case.degree).or_default()
  }

  pub fn record(&mut self, case: &SweepCase, error: f64) {
    let resolution = case.resolution;
    let degree_acc = self.degree_mut(case);
    if let Some(last) = degree_acc.samples.last() {
      assert!(last.resolution < resolution);
    }
    degree_acc.samples.push(ErrorSample::new(resolution, error));
  }

  pub fn record_divergence(&mut self, case: &SweepCase, divergence: &Divergence) {
    let record = DivergenceRecord {
      resolution: case.resolution,
      reason: divergence.reason.clone(),
    };
    self.degree_mut(case).divergence = Some(record);
  }

  pub fn finalize(self) -> SweepReport {
    let cases = self
      .cases
      .into_iter()
      .map(|(name, case_acc)| {
        let degrees = case_acc
          .degrees
          .into_iter()
          .map(|(degree, degree_acc)| DegreeReport {
            degree,
            rates: convergence::observed_rates(&degree_acc.samples),
            samples: degree_acc.samples,
            divergence: degree_acc.divergence,
          })
          .collect();
        let case = CaseReport {
          name: name.clone(),
          formulation: case_acc.formulation,
          element_kind: case_acc.element_kind,
          parameter_mode: case_acc.parameter_mode,
          degrees,
        };
        (name, case)
      })
      .collect();
    SweepReport { cases }
  }
}

/// External sink for finished case reports.
pub trait ReportWriter {
  fn write_case(&mut self, case: &CaseReport) -> io::Result<()>;

  fn write_report(&mut self, report: &SweepReport) -> io::Result<()> {
    for case in report.iter() {
      self.write_case(case)?;
    }
    Ok(())
  }
}

fn rate_cell(degree: &DegreeReport, isample: usize) -> String {
  if isample == 0 {
    return "--".to_string();
  }
  match degree.rates {
    Ok(ref rates) => match rates[isample - 1] {
      Rate::Estimate(rate) => format!("{rate:.2}"),
      Rate::Undefined => "undef".to_string(),
    },
    Err(_) => "--".to_string(),
  }
}

/// Writes one `<case>_errors.csv` per case family into a directory.
pub struct CsvWriter {
  dir: PathBuf,
}

impl CsvWriter {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    let dir = dir.into();
    Self { dir }
  }

  pub fn case_path(&self, case: &CaseReport) -> PathBuf {
    self.dir.join(format!("{}_errors.csv", case.name))
  }
}

impl ReportWriter for CsvWriter {
  fn write_case(&mut self, case: &CaseReport) -> io::Result<()> {
    std::fs::create_dir_all(&self.dir)?;
    let path = self.case_path(case);
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "degree,resolution,error,rate")?;
    for degree in &case.degrees {
      for (isample, sample) in degree.samples.iter().enumerate() {
        writeln!(
          writer,
          "{},{},{:.16e},{}",
          degree.degree,
          sample.resolution,
          sample.error,
          rate_cell(degree, isample)
        )?;
      }
      if let Some(ref divergence) = degree.divergence {
        writeln!(
          writer,
          "{},{},diverged,--",
          degree.degree, divergence.resolution
        )?;
      }
    }
    writer.flush()?;

    tracing::info!("wrote {}", path.display());
    Ok(())
  }
}

/// Renders aligned convergence tables, one per case.
pub struct TableWriter<W> {
  out: W,
}

impl TableWriter<io::Stdout> {
  pub fn stdout() -> Self {
    Self::new(io::stdout())
  }
}

impl<W: io::Write> TableWriter<W> {
  pub fn new(out: W) -> Self {
    Self { out }
  }
  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: io::Write> ReportWriter for TableWriter<W> {
  fn write_case(&mut self, case: &CaseReport) -> io::Result<()> {
    let separator = "-".repeat(42);

    writeln!(self.out)?;
    writeln!(self.out, "case {}", case.name)?;
    writeln!(self.out, "{separator}")?;
    writeln!(
      self.out,
      "| {:>6} | {:>4} | {:>10} | {:>7} |",
      "degree", "n", "error", "rate"
    )?;
    writeln!(self.out, "{separator}")?;

    for degree in &case.degrees {
      if !degree.has_data() {
        writeln!(self.out, "| {:>6} | {:>27} |", degree.degree, "no data")?;
      }
      for (isample, sample) in degree.samples.iter().enumerate() {
        writeln!(
          self.out,
          "| {:>6} | {:>4} | {:>10.3e} | {:>7} |",
          degree.degree,
          sample.resolution,
          sample.error,
          rate_cell(degree, isample)
        )?;
      }
      if let Some(ref divergence) = degree.divergence {
        writeln!(
          self.out,
          "  degree {}: diverged at n={} ({})",
          degree.degree, divergence.resolution, divergence.reason
        )?;
      }
      if let Err(insufficient) = degree.rates {
        if degree.has_data() {
          writeln!(self.out, "  degree {}: {insufficient}", degree.degree)?;
        }
      }
    }
    writeln!(self.out, "{separator}")?;
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;

  fn case(degree: Degree, resolution: Resolution) -> SweepCase {
    SweepCase {
      element_kind: ElementKind::Triangle,
      formulation: "cgls_full",
      parameter_mode: ParameterMode::Constant,
      degree,
      resolution,
    }
  }

  #[test]
  fn rates_are_fitted_at_finalize() {
    let mut aggregator = Aggregator::new();
    aggregator.record(&case(1, 10), 4e-2);
    aggregator.record(&case(1, 20), 1e-2);
    aggregator.record(&case(1, 40), 2.5e-3);

    let report = aggregator.finalize();
    assert_eq!(report.len(), 1);

    let case_report = report.get("cgls_full_constpar_tri").unwrap();
    let degree = &case_report.degrees[0];
    assert_eq!(degree.samples.len(), 3);
    let rates = degree.rates.as_ref().unwrap();
    assert_eq!(rates.len(), 2);
    for rate in rates {
      assert_relative_eq!(rate.estimate().unwrap(), 2.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn single_sample_reports_insufficient_data() {
    let mut aggregator = Aggregator::new();
    aggregator.record(&case(2, 10), 1e-3);
    let report = aggregator.finalize();
    let degree = &report.iter().next().unwrap().degrees[0];
    assert_eq!(degree.rates, Err(InsufficientData(1)));
    assert!(degree.has_data());
  }

  #[test]
  fn divergence_before_any_sample_leaves_no_data() {
    let mut aggregator = Aggregator::new();
    aggregator.record_divergence(&case(3, 10), &Divergence::new("singular matrix"));
    let report = aggregator.finalize();
    let degree = &report.iter().next().unwrap().degrees[0];
    assert!(!degree.has_data());
    assert_eq!(degree.rates, Err(InsufficientData(0)));
    let divergence = degree.divergence.as_ref().unwrap();
    assert_eq!(divergence.resolution, 10);
  }

  #[test]
  fn degrees_accumulate_separately() {
    let mut aggregator = Aggregator::new();
    aggregator.record(&case(1, 10), 1e-2);
    aggregator.record(&case(2, 10), 1e-3);
    aggregator.record(&case(1, 20), 2.5e-3);
    aggregator.record(&case(2, 20), 1.25e-4);

    let report = aggregator.finalize();
    let case_report = report.iter().next().unwrap();
    assert_eq!(case_report.degrees.len(), 2);
    for degree in &case_report.degrees {
      assert_eq!(degree.samples.len(), 2);
      assert!(degree.rates.is_ok());
    }
  }

  #[test]
  fn table_distinguishes_rate_kinds() {
    let mut aggregator = Aggregator::new();
    aggregator.record(&case(1, 10), 1e-2);
    aggregator.record(&case(1, 20), 2.5e-3);
    aggregator.record(&case(1, 40), 0.0);
    aggregator.record(&case(2, 10), 5e-3);
    let report = aggregator.finalize();

    let mut writer = TableWriter::new(Vec::new());
    writer.write_report(&report).unwrap();
    let rendered = String::from_utf8(writer.into_inner()).unwrap();

    assert!(rendered.contains("2.00"));
    assert!(rendered.contains("undef"));
    assert!(rendered.contains(InsufficientData(1).to_string().as_str()));
  }

  #[test]
  fn csv_files_per_case() {
    let dir = std::env::temp_dir().join(format!("darcy_sweep_csv_{}", std::process::id()));

    let mut aggregator = Aggregator::new();
    aggregator.record(&case(1, 10), 4e-2);
    aggregator.record(&case(1, 20), 1e-2);
    let report = aggregator.finalize();

    let mut writer = CsvWriter::new(&dir);
    writer.write_report(&report).unwrap();

    let path = dir.join("cgls_full_constpar_tri_errors.csv");
    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("degree,resolution,error,rate"));
    assert!(lines.next().unwrap().starts_with("1,10,"));
    assert!(lines.next().unwrap().ends_with(",2.00"));

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
