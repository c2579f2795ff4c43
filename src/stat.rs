use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;
use std::time::Duration;

const CSV_HEADER: &str = "N,COUNT,MEAN,MEDIAN,STDDEV,MIN,MAX";

/// Summary of elapsed-time samples in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
  pub count: usize,
  pub mean: f64,
  pub median: f64,
  pub std_dev: f64,
  pub min: f64,
  pub max: f64,
}

impl Stat {
  /// `None` for an empty sample set.
  pub fn of(samples: &[f64]) -> Option<Stat> {
    let first = *samples.first()?;

    // Welford's running mean and variance, tracking the range on the way
    let (mut mean, mut m2, mut min, mut max) = (0.0, 0.0, first, first);
    for (i, &x) in samples.iter().enumerate() {
      let delta = x - mean;
      mean += delta / (i + 1) as f64;
      m2 += delta * (x - mean);
      min = min.min(x);
      max = max.max(x);
    }

    let count = samples.len();
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = count / 2;
    let median = if count % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] };
    Some(Stat { count, mean, median, std_dev: (m2 / count as f64).sqrt(), min, max })
  }

  fn write_csv_row<W: Write, X: Display>(&self, w: &mut W, x: X) -> Result<()> {
    let Stat { count, mean, median, std_dev, min, max } = self;
    writeln!(w, "\"{x}\",{count},{mean:.3},{median:.3},{std_dev:.3},{min:.3},{max:.3}")
  }
}

impl Display for Stat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    // spread as ±2σ relative to the mean
    let spread = if self.mean > 0.0 { 200.0 * self.std_dev / self.mean } else { 0.0 };
    write!(f, "{}: {:.3}ms ±{spread:.1}% [{:.3}|{:.3}|{:.3}]", self.count, self.mean, self.min, self.median, self.max)
  }
}

/// Elapsed times grouped by the measured leaf count, kept in ascending order.
pub struct Report<X: Display + Copy + Ord> {
  samples: BTreeMap<X, Vec<f64>>,
}

impl<X: Display + Copy + Ord> Report<X> {
  pub fn new() -> Self {
    Report { samples: BTreeMap::new() }
  }

  pub fn add(&mut self, x: X, elapsed: Duration) {
    self.samples.entry(x).or_default().push(elapsed.as_micros() as f64 / 1000.0);
  }

  pub fn stat(&self, x: X) -> Option<Stat> {
    self.samples.get(&x).and_then(|samples| Stat::of(samples))
  }

  pub fn save_to_csv(&self, path: &Path) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{CSV_HEADER}")?;
    for (x, samples) in &self.samples {
      if let Some(stat) = Stat::of(samples) {
        stat.write_csv_row(&mut w, x)?;
      }
    }
    w.flush()
  }
}

#[cfg(test)]
mod tests {
  use std::fs::read_to_string;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn stat_of_samples() {
    let s = Stat::of(&[4.0, 1.0, 3.0, 2.0]).unwrap();
    assert_eq!(4, s.count);
    assert!((s.mean - 2.5).abs() < 1e-12);
    assert_eq!(2.5, s.median);
    assert_eq!(1.0, s.min);
    assert_eq!(4.0, s.max);
    assert!((s.std_dev - 1.25f64.sqrt()).abs() < 1e-12);

    assert_eq!(3.0, Stat::of(&[5.0, 1.0, 3.0]).unwrap().median);
    assert_eq!(None, Stat::of(&[]));
  }

  #[test]
  fn report_to_csv() {
    let mut report = Report::new();
    report.add(8u64, Duration::from_millis(2));
    report.add(8u64, Duration::from_millis(4));
    report.add(1u64, Duration::from_millis(1));
    assert_eq!(2, report.stat(8).unwrap().count);
    assert_eq!(3.0, report.stat(8).unwrap().mean);
    assert!(report.stat(99).is_none());

    let dir = tempdir().unwrap();
    let path = dir.path().join("report.csv");
    report.save_to_csv(&path).unwrap();
    let csv = read_to_string(&path).unwrap();
    let lines = csv.lines().collect::<Vec<_>>();
    assert_eq!(vec![CSV_HEADER, "\"1\",1,1.000,1.000,0.000,1.000,1.000", "\"8\",2,3.000,3.000,1.000,2.000,4.000"], lines);
  }
}
