use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::loader::load_isotherm;
use crate::data::model::{DEFAULT_CONCENTRATION_MM, DEFAULT_VOLUME_UL};
use crate::data::trim::{TrimParameters, DEFAULT_HOLD_PRESSURE};
use crate::render::plot::{save_isotherm_plot, PlotConfig, PlotSeries};

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// One dataset of the comparison: where it lives and how to scale and trim it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSpec {
    /// Legend label.
    pub label: String,
    pub path: PathBuf,
    /// Spreading-solution concentration (mM).
    pub concentration: f64,
    /// Spread volume (µL).
    pub volume: f64,
    /// Hold pressure the trim cuts after (mN/m).
    pub hold_pressure: f64,
}

impl DatasetSpec {
    pub fn new(label: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.to_string(),
            path: path.into(),
            concentration: DEFAULT_CONCENTRATION_MM,
            volume: DEFAULT_VOLUME_UL,
            hold_pressure: DEFAULT_HOLD_PRESSURE,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_hold_pressure(mut self, hold_pressure: f64) -> Self {
        self.hold_pressure = hold_pressure;
        self
    }
}

/// Everything the batch job needs: the datasets in legend order and the figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub datasets: Vec<DatasetSpec>,
    pub plot: PlotConfig,
}

const ODPA_HOLD_PRESSURE: f64 = 4.0;
const DHDP_HOLD_PRESSURE: f64 = 9.0;

impl Default for RunConfig {
    /// Er, Nd and mixed-lanthanide monolayers under ODPA and DHDP.
    fn default() -> Self {
        let odpa = |label: &str, path: &str| {
            DatasetSpec::new(label, path).with_hold_pressure(ODPA_HOLD_PRESSURE)
        };
        let dhdp = |label: &str, path: &str, volume: f64| {
            DatasetSpec::new(label, path)
                .with_volume(volume)
                .with_hold_pressure(DHDP_HOLD_PRESSURE)
        };

        Self {
            datasets: vec![
                odpa("Er+ODPA", "ODPA_data/ODPA_Er.txt"),
                odpa("Nd+ODPA", "ODPA_data/ODPA_Nd.txt"),
                odpa("Mix+ODPA", "ODPA_data/ODPA_mixture.txt"),
                dhdp("Er+DHDP", "Er_pure/Er_pure_iso.txt", 120.0),
                dhdp("Nd+DHDP", "Nd_pure/Nd_pure_iso.txt", 100.0),
                dhdp("Mix+DHDP", "mixture/mixture_iso.txt", 120.0),
            ],
            plot: PlotConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch job
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct IsothermApp {
    pub config: RunConfig,
}

impl IsothermApp {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Load and trim every dataset, then render the comparison figure.
    /// Nothing is written unless every dataset loads.
    pub fn run(&self) -> Result<()> {
        log::debug!(
            "run config: {}",
            serde_json::to_string(&self.config).context("serializing run config")?
        );

        let series = prepare_series(&self.config.datasets)?;
        save_isotherm_plot(&self.config.plot, &series)
    }
}

/// Load each dataset, trim it at its hold pressure, and pair it with its label.
/// Stops at the first dataset that fails to load.
pub fn prepare_series(datasets: &[DatasetSpec]) -> Result<Vec<PlotSeries>> {
    datasets
        .iter()
        .map(|spec| -> Result<PlotSeries> {
            let mut record = load_isotherm(&spec.path, spec.concentration, spec.volume)
                .with_context(|| format!("loading {} from {}", spec.label, spec.path.display()))?;
            log::debug!(
                "{}: {} mM x {} uL, area divided by {:.4}",
                spec.label,
                record.concentration(),
                record.volume(),
                record.molecule_scale()
            );

            let loaded = record.len();
            let kept = record.trim(&TrimParameters::new(spec.hold_pressure));
            log::info!(
                "{}: {loaded} samples, {kept} kept after trim at {} mN/m",
                spec.label,
                spec.hold_pressure
            );
            if record.is_empty() {
                log::warn!("{}: no samples left to plot", spec.label);
            } else if let (Some(t), Some(a)) = (record.time().last(), record.area().last()) {
                log::debug!("{}: ends at {t} s, {a:.2} A^2", spec.label);
            }
            Ok(PlotSeries::from_record(&spec.label, &record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::data::error::LoadError;

    fn write_ramp(path: &Path, n: usize, raw_area: f64) {
        let mut content = String::from("Time\tArea\tA\tB\tC\tPressure\n");
        for i in 0..n {
            content.push_str(&format!(
                "{i}\t{raw_area}\t0\t0\t0\t{}\n",
                i as f64 * 0.01 + 0.005
            ));
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn default_config_lists_six_datasets_in_legend_order() {
        let cfg = RunConfig::default();
        let labels: Vec<&str> = cfg.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Er+ODPA", "Nd+ODPA", "Mix+ODPA", "Er+DHDP", "Nd+DHDP", "Mix+DHDP"]
        );

        let volumes: Vec<f64> = cfg.datasets.iter().map(|d| d.volume).collect();
        assert_eq!(volumes, [160.0, 160.0, 160.0, 120.0, 100.0, 120.0]);

        let holds: Vec<f64> = cfg.datasets.iter().map(|d| d.hold_pressure).collect();
        assert_eq!(holds, [4.0, 4.0, 4.0, 9.0, 9.0, 9.0]);

        assert!(cfg.datasets.iter().all(|d| d.concentration == 1.0));
        assert_eq!(cfg.plot.output, PathBuf::from("isotherms.png"));
    }

    #[test]
    fn prepare_series_trims_each_dataset_at_its_own_hold() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        // pressure = 0.01 * i + 0.005, so hold 4 triggers at 390 and hold 9 at 890
        write_ramp(&a, 3000, 9.632);
        write_ramp(&b, 3000, 9.632);

        let datasets = vec![
            DatasetSpec::new("A", &a).with_hold_pressure(4.0),
            DatasetSpec::new("B", &b).with_hold_pressure(9.0),
        ];
        let series = prepare_series(&datasets).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "A");
        assert_eq!(series[0].points.len(), 390 + 1000);
        assert_eq!(series[1].points.len(), 890 + 1000);
        assert!((series[0].points[0].0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prepare_series_uses_dataset_volume() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v.txt");
        write_ramp(&path, 10, 120.0);

        let series = prepare_series(&[DatasetSpec::new("V", &path).with_volume(100.0)]).unwrap();
        let expected = 120.0 / (0.0602 * 100.0);
        assert!((series[0].points[0].0 - expected).abs() < 1e-9);
    }

    #[test]
    fn prepare_series_aborts_on_missing_dataset() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.txt");
        write_ramp(&good, 10, 1.0);

        let datasets = vec![
            DatasetSpec::new("good", &good),
            DatasetSpec::new("gone", dir.path().join("gone.txt")),
        ];
        let err = prepare_series(&datasets).unwrap_err();

        assert!(err.to_string().contains("gone"));
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn failed_load_writes_no_image() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.png");
        let app = IsothermApp::new(RunConfig {
            datasets: vec![DatasetSpec::new("gone", dir.path().join("gone.txt"))],
            plot: PlotConfig {
                output: output.clone(),
                ..PlotConfig::default()
            },
        });

        assert!(app.run().is_err());
        assert!(!output.exists());
    }
}
