// ---------------------------------------------------------------------------
// Physical constants and loader defaults
// ---------------------------------------------------------------------------

/// Molecules per (mM · µL), expressed against Å² per cm².
///
/// 1 µL of a 1 mM spreading solution holds 6.02e14 molecules and 1 cm² is
/// 1e16 Å², so a trough area in cm² divided by
/// `concentration * AVOGADRO_SCALE * volume` is the area per molecule in Å².
pub const AVOGADRO_SCALE: f64 = 0.0602;

/// Default spreading-solution concentration (mM).
pub const DEFAULT_CONCENTRATION_MM: f64 = 1.0;

/// Default spread volume (µL).
pub const DEFAULT_VOLUME_UL: f64 = 160.0;

/// Number of molecules (in `AVOGADRO_SCALE` units) spread on the trough.
pub fn molecule_scale(concentration: f64, volume: f64) -> f64 {
    concentration * AVOGADRO_SCALE * volume
}

// ---------------------------------------------------------------------------
// RawSample – one data row of a trough export
// ---------------------------------------------------------------------------

/// One parsed data row before area normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Elapsed time (s).
    pub time: f64,
    /// Trough area (cm²).
    pub area: f64,
    /// Surface pressure (mN/m).
    pub pressure: f64,
}

// ---------------------------------------------------------------------------
// IsothermRecord – one normalized run
// ---------------------------------------------------------------------------

/// A loaded isotherm: three index-aligned series of equal length.
///
/// The series are private so the only way to shorten them is
/// [`IsothermRecord::trim`], which cuts all three at once.
#[derive(Debug, Clone, PartialEq)]
pub struct IsothermRecord {
    time: Vec<f64>,
    area: Vec<f64>,
    pressure: Vec<f64>,
    concentration: f64,
    volume: f64,
}

impl IsothermRecord {
    /// Build a record from raw rows, dividing each area by the molecule scale.
    pub fn from_samples<I>(samples: I, concentration: f64, volume: f64) -> Self
    where
        I: IntoIterator<Item = RawSample>,
    {
        let scale = molecule_scale(concentration, volume);
        let samples = samples.into_iter();
        let (lower, _) = samples.size_hint();

        let mut time = Vec::with_capacity(lower);
        let mut area = Vec::with_capacity(lower);
        let mut pressure = Vec::with_capacity(lower);
        for s in samples {
            time.push(s.time);
            area.push(s.area / scale);
            pressure.push(s.pressure);
        }

        IsothermRecord {
            time,
            area,
            pressure,
            concentration,
            volume,
        }
    }

    /// Elapsed time per sample (s).
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Area per molecule (Å²).
    pub fn area(&self) -> &[f64] {
        &self.area
    }

    /// Surface pressure (mN/m).
    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Divisor that was applied to the raw area column.
    pub fn molecule_scale(&self) -> f64 {
        molecule_scale(self.concentration, self.volume)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the record holds no samples.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// `(area, pressure)` pairs in sample order, the isotherm as plotted.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.area.iter().copied().zip(self.pressure.iter().copied())
    }

    /// Keep the first `len` samples of every series. No-op if already shorter.
    pub(super) fn truncate(&mut self, len: usize) {
        self.time.truncate(len);
        self.area.truncate(len);
        self.pressure.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, area: f64, pressure: f64) -> RawSample {
        RawSample {
            time,
            area,
            pressure,
        }
    }

    #[test]
    fn unit_concentration_default_volume_normalizes_to_one() {
        let rec = IsothermRecord::from_samples(
            [sample(0.0, 9.632, 0.0)],
            DEFAULT_CONCENTRATION_MM,
            DEFAULT_VOLUME_UL,
        );
        assert!((rec.area()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalization_is_invertible() {
        let raw = [512.0, 300.25, 42.0, 0.5, 0.0];
        let rec = IsothermRecord::from_samples(
            raw.iter().enumerate().map(|(i, &a)| sample(i as f64, a, 1.0)),
            2.5,
            120.0,
        );
        for (norm, raw) in rec.area().iter().zip(raw) {
            assert!((norm * rec.molecule_scale() - raw).abs() < 1e-9);
        }
    }

    #[test]
    fn time_and_pressure_are_kept_verbatim() {
        let rec = IsothermRecord::from_samples(
            [sample(0.5, 100.0, -0.02), sample(1.5, 99.0, 0.13)],
            1.0,
            100.0,
        );
        assert_eq!(rec.time(), &[0.5, 1.5]);
        assert_eq!(rec.pressure(), &[-0.02, 0.13]);
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.concentration(), 1.0);
        assert_eq!(rec.volume(), 100.0);
    }

    #[test]
    fn truncate_cuts_all_series_together() {
        let mut rec = IsothermRecord::from_samples(
            (0..10).map(|i| sample(i as f64, 10.0, i as f64)),
            1.0,
            160.0,
        );
        rec.truncate(4);
        assert_eq!(rec.time().len(), 4);
        assert_eq!(rec.area().len(), 4);
        assert_eq!(rec.pressure().len(), 4);

        rec.truncate(100);
        assert_eq!(rec.len(), 4);
    }

    #[test]
    fn points_pair_area_with_pressure() {
        let rec = IsothermRecord::from_samples(
            [sample(0.0, 19.264, 1.0), sample(1.0, 9.632, 2.0)],
            1.0,
            160.0,
        );
        let pts: Vec<(f64, f64)> = rec.points().collect();
        assert_eq!(pts.len(), 2);
        assert!((pts[0].0 - 2.0).abs() < 1e-12);
        assert_eq!(pts[1].1, 2.0);
    }
}
