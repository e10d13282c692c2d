use super::model::IsothermRecord;

// ---------------------------------------------------------------------------
// Trim parameters
// ---------------------------------------------------------------------------

/// Default hold pressure (mN/m).
pub const DEFAULT_HOLD_PRESSURE: f64 = 10.0;

/// How far below the hold pressure a sample may sit and still count as
/// having reached it. The trough controller settles just under its target.
pub const TRIM_TOLERANCE: f64 = 0.1;

/// Samples kept after the hold pressure is first reached. Long enough to show
/// the start of the plateau, short enough to drop relaxation drift.
pub const TRIM_LOOKAHEAD_SAMPLES: usize = 1000;

/// Where to cut an isotherm once compression reaches the hold pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimParameters {
    pub hold_pressure: f64,
    pub tolerance: f64,
    pub lookahead: usize,
}

impl Default for TrimParameters {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_PRESSURE)
    }
}

impl TrimParameters {
    /// Parameters for `hold_pressure` with the standard tolerance and lookahead.
    pub fn new(hold_pressure: f64) -> Self {
        Self {
            hold_pressure,
            tolerance: TRIM_TOLERANCE,
            lookahead: TRIM_LOOKAHEAD_SAMPLES,
        }
    }

    /// Pressure a sample must exceed to trigger the cut.
    pub fn threshold(&self) -> f64 {
        self.hold_pressure - self.tolerance
    }
}

// ---------------------------------------------------------------------------
// Threshold scan
// ---------------------------------------------------------------------------

/// Index of the first sample whose pressure exceeds the threshold.
/// NaN never does.
pub fn hold_index(pressure: &[f64], params: &TrimParameters) -> Option<usize> {
    let threshold = params.threshold();
    pressure.iter().position(|&p| p > threshold)
}

/// Length to truncate to: trigger index plus lookahead.
///
/// When the threshold is never crossed the last index stands in for the
/// trigger, which leaves any series shorter than the lookahead untouched.
pub fn trim_cutoff(pressure: &[f64], params: &TrimParameters) -> usize {
    let trigger = match hold_index(pressure, params) {
        Some(i) => i,
        None => {
            log::warn!(
                "pressure never exceeds {:.2} mN/m; keeping series up to last index + {}",
                params.threshold(),
                params.lookahead
            );
            pressure.len().saturating_sub(1)
        }
    };
    trigger.saturating_add(params.lookahead)
}

impl IsothermRecord {
    /// Drop samples past the cutoff for `params`. Returns the new length.
    pub fn trim(&mut self, params: &TrimParameters) -> usize {
        let cutoff = trim_cutoff(self.pressure(), params);
        let before = self.len();
        self.truncate(cutoff);
        log::debug!(
            "trim at {:.1} mN/m: cutoff {cutoff}, {before} -> {} samples",
            params.hold_pressure,
            self.len()
        );
        self.len()
    }
}
