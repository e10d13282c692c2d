use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Must match the loader's normalization constant.
const AVOGADRO_SCALE: f64 = 0.0602;

/// Samples recorded while the trough holds at the target pressure.
const PLATEAU_SAMPLES: usize = 3000;

/// Area per molecule (Å²) at the start of compression.
const START_AREA: f64 = 60.0;

/// Compression per sample (Å² per molecule).
const COMPRESSION_STEP: f64 = 0.02;

const HEADER: [&str; 6] = [
    "Time (s)",
    "Area (cm2)",
    "Mma (A2)",
    "Speed (mm/min)",
    "Temp (C)",
    "Pressure (mN/m)",
];

const BARRIER_SPEED: f64 = 10.0;
const TEMPERATURE: f64 = 21.5;

struct SampleRun {
    path: &'static str,
    concentration: f64,
    volume: f64,
    hold_pressure: f64,
    /// Area per molecule where pressure starts to rise (Å²).
    lift_off: f64,
    /// Pressure rise per Å² of compression past lift-off (mN/m).
    stiffness: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Area per molecule and surface pressure for every sample of one run:
/// compression until the hold pressure is passed, then a slowly relaxing plateau.
fn simulate(run: &SampleRun, rng: &mut SimpleRng) -> Vec<(f64, f64)> {
    let mut samples = Vec::new();
    let mut area = START_AREA;

    loop {
        let ideal = (run.stiffness * (run.lift_off - area)).max(0.0);
        let pressure = ideal + rng.gauss(0.0, 0.02);
        samples.push((area, pressure));
        if ideal > run.hold_pressure + 0.05 || area <= COMPRESSION_STEP {
            break;
        }
        area -= COMPRESSION_STEP;
    }

    for _ in 0..PLATEAU_SAMPLES {
        area -= 0.0005;
        samples.push((area, run.hold_pressure + rng.gauss(0.0, 0.03)));
    }
    samples
}

fn write_run(path: &Path, run: &SampleRun, rng: &mut SimpleRng) -> Result<usize> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    // The loader always drops line 1, so the comment goes after the header.
    writeln!(file, "{}", HEADER.join("\t"))?;
    writeln!(
        file,
        "# synthetic isotherm: {} mM, {} uL, hold {} mN/m",
        run.concentration, run.volume, run.hold_pressure
    )?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(file);

    let scale = run.concentration * AVOGADRO_SCALE * run.volume;
    let samples = simulate(run, rng);
    for (i, &(area, pressure)) in samples.iter().enumerate() {
        writer.write_record(&[
            format!("{i}"),
            format!("{:.4}", area * scale),
            format!("{area:.4}"),
            format!("{BARRIER_SPEED:.1}"),
            format!("{:.2}", TEMPERATURE + rng.gauss(0.0, 0.05)),
            format!("{pressure:.4}"),
        ])?;
    }
    writer.flush()?;
    Ok(samples.len())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let odpa = |path, lift_off| SampleRun {
        path,
        concentration: 1.0,
        volume: 160.0,
        hold_pressure: 4.0,
        lift_off,
        stiffness: 0.9,
    };
    let dhdp = |path, volume, lift_off| SampleRun {
        path,
        concentration: 1.0,
        volume,
        hold_pressure: 9.0,
        lift_off,
        stiffness: 0.7,
    };

    let runs = [
        odpa("ODPA_data/ODPA_Er.txt", 23.0),
        odpa("ODPA_data/ODPA_Nd.txt", 25.0),
        odpa("ODPA_data/ODPA_mixture.txt", 24.0),
        dhdp("Er_pure/Er_pure_iso.txt", 120.0, 34.0),
        dhdp("Nd_pure/Nd_pure_iso.txt", 100.0, 37.0),
        dhdp("mixture/mixture_iso.txt", 120.0, 35.5),
    ];

    for run in &runs {
        let n = write_run(Path::new(run.path), run, &mut rng)?;
        println!("Wrote {n} samples to {}", run.path);
    }
    Ok(())
}
