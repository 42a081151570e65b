//! Generates demo point-set files (the shapes the server presets produce)
//! for trying the file-ingestion path without a server:
//!
//! ```text
//! cargo run --bin generate_points [out_dir]
//! ```

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};

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

    /// Box-Muller transform.
    fn gauss(&mut self, mu: f64, sigma: f64) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        mu + sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

/// Rescale both axes into [0.5, 9.5], the server's preset convention.
fn normalize(points: &mut [(f64, f64)]) {
    for axis in 0..2 {
        let get = |p: &(f64, f64)| if axis == 0 { p.0 } else { p.1 };
        let min = points.iter().map(&get).fold(f64::INFINITY, f64::min);
        let max = points.iter().map(&get).fold(f64::NEG_INFINITY, f64::max);
        let range = if (max - min).abs() < f64::EPSILON {
            1.0
        } else {
            max - min
        };
        for p in points.iter_mut() {
            let v = (get(p) - min) / range * 9.0 + 0.5;
            if axis == 0 {
                p.0 = v;
            } else {
                p.1 = v;
            }
        }
    }
}

fn blobs(rng: &mut SimpleRng, n: usize) -> Vec<(f64, f64)> {
    let centers = [(2.0, 2.0), (7.0, 3.0), (4.5, 7.5)];
    (0..n)
        .map(|i| {
            let (cx, cy) = centers[i % centers.len()];
            (rng.gauss(cx, 0.6), rng.gauss(cy, 0.6))
        })
        .collect()
}

fn moons(rng: &mut SimpleRng, n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let t = PI * ((i / 2) as f64) / ((n / 2) as f64);
            let (x, y) = if i % 2 == 0 {
                (t.cos(), t.sin())
            } else {
                (1.0 - t.cos(), 0.5 - t.sin())
            };
            (x + rng.gauss(0.0, 0.08), y + rng.gauss(0.0, 0.08))
        })
        .collect()
}

fn circles(rng: &mut SimpleRng, n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let t = 2.0 * PI * rng.next_f64();
            let r = if i % 2 == 0 { 1.0 } else { 0.5 };
            (
                r * t.cos() + rng.gauss(0.0, 0.05),
                r * t.sin() + rng.gauss(0.0, 0.05),
            )
        })
        .collect()
}

fn grid(n: usize) -> Vec<(f64, f64)> {
    let side = (n as f64).sqrt() as usize;
    let mut points = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            points.push((col as f64, row as f64));
        }
    }
    points.truncate(n);
    points
}

fn write_json(path: &Path, points: &[(f64, f64)]) -> Result<()> {
    let pairs: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
    let text = serde_json::to_string_pretty(&pairs)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn write_csv(path: &Path, points: &[(f64, f64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("writing {}", path.display()))?;
    writer.write_record(["x", "y"])?;
    for &(x, y) in points {
        writer.write_record([format!("{x:.4}"), format!("{y:.4}")])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "demo-data".into());
    let out_dir = Path::new(&out_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let n = 120;

    for (name, mut points) in [
        ("blobs", blobs(&mut rng, n)),
        ("moons", moons(&mut rng, n)),
        ("circles", circles(&mut rng, n)),
        ("grid", grid(n)),
    ] {
        normalize(&mut points);
        write_json(&out_dir.join(format!("{name}.json")), &points)?;
        println!("wrote {name}.json ({} points)", points.len());
    }

    // One CSV variant to exercise the tabular path.
    let mut points = blobs(&mut rng, n);
    normalize(&mut points);
    write_csv(&out_dir.join("blobs.csv"), &points)?;
    println!("wrote blobs.csv ({} points)", points.len());

    Ok(())
}
