use std::f64::consts::PI;
use std::sync::Arc;

use anyhow::anyhow;
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use cgm_profiler::data::model::EDGE_TAG;
use cgm_profiler::halo::{
    HaloDataSource, SampleRegion, Vec3, angular_momentum, dot, norm, orthonormal_frame,
};

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
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Synthetic halo
// ---------------------------------------------------------------------------

/// A disk of particles on circular orbits in a tilted plane, sharing a common
/// bulk motion.
struct DiskHalo {
    spin: Vec3,
    bulk_velocity: Vec3,
    n_particles: usize,
    seed: u64,
}

impl HaloDataSource for DiskHalo {
    fn sphere(&self, center: Vec3, radius_kpc: f64) -> anyhow::Result<SampleRegion> {
        let [n, u, w] =
            orthonormal_frame(self.spin).ok_or_else(|| anyhow!("disk spin axis is degenerate"))?;

        let mut rng = SimpleRng::new(self.seed);
        let mut region = SampleRegion::default();
        let v_circ = 200.0; // km/s

        for _ in 0..self.n_particles {
            let r = radius_kpc * rng.next_f64().sqrt();
            let theta = 2.0 * PI * rng.next_f64();
            let (sin, cos) = theta.sin_cos();
            // Thin disk in the plane perpendicular to the spin axis.
            let h = 0.05 * radius_kpc * rng.gauss(0.0, 1.0);

            let mut pos = [0.0; 3];
            let mut vel = [0.0; 3];
            for k in 0..3 {
                pos[k] = center[k] + r * (cos * u[k] + sin * w[k]) + h * n[k];
                vel[k] = v_circ * (cos * w[k] - sin * u[k]) + self.bulk_velocity[k];
            }
            region.masses.push(1.0);
            region.positions.push(pos);
            region.velocities.push(vel);
        }
        Ok(region)
    }
}

// ---------------------------------------------------------------------------
// Column density model
// ---------------------------------------------------------------------------

/// log10 column densities for one sightline: a power-law radial decline, with
/// the O VI component enhanced toward the minor axis (outflow cones).
fn log_columns(radius: f64, angle: f64, rng: &mut SimpleRng) -> (f64, f64) {
    let x = radius / 150.0;
    let h = 16.8 - 2.0 * x + rng.gauss(0.0, 0.25);
    let o = 13.9 - 1.0 * x + 0.45 * (1.0 - angle / 90.0) + rng.gauss(0.0, 0.2);
    (h, o)
}

fn main() {
    // Orient the disk from its inner 15 kpc, the way the projection pipeline
    // does for real snapshots.
    let halo = DiskHalo {
        spin: [0.25, 0.1, 0.96],
        bulk_velocity: [120.0, -45.0, 60.0],
        n_particles: 20_000,
        seed: 42,
    };
    let region = halo
        .sphere([0.0; 3], 15.0)
        .expect("building synthetic halo");
    let spin = angular_momentum(&region);
    let [minor, _los, major] = orthonormal_frame(spin).expect("degenerate angular momentum");

    println!(
        "Recovered spin axis: [{:.3}, {:.3}, {:.3}]",
        minor[0], minor[1], minor[2]
    );

    // Edge-on sightlines: impact positions in the plane spanned by the
    // projected spin axis (minor) and the disk major axis.
    let mut rng = SimpleRng::new(7);
    let n_sightlines = 5000;

    let mut phi = Vec::with_capacity(n_sightlines);
    let mut radius = Vec::with_capacity(n_sightlines);
    let mut h_cdens = Vec::with_capacity(n_sightlines);
    let mut o_cdens = Vec::with_capacity(n_sightlines);

    for _ in 0..n_sightlines {
        let r = 150.0 * rng.next_f64().sqrt();
        let theta = 2.0 * PI * rng.next_f64();
        let (sin, cos) = theta.sin_cos();
        let mut b = [0.0; 3];
        for k in 0..3 {
            b[k] = r * (cos * minor[k] + sin * major[k]);
        }

        // Azimuthal angle: 0° on the projected spin axis, 90° in the disk
        // plane.
        let along_spin = dot(b, minor).abs();
        let along_plane = dot(b, major).abs();
        let angle = along_plane.atan2(along_spin).to_degrees();
        let r_impact = norm(b);

        let (log_h, log_o) = log_columns(r_impact, angle, &mut rng);
        phi.push(angle);
        radius.push(r_impact);
        h_cdens.push(10f64.powf(log_h));
        o_cdens.push(10f64.powf(log_o));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("phi", DataType::Float64, false),
        Field::new("radius", DataType::Float64, false),
        Field::new(
            format!("H_number_density/{EDGE_TAG}"),
            DataType::Float64,
            false,
        ),
        Field::new(
            format!("O_p5_number_density/{EDGE_TAG}"),
            DataType::Float64,
            false,
        ),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(phi)),
            Arc::new(Float64Array::from(radius)),
            Arc::new(Float64Array::from(h_cdens)),
            Arc::new(Float64Array::from(o_cdens)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let output_path = "sample_cdens.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!("Wrote {n_sightlines} sightlines to {output_path}");
}
