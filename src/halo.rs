//! Halo orientation: angular momentum of a particle region and an orthonormal
//! frame aligned with it.
//!
//! The simulation toolkit that produces particle data stays behind
//! [`HaloDataSource`], so the orientation math is testable on synthetic
//! regions.

use anyhow::Result;

pub type Vec3 = [f64; 3];

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(v: Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Unit vector along `v`; `None` for a (numerically) zero vector.
pub fn normalized(v: Vec3) -> Option<Vec3> {
    let n = norm(v);
    if n < 1e-12 {
        return None;
    }
    Some([v[0] / n, v[1] / n, v[2] / n])
}

// ---------------------------------------------------------------------------
// Particle regions
// ---------------------------------------------------------------------------

/// Particles inside a spherical cut of a halo.
#[derive(Debug, Clone, Default)]
pub struct SampleRegion {
    pub masses: Vec<f64>,
    /// Positions relative to the halo center, kpc.
    pub positions: Vec<Vec3>,
    /// Velocities, km/s.
    pub velocities: Vec<Vec3>,
}

/// Capability interface to the simulation data.  The viewer itself never
/// parses snapshots; implementations wrap whatever toolkit produced them.
pub trait HaloDataSource {
    /// All particles within `radius_kpc` of `center`.
    fn sphere(&self, center: Vec3, radius_kpc: f64) -> Result<SampleRegion>;
}

// ---------------------------------------------------------------------------
// Orientation math
// ---------------------------------------------------------------------------

/// Mass-weighted angular momentum of a region about its center of mass, with
/// the bulk velocity removed.  A massless region has zero angular momentum.
pub fn angular_momentum(region: &SampleRegion) -> Vec3 {
    let total_mass: f64 = region.masses.iter().sum();
    if total_mass <= 0.0 {
        return [0.0; 3];
    }

    let mut centroid = [0.0; 3];
    let mut bulk = [0.0; 3];
    for ((&m, p), v) in region
        .masses
        .iter()
        .zip(&region.positions)
        .zip(&region.velocities)
    {
        for k in 0..3 {
            centroid[k] += m * p[k];
            bulk[k] += m * v[k];
        }
    }
    for k in 0..3 {
        centroid[k] /= total_mass;
        bulk[k] /= total_mass;
    }

    let mut total = [0.0; 3];
    for ((&m, p), v) in region
        .masses
        .iter()
        .zip(&region.positions)
        .zip(&region.velocities)
    {
        let r = [p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]];
        let w = [v[0] - bulk[0], v[1] - bulk[1], v[2] - bulk[2]];
        let l = cross(r, w);
        for k in 0..3 {
            total[k] += m * l[k];
        }
    }
    total
}

/// Unit vector along `v` plus two unit vectors completing a right-handed
/// orthonormal basis.  `None` for a zero vector.
pub fn orthonormal_frame(v: Vec3) -> Option<[Vec3; 3]> {
    let n = normalized(v)?;

    // Cross against the coordinate axis least aligned with `n`.
    let axis = if n[0].abs() <= n[1].abs() && n[0].abs() <= n[2].abs() {
        [1.0, 0.0, 0.0]
    } else if n[1].abs() <= n[2].abs() {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };

    let u = normalized(cross(n, axis))?;
    let w = cross(n, u);
    Some([n, u, w])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn counter_orbiting_pair_spins_about_z() {
        let region = SampleRegion {
            masses: vec![1.0, 1.0],
            positions: vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]],
            velocities: vec![[0.0, 1.0, 0.0], [0.0, -1.0, 0.0]],
        };
        let l = angular_momentum(&region);
        assert!(close(l[0], 0.0) && close(l[1], 0.0) && close(l[2], 2.0), "{l:?}");
    }

    #[test]
    fn bulk_velocity_does_not_change_angular_momentum() {
        let bulk = [50.0, -30.0, 20.0];
        let region = SampleRegion {
            masses: vec![1.0, 1.0],
            positions: vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]],
            velocities: vec![
                [bulk[0], 1.0 + bulk[1], bulk[2]],
                [bulk[0], -1.0 + bulk[1], bulk[2]],
            ],
        };
        let l = angular_momentum(&region);
        assert!(close(l[2], 2.0), "{l:?}");
    }

    #[test]
    fn massless_region_has_no_spin() {
        assert_eq!(angular_momentum(&SampleRegion::default()), [0.0; 3]);
    }

    #[test]
    fn frame_is_orthonormal_and_right_handed() {
        let [n, u, w] = orthonormal_frame([0.3, 0.2, 0.93]).unwrap();
        for e in [n, u, w] {
            assert!(close(norm(e), 1.0), "{e:?}");
        }
        assert!(close(dot(n, u), 0.0));
        assert!(close(dot(n, w), 0.0));
        assert!(close(dot(u, w), 0.0));
        // Right-handed: n × u = w.
        let c = cross(n, u);
        for k in 0..3 {
            assert!(close(c[k], w[k]));
        }
    }

    #[test]
    fn frame_of_zero_vector_is_none() {
        assert!(orthonormal_frame([0.0; 3]).is_none());
    }
}
