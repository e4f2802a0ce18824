use std::ops::Range;

use thiserror::Error;

use super::binning::{assign_bins, BinEdges, BinError};

/// Number of radius shells / azimuthal wedges per profile.
pub const GROUP_COUNT: usize = 3;

/// Wedge cells with fewer raw samples than this are reported as sparse.
pub const MIN_CELL_SAMPLES: usize = 5;

/// Invalid input to a profile computation.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Bin(#[from] BinError),
    #[error("column density array has {values} entries for {samples} sightlines")]
    ValueLengthMismatch { samples: usize, values: usize },
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Median with interquartile bounds for one bin column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
}

/// Percentile summary of one shell or wedge along the profile axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBand {
    /// Human-readable group bounds, e.g. "0-50 kpc" or "30°-60°".
    pub label: String,
    /// Per-bin quartiles, aligned with the bin-edge array of the profile
    /// axis. `None` marks a bin with no data.
    pub bins: Vec<Option<Quartiles>>,
}

// ---------------------------------------------------------------------------
// Percentiles
// ---------------------------------------------------------------------------

/// Linearly interpolated percentile of an ascending sample, `q` in [0, 100].
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// 25th/50th/75th percentiles of a sample, sorting it in place.
///
/// An empty sample has no percentiles and yields `None`.
pub fn quartiles(values: &mut [f64]) -> Option<Quartiles> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Some(Quartiles {
        p25: percentile_sorted(values, 25.0),
        median: percentile_sorted(values, 50.0),
        p75: percentile_sorted(values, 75.0),
    })
}

// ---------------------------------------------------------------------------
// Group geometry
// ---------------------------------------------------------------------------

/// Bin-id span and label per impact-radius shell: three equal runs of the
/// in-domain radius ids, starting at id 1 (id 0 collects sub-domain samples).
fn shell_spans(radius_edges: &BinEdges) -> Vec<(Range<usize>, String)> {
    let span = radius_edges.len().saturating_sub(1) / GROUP_COUNT;
    let edges = radius_edges.as_slice();
    (0..GROUP_COUNT)
        .map(|j| {
            let start = 1 + j * span;
            let label = if span == 0 {
                format!("shell {j}")
            } else {
                format!("{}-{} kpc", edges[start - 1], edges[start + span - 1])
            };
            (start..start + span, label)
        })
        .collect()
}

/// Bin-id span and label per azimuthal wedge: three equal runs of the angle
/// ids starting at id 0.
fn wedge_spans(angle_edges: &BinEdges) -> Vec<(Range<usize>, String)> {
    let span = angle_edges.len() / GROUP_COUNT;
    let edges = angle_edges.as_slice();
    (0..GROUP_COUNT)
        .map(|j| {
            let label = if span == 0 {
                format!("wedge {j}")
            } else {
                let lo = if j == 0 { 0.0 } else { edges[j * span - 1] };
                format!("{lo}°-{}°", edges[(j + 1) * span - 1])
            };
            (j * span..(j + 1) * span, label)
        })
        .collect()
}

fn checked_bin_ids(
    angle: &[f64],
    radius: &[f64],
    value: &[f64],
    angle_edges: &BinEdges,
    radius_edges: &BinEdges,
) -> Result<(Vec<usize>, Vec<usize>), ProfileError> {
    let ids = assign_bins(angle, radius, angle_edges, radius_edges)?;
    if value.len() != angle.len() {
        return Err(ProfileError::ValueLengthMismatch {
            samples: angle.len(),
            values: value.len(),
        });
    }
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Median and interquartile range of column density versus azimuthal angle,
/// one band per impact-radius shell.
///
/// Each shell spans ten radius sub-bins under the default grids. For every
/// angle bin the raw samples of each sub-bin collapse to their mean first and
/// the quartiles are taken over those means, so a heavily sampled sub-bin
/// carries no more weight than a sparse one. Empty sub-bins drop out of the
/// quartile sample; an angle bin whose sub-bins are all empty yields `None`.
pub fn radial_shell_profile(
    angle: &[f64],
    radius: &[f64],
    value: &[f64],
    angle_edges: &BinEdges,
    radius_edges: &BinEdges,
) -> Result<Vec<ProfileBand>, ProfileError> {
    let (a_ids, r_ids) = checked_bin_ids(angle, radius, value, angle_edges, radius_edges)?;

    let n_angle = angle_edges.len();
    // One extra column/row for overflow ids; those samples never join a shell.
    let cols = radius_edges.len() + 1;
    let mut sums = vec![0.0f64; (n_angle + 1) * cols];
    let mut counts = vec![0usize; (n_angle + 1) * cols];
    for ((&a, &r), &v) in a_ids.iter().zip(&r_ids).zip(value) {
        sums[a * cols + r] += v;
        counts[a * cols + r] += 1;
    }

    let bands = shell_spans(radius_edges)
        .into_iter()
        .map(|(span, label)| {
            let bins = (0..n_angle)
                .map(|a_bin| {
                    let mut means: Vec<f64> = span
                        .clone()
                        .filter_map(|r_bin| {
                            let n = counts[a_bin * cols + r_bin];
                            (n > 0).then(|| sums[a_bin * cols + r_bin] / n as f64)
                        })
                        .collect();
                    quartiles(&mut means)
                })
                .collect();
            ProfileBand { label, bins }
        })
        .collect();
    Ok(bands)
}

/// Median and interquartile range of column density versus impact radius, one
/// band per azimuthal wedge.
///
/// Quartiles are taken directly over the raw samples of each (radius bin,
/// wedge) cell, with no intermediate mean. Cells with fewer than
/// [`MIN_CELL_SAMPLES`] sightlines are reported through the log as sparse but
/// still summarized; an empty cell yields `None`.
pub fn angular_wedge_profile(
    angle: &[f64],
    radius: &[f64],
    value: &[f64],
    angle_edges: &BinEdges,
    radius_edges: &BinEdges,
) -> Result<Vec<ProfileBand>, ProfileError> {
    let (a_ids, r_ids) = checked_bin_ids(angle, radius, value, angle_edges, radius_edges)?;

    let n_radius = radius_edges.len();
    let cols = n_radius + 1;
    let span = angle_edges.len() / GROUP_COUNT;
    let mut cells: Vec<Vec<f64>> = vec![Vec::new(); GROUP_COUNT * cols];
    if span > 0 {
        for ((&a, &r), &v) in a_ids.iter().zip(&r_ids).zip(value) {
            let wedge = a / span;
            if wedge < GROUP_COUNT {
                cells[wedge * cols + r].push(v);
            }
        }
    }

    let bands = wedge_spans(angle_edges)
        .into_iter()
        .enumerate()
        .map(|(w, (_, label))| {
            let bins = (0..n_radius)
                .map(|r_bin| {
                    let cell = &mut cells[w * cols + r_bin];
                    if cell.len() < MIN_CELL_SAMPLES {
                        log::warn!(
                            "only {} sightlines in radius bin {r_bin} for wedge {label}",
                            cell.len()
                        );
                    }
                    quartiles(cell)
                })
                .collect();
            ProfileBand { label, bins }
        })
        .collect();
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::binning::{default_angle_edges, default_radius_edges};

    /// One sample in each 5 kpc sub-bin of the innermost shell, all at the
    /// same angle and all equal to 2.0: every sub-bin mean is 2.0, so the
    /// quartiles collapse to 2.0.
    #[test]
    fn constant_shell_collapses_to_constant_quartiles() {
        let radius: Vec<f64> = (0..10).map(|i| 2.5 + 5.0 * i as f64).collect();
        let angle = vec![1.0; 10];
        let value = vec![2.0; 10];

        let bands = radial_shell_profile(
            &angle,
            &radius,
            &value,
            &default_angle_edges(),
            &default_radius_edges(),
        )
        .unwrap();

        assert_eq!(bands.len(), GROUP_COUNT);
        assert_eq!(bands[0].label, "0-50 kpc");
        assert_eq!(bands[1].label, "50-100 kpc");
        assert_eq!(bands[2].label, "100-150 kpc");

        let q = bands[0].bins[0].expect("angle bin 0 has data");
        assert_eq!(q.p25, 2.0);
        assert_eq!(q.median, 2.0);
        assert_eq!(q.p75, 2.0);

        // No samples anywhere else.
        assert!(bands[0].bins[1..].iter().all(Option::is_none));
        assert!(bands[1].bins.iter().all(Option::is_none));
        assert!(bands[2].bins.iter().all(Option::is_none));
    }

    /// A sparse wedge cell (4 samples, below the 5-sample threshold) is still
    /// summarized, with the interpolated percentiles of [1, 2, 3, 4].
    #[test]
    fn sparse_wedge_cell_is_still_summarized() {
        let angle = vec![5.0, 10.0, 15.0, 20.0];
        let radius = vec![10.0; 4];
        let value = vec![1.0, 2.0, 3.0, 4.0];

        let bands = angular_wedge_profile(
            &angle,
            &radius,
            &value,
            &default_angle_edges(),
            &default_radius_edges(),
        )
        .unwrap();

        assert_eq!(bands[0].label, "0°-30°");
        assert_eq!(bands[1].label, "30°-60°");
        assert_eq!(bands[2].label, "60°-90°");

        // radius 10 kpc digitizes to bin id 3 under the default grid.
        let q = bands[0].bins[3].expect("cell has data");
        assert_eq!(q.median, 2.5);
        assert_eq!(q.p25, 1.75);
        assert_eq!(q.p75, 3.25);

        // Empty cells carry the no-data sentinel rather than a numeric fault.
        assert!(bands[0].bins[0].is_none());
        assert!(bands[1].bins.iter().all(Option::is_none));
    }

    fn scattered_samples() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut angle = Vec::new();
        let mut radius = Vec::new();
        let mut value = Vec::new();
        for i in 0..600 {
            angle.push((i * 37 % 900) as f64 / 10.0);
            radius.push((i * 53 % 1500) as f64 / 10.0);
            value.push(1.0 + (i * 91 % 173) as f64);
        }
        (angle, radius, value)
    }

    #[test]
    fn quartiles_are_ordered_in_every_populated_column() {
        let (angle, radius, value) = scattered_samples();
        let a_edges = default_angle_edges();
        let r_edges = default_radius_edges();

        let shell = radial_shell_profile(&angle, &radius, &value, &a_edges, &r_edges).unwrap();
        let wedge = angular_wedge_profile(&angle, &radius, &value, &a_edges, &r_edges).unwrap();

        for band in shell.iter().chain(&wedge) {
            for q in band.bins.iter().flatten() {
                assert!(q.p25 <= q.median, "{}: {q:?}", band.label);
                assert!(q.median <= q.p75, "{}: {q:?}", band.label);
            }
        }
    }

    /// Concatenation order of input files must not matter: the binner sees
    /// only unordered groupings.
    #[test]
    fn profiles_are_concatenation_order_independent() {
        let (angle, radius, value) = scattered_samples();
        let mid = angle.len() / 3;

        let forward = |a: &[f64], r: &[f64], v: &[f64]| {
            let a_edges = default_angle_edges();
            let r_edges = default_radius_edges();
            (
                radial_shell_profile(a, r, v, &a_edges, &r_edges).unwrap(),
                angular_wedge_profile(a, r, v, &a_edges, &r_edges).unwrap(),
            )
        };

        let plain = forward(&angle, &radius, &value);

        let swap = |xs: &[f64]| {
            let mut out = xs[mid..].to_vec();
            out.extend_from_slice(&xs[..mid]);
            out
        };
        let swapped = forward(&swap(&angle), &swap(&radius), &swap(&value));

        assert_eq!(plain, swapped);
    }

    #[test]
    fn value_length_mismatch_is_rejected() {
        let err = radial_shell_profile(
            &[1.0, 2.0],
            &[10.0, 20.0],
            &[5.0],
            &default_angle_edges(),
            &default_radius_edges(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::ValueLengthMismatch {
                samples: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn quartiles_of_empty_sample_is_none() {
        assert_eq!(quartiles(&mut []), None);
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let q = quartiles(&mut [4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(q.p25, 1.75);
        assert_eq!(q.median, 2.5);
        assert_eq!(q.p75, 3.25);
    }
}
