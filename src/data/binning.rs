use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invalid bin-edge or sample-array input.
#[derive(Debug, Error, PartialEq)]
pub enum BinError {
    #[error("bin edges are empty")]
    EmptyEdges,
    #[error("bin edges must be strictly ascending: edge[{index}] = {value} does not increase")]
    NotAscending { index: usize, value: f64 },
    #[error("angle and radius arrays differ in length ({angle} vs {radius})")]
    AxisLengthMismatch { angle: usize, radius: usize },
}

// ---------------------------------------------------------------------------
// BinEdges – validated half-open bin boundaries
// ---------------------------------------------------------------------------

/// Strictly ascending edge values defining half-open bins.
///
/// A value digitizes to the number of edges `<= x`, which is the index of the
/// first edge strictly greater than it. Values below the first edge
/// map to id 0; values at or above the last edge map to `len()`. The upper
/// side is unbounded: out-of-domain samples get an overflow id rather than an
/// error, and simply fall outside every profile group downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    pub fn new(edges: Vec<f64>) -> Result<Self, BinError> {
        if edges.is_empty() {
            return Err(BinError::EmptyEdges);
        }
        for (i, pair) in edges.windows(2).enumerate() {
            if !(pair[1] > pair[0]) {
                return Err(BinError::NotAscending {
                    index: i + 1,
                    value: pair[1],
                });
            }
        }
        Ok(BinEdges { edges })
    }

    /// Number of edges; in-domain bin ids run `0..len()`.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.edges
    }

    /// Bin id for a single value: the count of edges `<= x`.
    pub fn digitize_one(&self, x: f64) -> usize {
        self.edges.partition_point(|&e| e <= x)
    }

    /// Bin ids for a whole sample array.
    pub fn digitize(&self, values: &[f64]) -> Vec<usize> {
        values.iter().map(|&x| self.digitize_one(x)).collect()
    }

    /// Midpoint of each bin column for plotting. The leading bin has no lower
    /// edge of its own and is anchored at `domain_min`.
    pub fn centers(&self, domain_min: f64) -> Vec<f64> {
        let mut lower = domain_min;
        self.edges
            .iter()
            .map(|&e| {
                let c = 0.5 * (lower + e);
                lower = e;
                c
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Default grids
// ---------------------------------------------------------------------------

/// Default azimuthal grid: 30 edges at 3° steps over (0°, 90°].
pub fn default_angle_edges() -> BinEdges {
    BinEdges {
        edges: (1..=30).map(|i| f64::from(i) * 3.0).collect(),
    }
}

/// Default impact-parameter grid: 31 edges at 5 kpc steps over [0, 150] kpc.
pub fn default_radius_edges() -> BinEdges {
    BinEdges {
        edges: (0..=30).map(|i| f64::from(i) * 5.0).collect(),
    }
}

// ---------------------------------------------------------------------------
// Bin assignment
// ---------------------------------------------------------------------------

/// Assign every sightline to an angle bin and a radius bin.
///
/// Returns one id array per axis, aligned with the inputs.
pub fn assign_bins(
    angle: &[f64],
    radius: &[f64],
    angle_edges: &BinEdges,
    radius_edges: &BinEdges,
) -> Result<(Vec<usize>, Vec<usize>), BinError> {
    if angle.len() != radius.len() {
        return Err(BinError::AxisLengthMismatch {
            angle: angle.len(),
            radius: radius.len(),
        });
    }
    Ok((angle_edges.digitize(angle), radius_edges.digitize(radius)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digitize_matches_first_greater_edge_rule() {
        let edges = BinEdges::new(vec![0.0, 30.0, 60.0, 90.0]).unwrap();
        assert_eq!(edges.digitize_one(15.0), 1);
        assert_eq!(edges.digitize_one(45.0), 2);
        assert_eq!(edges.digitize_one(89.9), 3);
    }

    #[test]
    fn digitize_boundaries() {
        let edges = BinEdges::new(vec![0.0, 30.0, 60.0, 90.0]).unwrap();
        // Below the first edge.
        assert_eq!(edges.digitize_one(-1.0), 0);
        // Exactly on an edge belongs to the bin above it.
        assert_eq!(edges.digitize_one(30.0), 2);
        // At or past the last edge: overflow id.
        assert_eq!(edges.digitize_one(90.0), 4);
        assert_eq!(edges.digitize_one(1e6), 4);
    }

    #[test]
    fn digitize_is_deterministic() {
        let edges = default_angle_edges();
        let values = [0.0, 3.0, 44.4, 89.99, 90.0];
        assert_eq!(edges.digitize(&values), edges.digitize(&values));
    }

    #[test]
    fn rejects_non_ascending_edges() {
        assert_eq!(BinEdges::new(vec![]), Err(BinError::EmptyEdges));
        assert_eq!(
            BinEdges::new(vec![0.0, 10.0, 10.0]),
            Err(BinError::NotAscending {
                index: 2,
                value: 10.0
            })
        );
        assert!(BinEdges::new(vec![0.0, 5.0, 2.0]).is_err());
    }

    #[test]
    fn default_grids_cover_the_stated_domains() {
        let angle = default_angle_edges();
        assert_eq!(angle.len(), 30);
        assert_eq!(angle.as_slice()[0], 3.0);
        assert_eq!(*angle.as_slice().last().unwrap(), 90.0);

        let radius = default_radius_edges();
        assert_eq!(radius.len(), 31);
        assert_eq!(radius.as_slice()[0], 0.0);
        assert_eq!(*radius.as_slice().last().unwrap(), 150.0);

        // 0° falls in the first angle bin, 149.9 kpc in the last radius bin.
        assert_eq!(angle.digitize_one(0.0), 0);
        assert_eq!(radius.digitize_one(149.9), 30);
    }

    #[test]
    fn centers_are_bin_midpoints() {
        let angle = default_angle_edges();
        let centers = angle.centers(0.0);
        assert_eq!(centers.len(), 30);
        assert_eq!(centers[0], 1.5);
        assert_eq!(centers[1], 4.5);
        assert_eq!(centers[29], 88.5);
    }

    #[test]
    fn assign_bins_rejects_mismatched_axes() {
        let a = default_angle_edges();
        let r = default_radius_edges();
        let err = assign_bins(&[1.0, 2.0], &[10.0], &a, &r).unwrap_err();
        assert_eq!(err, BinError::AxisLengthMismatch { angle: 2, radius: 1 });
    }
}
