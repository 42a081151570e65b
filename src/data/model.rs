use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Logical coordinate domain
// ---------------------------------------------------------------------------

/// Data-space range of both axes. The plot maps pixels into this rectangle
/// regardless of on-screen size.
pub const DOMAIN_MIN: f64 = 0.0;
pub const DOMAIN_MAX: f64 = 10.0;

/// Reserved label meaning "not assigned to any cluster".
pub const NOISE_LABEL: i32 = -1;

// ---------------------------------------------------------------------------
// Point – one sample placed on the surface
// ---------------------------------------------------------------------------

/// A 2D sample. Wire format is `[x, y]`, matching the server contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f64, pub f64);

impl Point {
    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }

    /// Whether the point lies inside the logical domain (inclusive).
    pub fn in_domain(&self) -> bool {
        (DOMAIN_MIN..=DOMAIN_MAX).contains(&self.0) && (DOMAIN_MIN..=DOMAIN_MAX).contains(&self.1)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.0, self.1)
    }
}

// ---------------------------------------------------------------------------
// StepSnapshot / StepHistory – one algorithm run, iteration by iteration
// ---------------------------------------------------------------------------

/// One recorded iteration of a clustering run.
///
/// `labels` is aligned 1:1 by position with the point set the run was issued
/// for; `-1` marks noise. `centroids` is present only for centroid-based
/// algorithms. A snapshot with neither renders bare points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<i32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroids: Option<Vec<Point>>,

    /// Sum of squared distances to centroids, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inertia: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
}

/// Ordered snapshots of one run. Replaced wholesale, never mutated in place.
pub type StepHistory = Vec<StepSnapshot>;

// ---------------------------------------------------------------------------
// Algorithm selection and parameters
// ---------------------------------------------------------------------------

/// Server-side clustering algorithms the simulator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    KMeans,
    Dbscan,
    Forel,
    Agglomerative,
    MeanShift,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::KMeans,
        Algorithm::Dbscan,
        Algorithm::Forel,
        Algorithm::Agglomerative,
        Algorithm::MeanShift,
    ];

    /// Identifier used in the request body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::KMeans => "kmeans",
            Algorithm::Dbscan => "dbscan",
            Algorithm::Forel => "forel",
            Algorithm::Agglomerative => "agglomerative",
            Algorithm::MeanShift => "meanshift",
        }
    }

    /// Human-readable name for the selector widget.
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::KMeans => "K-Means",
            Algorithm::Dbscan => "DBSCAN",
            Algorithm::Forel => "FOREL",
            Algorithm::Agglomerative => "Agglomerative",
            Algorithm::MeanShift => "Mean-Shift",
        }
    }

    /// Only the hierarchical algorithm has a dendrogram to show.
    pub fn has_dendrogram(&self) -> bool {
        matches!(self, Algorithm::Agglomerative)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-algorithm parameters as the server expects them. Values are sent
/// as-is; range validation is the server's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AlgorithmParams {
    KMeans {
        k: u32,
    },
    Dbscan {
        eps: f64,
        #[serde(rename = "minPts")]
        min_pts: u32,
    },
    Forel {
        radius: f64,
    },
    Agglomerative {
        k: u32,
    },
    MeanShift {
        bandwidth: f64,
    },
}

// ---------------------------------------------------------------------------
// Dendrogram – paired branch coordinate lists
// ---------------------------------------------------------------------------

/// Dendrogram geometry as returned by the server: one `icoord`/`dcoord`
/// pair of coordinate lists per branch segment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dendrogram {
    pub icoord: Vec<Vec<f64>>,
    pub dcoord: Vec<Vec<f64>>,
}

impl Dendrogram {
    /// Branch segments as `(xs, ys)` pairs. Mismatched list lengths yield
    /// the common prefix rather than an error.
    pub fn segments(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        self.icoord
            .iter()
            .zip(self.dcoord.iter())
            .map(|(xs, ys)| (xs.as_slice(), ys.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.icoord.is_empty() || self.dcoord.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
