//! VM profile clustering with a pre-trained KMeans model
//!
//! Scoring derives the ratio features, scales them and assigns the nearest
//! centroid.
//!
//! # Model format
//!
//! A fitted scikit-learn `StandardScaler` + `KMeans` pair is exported as one
//! JSON document. `scaler.mean` and `scaler.scale` are the scaler's `mean_`
//! and `scale_`, `centroids` is the KMeans `cluster_centers_` (already in
//! scaled space). Every vector has one entry per name in [`FEATURE_NAMES`],
//! in that order:
//!
//! ```json
//! {
//!   "scaler": {
//!     "mean":  [8192.0, 8192.0, 2048.0, 4.0, 2.0, 2.0, 51200.0, 0.25, 2.0, 6.25],
//!     "scale": [4096.0, 4096.0, 1024.0, 2.0, 1.0, 1.0, 25600.0, 0.10, 1.0, 3.00]
//!   },
//!   "centroids": [
//!     [-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0],
//!     [ 0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0],
//!     [ 1.5,  1.5,  1.5,  1.5,  1.5,  1.5,  1.5,  1.5,  1.5,  1.5]
//!   ]
//! }
//! ```
//!
//! ```python
//! json.dump({"scaler": {"mean": scaler.mean_.tolist(), "scale": scaler.scale_.tolist()},
//!            "centroids": kmeans.cluster_centers_.tolist()}, f)
//! ```

use crate::error::ClusterError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feature names in model input order
pub const FEATURE_NAMES: [&str; 10] = [
    "Memory",
    "Provisioned_MiB",
    "In_Use_MiB",
    "CPU_Count",
    "CPU_Sockets",
    "CPU_CoresPerSocket",
    "Capacity_MiB",
    "Used_Memory_Ratio",
    "CPU_per_Socket",
    "Disk_Usage_Ratio",
];

/// Raw VM inventory attributes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VmProfile {
    pub cpu: f64,
    pub memory: f64,
    pub nics: f64,
    pub disks: f64,
    pub in_use_mib: f64,
    pub sockets: f64,
    pub cores_per_socket: f64,
    pub capacity_mib: f64,
    pub provisioned_mib: f64,
}

impl VmProfile {
    /// Model input vector in `FEATURE_NAMES` order.
    ///
    /// NIC and disk counts are part of the inventory but not of the model.
    pub fn features(&self) -> [f64; 10] {
        let used_memory_ratio = ratio(self.in_use_mib, self.provisioned_mib);
        let cpu_per_socket = ratio(self.cpu, self.sockets);
        let disk_usage_ratio = ratio(self.capacity_mib, self.provisioned_mib);

        [
            self.memory,
            self.provisioned_mib,
            self.in_use_mib,
            self.cpu,
            self.sockets,
            self.cores_per_socket,
            self.capacity_mib,
            used_memory_ratio,
            cpu_per_socket,
            disk_usage_ratio,
        ]
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Cluster assigned to a VM profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterLabel {
    Cluster0,
    Cluster1,
    Cluster2,
    Unrecognized(usize),
}

impl ClusterLabel {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => ClusterLabel::Cluster0,
            1 => ClusterLabel::Cluster1,
            2 => ClusterLabel::Cluster2,
            other => ClusterLabel::Unrecognized(other),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ClusterLabel::Cluster0 => 0,
            ClusterLabel::Cluster1 => 1,
            ClusterLabel::Cluster2 => 2,
            ClusterLabel::Unrecognized(index) => *index,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ClusterLabel::Cluster0 => "Cluster 0",
            ClusterLabel::Cluster1 => "Cluster 1",
            ClusterLabel::Cluster2 => "Cluster 2",
            ClusterLabel::Unrecognized(_) => "Unrecognized cluster",
        }
    }
}

/// Cluster prediction output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAssignment {
    pub cluster_label: usize,
    pub message: String,
}

impl From<ClusterLabel> for ClusterAssignment {
    fn from(label: ClusterLabel) -> Self {
        Self {
            cluster_label: label.index(),
            message: label.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ClusterError> {
        if self.mean.len() != features.len() || self.scale.len() != features.len() {
            return Err(ClusterError::FeatureMismatch {
                expected: self.mean.len().min(self.scale.len()),
                found: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // zero-variance features are left unscaled
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// Pre-trained KMeans model with its input scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterModel {
    pub scaler: StandardScaler,
    pub centroids: Vec<Vec<f64>>,
}

impl ClusterModel {
    /// Load a model exported as JSON
    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ClusterError> {
        if self.centroids.is_empty() {
            return Err(ClusterError::NoCentroids);
        }
        let expected = FEATURE_NAMES.len();
        for len in [self.scaler.mean.len(), self.scaler.scale.len()]
            .into_iter()
            .chain(self.centroids.iter().map(Vec::len))
        {
            if len != expected {
                return Err(ClusterError::FeatureMismatch { expected, found: len });
            }
        }
        Ok(())
    }

    /// Assign the nearest centroid; the lowest index wins ties
    pub fn predict(&self, profile: &VmProfile) -> Result<ClusterLabel, ClusterError> {
        let scaled = self.scaler.transform(&profile.features())?;

        let mut best: Option<(usize, f64)> = None;
        for (index, centroid) in self.centroids.iter().enumerate() {
            let distance: f64 = centroid
                .iter()
                .zip(&scaled)
                .map(|(c, x)| (c - x).powi(2))
                .sum();
            match best {
                Some((_, current)) if distance >= current => {}
                _ => best = Some((index, distance)),
            }
        }

        best.map(|(index, _)| ClusterLabel::from_index(index))
            .ok_or(ClusterError::NoCentroids)
    }
}
