//! Cluster prediction command

use anyhow::{Context, Result};
use forecast_lib::cluster::{ClusterAssignment, ClusterModel, VmProfile};
use std::path::Path;
use tracing::info;

use crate::output::print_json;

/// Assign a VM profile to a cluster and print `{clusterLabel, message}`
pub fn predict_cluster(model_path: &Path, profile: &VmProfile) -> Result<()> {
    let model = ClusterModel::load(model_path).context("Error loading cluster model")?;
    let label = model.predict(profile).context("Prediction error")?;
    info!(cluster = label.index(), "Cluster predicted");

    print_json(&ClusterAssignment::from(label))
}
