//! Node and PCI inventory discovery.

use serde_json::Value;
use tracing::{info, warn};

use crate::api::ClusterApi;
use crate::error::MapperError;
use crate::models::{NodeListing, PciDevice};

/// Turn a `GET nodes` payload into node names.
///
/// Accepts a bare array or an object with a `nodes` array. Entries without a
/// usable `node` or `name` are skipped; any other shape yields no nodes.
#[must_use]
pub fn normalize_node_list(payload: Value) -> Vec<String> {
    let entries = match serde_json::from_value::<NodeListing>(payload) {
        Ok(NodeListing::Bare(entries) | NodeListing::Wrapped { nodes: entries }) => entries,
        Err(e) => {
            warn!(error = %e, "Unrecognized node list payload");
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| entry.usable_name().map(str::to_string))
        .collect()
}

/// List the names of all cluster nodes.
///
/// # Errors
/// Returns the API error if the node collection cannot be fetched.
pub async fn list_nodes(api: &dyn ClusterApi) -> Result<Vec<String>, MapperError> {
    let payload = api.get("nodes").await?;
    Ok(normalize_node_list(payload))
}

/// Fetch the raw PCI inventory of `node`, reporting request failures.
///
/// A payload that is not a non-empty array counts as no PCI data. Records
/// that fail to decode are logged and skipped; the rest are kept.
///
/// # Errors
/// Returns the API error if the inventory cannot be fetched.
pub async fn try_fetch_pci_devices(
    api: &dyn ClusterApi,
    node: &str,
) -> Result<Vec<PciDevice>, MapperError> {
    info!(node = %node, "Fetching PCI devices");

    let records = match api.get(&format!("nodes/{node}/hardware/pci")).await? {
        Value::Array(records) if !records.is_empty() => records,
        _ => {
            info!(node = %node, "No PCI data found");
            return Ok(Vec::new());
        }
    };

    let total = records.len();
    let devices: Vec<PciDevice> = records
        .into_iter()
        .enumerate()
        .filter_map(|(position, record)| match serde_json::from_value::<PciDevice>(record) {
            Ok(device) => Some(device),
            Err(e) => {
                warn!(node = %node, position, error = %e, "Skipping undecodable PCI record");
                None
            }
        })
        .collect();

    info!(
        node = %node,
        count = devices.len(),
        skipped = total - devices.len(),
        "Found PCI devices"
    );
    Ok(devices)
}

/// Fetch the raw PCI inventory of `node`.
///
/// Failures are logged and reported as an empty inventory so one bad node
/// never stops the scan of its siblings.
pub async fn fetch_pci_devices(api: &dyn ClusterApi, node: &str) -> Vec<PciDevice> {
    match try_fetch_pci_devices(api, node).await {
        Ok(devices) => devices,
        Err(e) => {
            warn!(node = %node, error = %e, "Error fetching PCI devices");
            Vec::new()
        }
    }
}
