//! Mapping-name synthesis and the delete-then-create mapping upsert.

use tracing::{info, warn};

use crate::api::ClusterApi;
use crate::error::MapperError;
use crate::models::{GpuDevice, PciMapping};

/// Collection path of cluster PCI mappings.
pub const MAPPING_PATH: &str = "cluster/mapping/pci";

/// Normalize a device description into a mapping-id slug.
///
/// Drops `[` and `]`, turns spaces, colons and hyphens into underscores, and
/// lowercases the result.
#[must_use]
pub fn slugify(description: &str) -> String {
    description
        .chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .map(|c| if matches!(c, ' ' | ':' | '-') { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Mapping id for a GPU: `gpu-<vendor><device>-<slug>-<index + 1>`.
#[must_use]
pub fn mapping_name(vendor_id: &str, device_id: &str, description: &str, index: usize) -> String {
    format!(
        "gpu-{}{}-{}-{}",
        strip_hex_prefix(vendor_id),
        strip_hex_prefix(device_id),
        slugify(description),
        index + 1
    )
}

/// Mapping id for a discovered device.
#[must_use]
pub fn mapping_name_for(device: &GpuDevice) -> String {
    mapping_name(
        &device.vendor_id,
        &device.device_id,
        &device.description,
        device.index,
    )
}

fn strip_hex_prefix(id: &str) -> &str {
    id.strip_prefix("0x").unwrap_or(id)
}

/// Replace the mapping `mapping.id` with `mapping`.
///
/// Any existing mapping of that id is deleted first. A failed delete (usually
/// because nothing existed) is logged and the create is still attempted.
///
/// # Errors
/// Returns the API error of the create call.
pub async fn upsert_mapping(api: &dyn ClusterApi, mapping: &PciMapping) -> Result<(), MapperError> {
    info!(mapping_id = %mapping.id, "Creating GPU mapping");

    match api.delete(&format!("{MAPPING_PATH}/{}", mapping.id)).await {
        Ok(_) => info!(mapping_id = %mapping.id, "Deleted existing mapping"),
        Err(e) => info!(
            mapping_id = %mapping.id,
            error = %e,
            "No existing mapping found, proceeding to create a new one"
        ),
    }

    for entry in mapping.entry_strings() {
        info!(mapping_id = %mapping.id, entry = %entry, "Adding mapping");
    }

    api.post_form(MAPPING_PATH, mapping.form_fields()).await?;

    info!(
        mapping_id = %mapping.id,
        devices = mapping.entries.len(),
        "Created mapping"
    );
    Ok(())
}

/// [`upsert_mapping`] for a single device, logging failures with the
/// attempted entries. Returns whether the mapping was created.
pub async fn map_device(api: &dyn ClusterApi, device: &GpuDevice) -> bool {
    let mapping = PciMapping::new(mapping_name_for(device), std::slice::from_ref(device));

    match upsert_mapping(api, &mapping).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                mapping_id = %mapping.id,
                error = %e,
                entries = ?mapping.entry_strings(),
                "Error creating mapping"
            );
            false
        }
    }
}
