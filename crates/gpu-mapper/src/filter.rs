//! GPU classification of raw PCI records.

use chrono::Utc;
use tracing::debug;

use crate::models::{GpuDevice, PciDevice};

/// PCI vendor ids treated as GPU vendors (NVIDIA, Intel).
pub const GPU_VENDOR_IDS: [&str; 2] = ["0x10de", "0x8086"];

/// PCI class prefix of display controllers.
pub const DISPLAY_CLASS_PREFIX: &str = "0x03";

/// Description used when a device reports no name.
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Whether a raw PCI record is a GPU from a known vendor.
#[must_use]
pub fn is_gpu(device: &PciDevice) -> bool {
    let known_vendor = device
        .vendor
        .as_deref()
        .is_some_and(|vendor| GPU_VENDOR_IDS.contains(&vendor));
    let display_class = device
        .class
        .as_deref()
        .is_some_and(|class| class.starts_with(DISPLAY_CLASS_PREFIX));

    known_vendor && display_class
}

/// Keep the GPUs in `devices`, indexing them in discovery order from 0.
#[must_use]
pub fn filter_gpus(node: &str, devices: &[PciDevice]) -> Vec<GpuDevice> {
    let last_seen = Utc::now();

    devices
        .iter()
        .filter(|device| is_gpu(device))
        .enumerate()
        .map(|(index, device)| {
            let description = device
                .device_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string());
            debug!(node = %node, device = %description, index, "Found GPU device");

            GpuDevice {
                node: node.to_string(),
                pci_path: device.id.clone().unwrap_or_default(),
                vendor_id: device.vendor.clone().unwrap_or_default(),
                device_id: device.device.clone().unwrap_or_default(),
                subsystem_vendor_id: non_empty(device.subsystem_vendor.as_deref()),
                subsystem_device_id: non_empty(device.subsystem_device.as_deref()),
                iommu_group: device.iommugroup.clone().unwrap_or_default(),
                description,
                last_seen,
                index,
            }
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
