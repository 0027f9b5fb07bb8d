//! Proxmox VE API models and the GPU/mapping domain types built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ============================================================================
// Raw API types
// ============================================================================

/// A node descriptor from `GET nodes`.
///
/// Only the naming fields are read; status and resource usage are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeEntry {
    /// Node name (e.g., "pve1").
    pub node: Option<String>,
    /// Alternate name field used by some API versions.
    pub name: Option<String>,
}

impl NodeEntry {
    /// The usable name of this node, preferring `node` over `name`.
    #[must_use]
    pub fn usable_name(&self) -> Option<&str> {
        [self.node.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.is_empty())
    }
}

/// The two shapes the node collection is seen in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NodeListing {
    /// A bare array of node descriptors.
    Bare(Vec<NodeEntry>),
    /// An object wrapping the array under `nodes`.
    Wrapped {
        /// Node descriptors.
        #[serde(default)]
        nodes: Vec<NodeEntry>,
    },
}

/// A raw PCI device record from `GET nodes/{node}/hardware/pci`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PciDevice {
    /// Bus/slot/function path (e.g., "0000:01:00.0").
    pub id: Option<String>,
    /// PCI class code (e.g., "0x030000").
    pub class: Option<String>,
    /// Vendor id (e.g., "0x10de").
    pub vendor: Option<String>,
    /// Device id (e.g., "0x2204").
    pub device: Option<String>,
    /// Subsystem vendor id.
    pub subsystem_vendor: Option<String>,
    /// Subsystem device id.
    pub subsystem_device: Option<String>,
    /// IOMMU group, reported as a number (or -1 when ungrouped).
    #[serde(default, deserialize_with = "deserialize_iommu_group")]
    pub iommugroup: Option<String>,
    /// Human readable device name.
    pub device_name: Option<String>,
}

/// Accepts the IOMMU group as either a JSON number or a string.
fn deserialize_iommu_group<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ============================================================================
// Domain types
// ============================================================================

/// A PCI function identified as a GPU during one scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuDevice {
    /// Owning cluster node.
    pub node: String,
    /// Bus/slot/function path as reported by the node.
    pub pci_path: String,
    /// `0x`-prefixed vendor id.
    pub vendor_id: String,
    /// `0x`-prefixed device id.
    pub device_id: String,
    /// Subsystem vendor id, when reported.
    pub subsystem_vendor_id: Option<String>,
    /// Subsystem device id, when reported.
    pub subsystem_device_id: Option<String>,
    /// IOMMU group number as a string; empty when ungrouped.
    pub iommu_group: String,
    /// Reported device name.
    pub description: String,
    /// When this scan saw the device.
    pub last_seen: DateTime<Utc>,
    /// Zero-based position among GPUs on the same node.
    pub index: usize,
}

impl GpuDevice {
    /// Combined `subsystem-vendor:subsystem-device` id without `0x` prefixes,
    /// present only when both halves are reported.
    #[must_use]
    pub fn subsystem_id(&self) -> Option<String> {
        match (&self.subsystem_vendor_id, &self.subsystem_device_id) {
            (Some(vendor), Some(device)) => Some(format!("{vendor}:{device}").replace("0x", "")),
            _ => None,
        }
    }
}

/// One `map` value of a PCI resource mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// `vendor:device` without `0x` prefixes.
    pub id: String,
    /// IOMMU group.
    pub iommu_group: String,
    /// Node the device lives on.
    pub node: String,
    /// PCI path on that node.
    pub path: String,
    /// `subvendor:subdevice`, when known.
    pub subsystem_id: Option<String>,
}

impl MappingEntry {
    /// Build the entry describing `device`.
    #[must_use]
    pub fn from_device(device: &GpuDevice) -> Self {
        let vendor = device.vendor_id.replace("0x", "");
        let dev = device.device_id.replace("0x", "");

        Self {
            id: format!("{vendor}:{dev}"),
            iommu_group: device.iommu_group.clone(),
            node: device.node.clone(),
            path: device.pci_path.clone(),
            subsystem_id: device.subsystem_id(),
        }
    }
}

impl std::fmt::Display for MappingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "id={},iommugroup={},node={},path={}",
            self.id, self.iommu_group, self.node, self.path
        )?;
        if let Some(subsystem_id) = &self.subsystem_id {
            write!(f, ",subsystem-id={subsystem_id}")?;
        }
        Ok(())
    }
}

/// A cluster-level PCI resource mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PciMapping {
    /// Mapping id.
    pub id: String,
    /// Physical device locations.
    pub entries: Vec<MappingEntry>,
}

impl PciMapping {
    /// Build a mapping covering `devices`.
    #[must_use]
    pub fn new(id: impl Into<String>, devices: &[GpuDevice]) -> Self {
        Self {
            id: id.into(),
            entries: devices.iter().map(MappingEntry::from_device).collect(),
        }
    }

    /// Rendered entry strings, in order.
    #[must_use]
    pub fn entry_strings(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Form fields for `POST cluster/mapping/pci`: `id` then one `map` per entry.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        std::iter::once(("id".to_string(), self.id.clone()))
            .chain(
                self.entry_strings()
                    .into_iter()
                    .map(|entry| ("map".to_string(), entry)),
            )
            .collect()
    }
}
