//! GPU PCI mapping for Proxmox VE clusters.
//!
//! This crate discovers GPU-class PCI devices on every node of a Proxmox VE
//! cluster and registers each one as a cluster PCI resource mapping, so VMs
//! can pass GPUs through by mapping id instead of bus address.
//!
//! ## Flow
//!
//! ```text
//! GET nodes
//!   └─ per node: GET nodes/{node}/hardware/pci
//!        └─ keep vendor 0x10de / 0x8086 with class 0x03xxxx
//!             └─ per GPU: DELETE cluster/mapping/pci/{id}
//!                         POST   cluster/mapping/pci  (id, map)
//! ```
//!
//! Mapping ids look like `gpu-10de2204-ga102_geforce_rtx_3090-1`.
//!
//! ## Example
//!
//! ```ignore
//! use gpu_mapper::{GpuMapper, MapperConfig, ProxmoxClient};
//!
//! let config = MapperConfig::from_parts(url, token_id, token_value, "false")?;
//! let client = ProxmoxClient::new(&config)?;
//! let report = GpuMapper::new(&client).scan_and_map().await;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod mapping;
pub mod models;
pub mod scanner;

pub use api::{ClusterApi, RequestBody};
pub use client::ProxmoxClient;
pub use config::MapperConfig;
pub use error::MapperError;
pub use models::{GpuDevice, MappingEntry, PciDevice, PciMapping};
pub use scanner::{GpuMapper, ScanOutcome, ScanReport};
