//! Scan-and-map orchestration.
//!
//! One run walks every node in order, collects the GPUs each reports, and
//! writes one PCI mapping per GPU. Every step fails locally: a node or device
//! that errors is logged and skipped, never aborting the rest of the run.

use tracing::{info, warn};

use crate::api::ClusterApi;
use crate::discovery::{list_nodes, try_fetch_pci_devices};
use crate::filter::filter_gpus;
use crate::mapping::{map_device, mapping_name_for};
use crate::models::{GpuDevice, PciMapping};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every discovered GPU was processed.
    Completed,
    /// The node list could not be fetched.
    NodeListFailed,
    /// The cluster reported no nodes.
    NoNodes,
    /// No node reported a GPU.
    NoGpus,
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::NodeListFailed => write!(f, "node_list_failed"),
            Self::NoNodes => write!(f, "no_nodes"),
            Self::NoGpus => write!(f, "no_gpus"),
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// How the run ended.
    pub outcome: ScanOutcome,
    /// Nodes returned by the node listing.
    pub nodes_listed: usize,
    /// Nodes whose PCI inventory was fetched.
    pub nodes_scanned: usize,
    /// GPUs found across all nodes.
    pub gpus_found: usize,
    /// Mappings written (or logged, in dry-run mode).
    pub mappings_created: usize,
    /// Mappings whose create call failed.
    pub mappings_failed: usize,
}

impl ScanReport {
    fn new(outcome: ScanOutcome) -> Self {
        Self {
            outcome,
            nodes_listed: 0,
            nodes_scanned: 0,
            gpus_found: 0,
            mappings_created: 0,
            mappings_failed: 0,
        }
    }
}

/// Discovers GPUs across a cluster and registers them as PCI mappings.
pub struct GpuMapper<'a> {
    api: &'a dyn ClusterApi,
    dry_run: bool,
}

impl<'a> GpuMapper<'a> {
    /// Create a mapper over `api`.
    #[must_use]
    pub fn new(api: &'a dyn ClusterApi) -> Self {
        Self {
            api,
            dry_run: false,
        }
    }

    /// Only log the mappings that would be written.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Collect the GPUs of every node, keeping node order. Nodes without
    /// GPUs, or whose inventory cannot be fetched, are left out.
    async fn discover(
        &self,
        nodes: &[String],
        report: &mut ScanReport,
    ) -> Vec<(String, Vec<GpuDevice>)> {
        let mut gpus_per_node = Vec::new();

        for node in nodes {
            info!(node = %node, "Processing node");
            let pci_devices = match try_fetch_pci_devices(self.api, node).await {
                Ok(devices) => devices,
                Err(e) => {
                    warn!(node = %node, error = %e, "Error fetching PCI devices");
                    continue;
                }
            };
            report.nodes_scanned += 1;

            let gpus = filter_gpus(node, &pci_devices);

            if gpus.is_empty() {
                info!(node = %node, "No GPUs found on node");
            } else {
                info!(node = %node, count = gpus.len(), "Found GPUs on node");
                gpus_per_node.push((node.clone(), gpus));
            }
        }

        gpus_per_node
    }

    /// Run a full scan and map pass.
    pub async fn scan_and_map(&self) -> ScanReport {
        info!(
            dry_run = self.dry_run,
            "Starting GPU scanning and mapping process"
        );

        let nodes = match list_nodes(self.api).await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(error = %e, "Error listing cluster nodes");
                return ScanReport::new(ScanOutcome::NodeListFailed);
            }
        };

        if nodes.is_empty() {
            info!("No nodes found in the cluster");
            return ScanReport::new(ScanOutcome::NoNodes);
        }

        let mut report = ScanReport::new(ScanOutcome::Completed);
        report.nodes_listed = nodes.len();
        let gpus_per_node = self.discover(&nodes, &mut report).await;

        if gpus_per_node.is_empty() {
            info!("No GPUs found in the cluster");
            report.outcome = ScanOutcome::NoGpus;
            return report;
        }

        for gpu in gpus_per_node.iter().flat_map(|(_, gpus)| gpus) {
            report.gpus_found += 1;

            if self.dry_run {
                let mapping = PciMapping::new(mapping_name_for(gpu), std::slice::from_ref(gpu));
                info!(
                    mapping_id = %mapping.id,
                    entries = ?mapping.entry_strings(),
                    "Dry run, skipping mapping"
                );
                report.mappings_created += 1;
                continue;
            }

            if map_device(self.api, gpu).await {
                report.mappings_created += 1;
            } else {
                report.mappings_failed += 1;
            }
        }

        info!(
            outcome = %report.outcome,
            nodes_listed = report.nodes_listed,
            nodes_scanned = report.nodes_scanned,
            gpus = report.gpus_found,
            created = report.mappings_created,
            failed = report.mappings_failed,
            "GPU scanning and mapping finished"
        );
        report
    }
}
