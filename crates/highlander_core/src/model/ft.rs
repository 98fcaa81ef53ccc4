//! FT telemetry tree mirrored from the fault-tolerance subsystem.
//!
//! Every node stores a free-form `state` document plus typed telemetry
//! fields, and points at its parent by id. Rows record last-known state;
//! nothing here is user-authored configuration.

use super::record::{EntityId, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Root of the tree, one per live ft server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtPvm {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub resiliency_server_id: EntityId,
    pub name: Option<String>,
    pub ax_removal_pending: Option<bool>,
    pub device_affinity: Option<bool>,
    pub force_boot_override: Option<bool>,
    pub ft_protected: Option<bool>,
    pub host1_version: Option<String>,
    pub host2_version: Option<String>,
    pub preferred_ax: Option<i64>,
    pub product_name: Option<String>,
    pub protection_mode: Option<String>,
    pub remote_ax_visible: Option<bool>,
    pub version: Option<String>,
    pub previous_state_change_date_time: Option<i64>,
    pub automated_recovery: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtGuestOs {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_pvm_id: EntityId,
    pub auto_resynch: Option<bool>,
    pub auto_start: Option<bool>,
    pub currently_capable_of_online_migration: Option<bool>,
    pub synch_idle_timer: Option<i64>,
    pub synch_idle_timer_limits: Option<JsonValue>,
}

/// Guest-visible logical disk and its mirror-copy progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtLDisk {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_guest_os_id: EntityId,
    pub pci_bus: Option<String>,
    pub pci_domain: Option<String>,
    pub pci_function: Option<String>,
    pub pci_slot: Option<String>,
    pub boot_device: Option<bool>,
    pub sector_size: Option<i64>,
    pub total_num_sectors: Option<i64>,
    pub mirror_copy_state: Option<String>,
    pub mirror_copy_source: Option<i64>,
    pub mirror_copy_target: Option<i64>,
    pub capacity: Option<i64>,
    pub percent_complete: Option<i64>,
    pub mirror_copy_rate: Option<i64>,
    pub mirror_copy_type: Option<String>,
    pub ldisk_id: Option<i64>,
    pub ldisk_type: Option<String>,
    pub resiliency_disk_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtLNic {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_guest_os_id: EntityId,
    pub pci_bus: Option<String>,
    pub pci_domain: Option<String>,
    pub pci_function: Option<String>,
    pub pci_slot: Option<String>,
    pub lnic_id: Option<i64>,
    pub desired_ip: Option<String>,
    pub resiliency_nic_id: Option<EntityId>,
}

/// Inter-host link of a PVM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtALink {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_pvm_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtPath {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_alink_id: EntityId,
    pub path_id: Option<i64>,
}

/// Quorum service and host election state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtQuorum {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_pvm_id: EntityId,
    pub quorum_service_enabled: Option<bool>,
    pub boot_blocked: Option<bool>,
    pub boot_blocked_reason: Option<String>,
    pub join_blocked: Option<bool>,
    pub join_blocked_reason: Option<String>,
    pub elected_host_name: Option<String>,
    pub elected_host_ip_address: Option<String>,
    pub preferred_host_name: Option<String>,
    pub preferred_host_ip_address: Option<String>,
    pub alternate_host_name: Option<String>,
    pub alternate_host_ip_address: Option<String>,
    pub enabled: Option<bool>,
    pub preferred_host_port: Option<i64>,
    pub alternate_host_port: Option<i64>,
    pub suppress_degraded_pvm: Option<bool>,
}

/// One quorum link; `(ft_quorum_id, qlink_id, which)` is unique while live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtQLink {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_quorum_id: EntityId,
    pub qlink_id: Option<i64>,
    pub which: Option<String>,
}

/// Host-side view of one side of the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtAx {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_pvm_id: EntityId,
    pub auto_start: Option<bool>,
    pub ax_id: Option<i64>,
    pub init_interval: Option<i64>,
    pub offline_mode: Option<bool>,
    pub remote_ax_status: Option<String>,
    pub scrub_interval: Option<i64>,
    pub scrub_switch: Option<bool>,
    pub sw_revision: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtGuest {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_ax_id: EntityId,
    pub auto_synch: Option<bool>,
    pub auto_boot: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtDisk {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_ax_id: EntityId,
    pub capacity: Option<i64>,
    pub mirrored: Option<bool>,
    pub virtual_disk: Option<bool>,
    pub ax_access: Option<bool>,
    pub sector_size: Option<i64>,
    pub number_of_sectors: Option<i64>,
    pub immigrant: Option<bool>,
    pub scrub_switch: Option<bool>,
    pub ft_scrub_status: Option<JsonValue>,
    pub enabled: Option<bool>,
    pub zbc_switch: Option<bool>,
    pub ft_zbc_status: Option<JsonValue>,
    pub disk_type: Option<String>,
    pub previous_state_change_date_time: Option<i64>,
    pub ft_ldisk_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtNic {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_ax_id: EntityId,
    pub ft_ip_config: Option<JsonValue>,
    pub ft_remote_ip_config: Option<JsonValue>,
    pub device_name: Option<String>,
    pub enabled: Option<bool>,
    pub mac: Option<String>,
    pub network_bridge: Option<String>,
    pub ft_lnic_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtLinkA {
    #[serde(flatten)]
    pub record: Record,
    pub state: Option<JsonValue>,
    pub ft_ax_id: EntityId,
    pub adapter_id: Option<i64>,
    pub adapter_name: Option<String>,
    pub ft_ip_config: Option<JsonValue>,
    pub ft_remote_ip_config: Option<JsonValue>,
}
