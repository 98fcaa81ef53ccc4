//! Resiliency configuration hierarchy.
//!
//! # Responsibility
//! - Model groups, server groups, servers and their logical/physical devices.
//! - Express the polymorphic families as closed, tagged discriminators.
//!
//! # Invariants
//! - `strategy_type` agrees along group -> server group -> server.
//! - The disk/NIC `type` discriminator matches the table the row lives in.

use super::record::{EntityId, Record};
use serde::{Deserialize, Serialize};

/// Resiliency strategy shared by a group and everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Paired unsynchronized failover.
    Ufr,
    /// Fault-tolerant lockstep pair.
    Ft,
    /// N-way managed cluster.
    Nm,
}

impl StrategyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ufr => "ufr",
            Self::Ft => "ft",
            Self::Nm => "nm",
        }
    }

    /// Whether `side` is a legal `resiliency_id` for this strategy.
    pub fn accepts_side(self, side: i64) -> bool {
        match self {
            Self::Ufr | Self::Ft => (1..=2).contains(&side),
            Self::Nm => side >= 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskType {
    Logical,
    Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NicType {
    Logical,
    /// Physical NIC bound to a port.
    Port,
}

fn logical_disk() -> DiskType {
    DiskType::Logical
}

fn physical_disk() -> DiskType {
    DiskType::Physical
}

fn logical_nic() -> NicType {
    NicType::Logical
}

fn port_nic() -> NicType {
    NicType::Port
}

/// Top-level configuration unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencyGroup {
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
    pub description: Option<String>,
    pub strategy_type: StrategyType,
    /// External orchestration stack.
    pub stack_id: Option<String>,
}

/// Pair (ufr/ft) or cluster (nm) of servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencyServerGroup {
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
    pub description: Option<String>,
    pub strategy_type: StrategyType,
    pub resiliency_group_id: Option<EntityId>,
}

/// One member instance of a server group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencyServer {
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
    pub description: Option<String>,
    pub strategy_type: StrategyType,
    /// External compute instance.
    pub instance_id: Option<String>,
    /// Side of the server within its group.
    pub resiliency_id: Option<i64>,
    #[serde(default)]
    pub is_recovery: bool,
    pub target_recovery_hypervisor_id: Option<String>,
    #[serde(default)]
    pub was_relocated: bool,
    pub affinity: Option<String>,
    /// Server that replaced this one.
    pub replacement_resiliency_server_id: Option<EntityId>,
    pub resiliency_server_group_id: Option<EntityId>,
}

/// Disk declared once for a whole server group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencyDiskLogical {
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default = "logical_disk")]
    pub disk_type: DiskType,
    pub disk_id: Option<i64>,
    pub disk_size: Option<String>,
    pub resiliency_server_group_id: EntityId,
}

/// Concrete disk bound to one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencyDisk {
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default = "physical_disk")]
    pub disk_type: DiskType,
    pub disk_size: Option<String>,
    pub volume_id: Option<String>,
    pub resiliency_id: Option<i64>,
    pub resiliency_server_id: EntityId,
    /// Logical disk this one realizes, once known.
    pub resiliency_disk_logical_id: Option<EntityId>,
}

/// NIC declared once for a whole server group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencyNicLogical {
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default = "logical_nic")]
    pub nic_type: NicType,
    pub nic_id: Option<i64>,
    /// Free-floating port reserved for the group.
    pub port_id: Option<String>,
    pub resiliency_server_group_id: EntityId,
}

/// Concrete NIC bound to one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencyNic {
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default = "port_nic")]
    pub nic_type: NicType,
    pub port_id: Option<String>,
    pub resiliency_server_id: EntityId,
    pub resiliency_nic_logical_id: Option<EntityId>,
}
