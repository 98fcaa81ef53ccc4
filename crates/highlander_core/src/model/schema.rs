//! Table metadata for every persisted entity kind.
//!
//! # Responsibility
//! - Enumerate the closed set of entity kinds and their tables.
//! - Describe columns, reference edges and default ordering per kind so the
//!   generic repository can build SQL without per-kind code.
//!
//! # Invariants
//! - Column lists mirror `db/migrations/*.sql` exactly (checked by tests).
//! - Every owning link targets the kind that exclusively owns the row.
//! - Column names are static identifiers; caller input never reaches SQL text.

/// Closed set of persisted entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    ResiliencyGroup,
    ResiliencyServerGroup,
    ResiliencyServer,
    ResiliencyDiskLogical,
    ResiliencyDisk,
    ResiliencyNicLogical,
    ResiliencyNic,
    FtPvm,
    FtGuestOs,
    FtLDisk,
    FtLNic,
    FtALink,
    FtPath,
    FtQuorum,
    FtQLink,
    FtAx,
    FtGuest,
    FtDisk,
    FtNic,
    FtLinkA,
}

/// Storage class of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    /// Stored as 0/1 integer.
    Bool,
    /// Stored as JSON text.
    Json,
}

/// One table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// Reference from one table column to another entity's `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub column: &'static str,
    pub target: EntityKind,
    /// Owning links drive cascade delete; plain links only require visibility.
    pub owning: bool,
}

/// Default list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    CreatedAt,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        ty: ColumnType::Text,
    }
}

const fn int(name: &'static str) -> Column {
    Column {
        name,
        ty: ColumnType::Integer,
    }
}

const fn flag(name: &'static str) -> Column {
    Column {
        name,
        ty: ColumnType::Bool,
    }
}

const fn json(name: &'static str) -> Column {
    Column {
        name,
        ty: ColumnType::Json,
    }
}

const fn owned_by(column: &'static str, target: EntityKind) -> Link {
    Link {
        column,
        target,
        owning: true,
    }
}

const fn refers_to(column: &'static str, target: EntityKind) -> Link {
    Link {
        column,
        target,
        owning: false,
    }
}

/// Envelope columns present on every table, in select order.
pub const ENVELOPE_COLUMNS: &[Column] = &[
    text("id"),
    text("scope"),
    text("project_id"),
    int("created_at"),
    int("updated_at"),
    int("deleted_at"),
];

const RESILIENCY_GROUP_COLUMNS: &[Column] = &[
    text("name"),
    text("description"),
    text("strategy_type"),
    text("stack_id"),
];

const RESILIENCY_SERVER_GROUP_COLUMNS: &[Column] = &[
    text("name"),
    text("description"),
    text("strategy_type"),
    text("resiliency_group_id"),
];

const RESILIENCY_SERVER_COLUMNS: &[Column] = &[
    text("name"),
    text("description"),
    text("strategy_type"),
    text("instance_id"),
    int("resiliency_id"),
    flag("is_recovery"),
    text("target_recovery_hypervisor_id"),
    flag("was_relocated"),
    text("affinity"),
    text("replacement_resiliency_server_id"),
    text("resiliency_server_group_id"),
];

const RESILIENCY_DISK_LOGICAL_COLUMNS: &[Column] = &[
    text("name"),
    text("description"),
    text("type"),
    int("disk_id"),
    text("disk_size"),
    text("resiliency_server_group_id"),
];

const RESILIENCY_DISK_COLUMNS: &[Column] = &[
    text("name"),
    text("description"),
    text("type"),
    text("disk_size"),
    text("volume_id"),
    int("resiliency_id"),
    text("resiliency_server_id"),
    text("resiliency_disk_logical_id"),
];

const RESILIENCY_NIC_LOGICAL_COLUMNS: &[Column] = &[
    text("name"),
    text("description"),
    text("type"),
    int("nic_id"),
    text("port_id"),
    text("resiliency_server_group_id"),
];

const RESILIENCY_NIC_COLUMNS: &[Column] = &[
    text("name"),
    text("description"),
    text("type"),
    text("port_id"),
    text("resiliency_server_id"),
    text("resiliency_nic_logical_id"),
];

const FT_PVM_COLUMNS: &[Column] = &[
    json("state"),
    text("resiliency_server_id"),
    text("name"),
    flag("ax_removal_pending"),
    flag("device_affinity"),
    flag("force_boot_override"),
    flag("ft_protected"),
    text("host1_version"),
    text("host2_version"),
    int("preferred_ax"),
    text("product_name"),
    text("protection_mode"),
    flag("remote_ax_visible"),
    text("version"),
    int("previous_state_change_date_time"),
    flag("automated_recovery"),
];

const FT_GUEST_OS_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_pvm_id"),
    flag("auto_resynch"),
    flag("auto_start"),
    flag("currently_capable_of_online_migration"),
    int("synch_idle_timer"),
    json("synch_idle_timer_limits"),
];

const FT_LDISK_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_guest_os_id"),
    text("pci_bus"),
    text("pci_domain"),
    text("pci_function"),
    text("pci_slot"),
    flag("boot_device"),
    int("sector_size"),
    int("total_num_sectors"),
    text("mirror_copy_state"),
    int("mirror_copy_source"),
    int("mirror_copy_target"),
    int("capacity"),
    int("percent_complete"),
    int("mirror_copy_rate"),
    text("mirror_copy_type"),
    int("ldisk_id"),
    text("ldisk_type"),
    text("resiliency_disk_id"),
];

const FT_LNIC_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_guest_os_id"),
    text("pci_bus"),
    text("pci_domain"),
    text("pci_function"),
    text("pci_slot"),
    int("lnic_id"),
    text("desired_ip"),
    text("resiliency_nic_id"),
];

const FT_ALINK_COLUMNS: &[Column] = &[json("state"), text("ft_pvm_id")];

const FT_PATH_COLUMNS: &[Column] = &[json("state"), text("ft_alink_id"), int("path_id")];

const FT_QUORUM_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_pvm_id"),
    flag("quorum_service_enabled"),
    flag("boot_blocked"),
    text("boot_blocked_reason"),
    flag("join_blocked"),
    text("join_blocked_reason"),
    text("elected_host_name"),
    text("elected_host_ip_address"),
    text("preferred_host_name"),
    text("preferred_host_ip_address"),
    text("alternate_host_name"),
    text("alternate_host_ip_address"),
    flag("enabled"),
    int("preferred_host_port"),
    int("alternate_host_port"),
    flag("suppress_degraded_pvm"),
];

const FT_QLINK_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_quorum_id"),
    int("qlink_id"),
    text("which"),
];

const FT_AX_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_pvm_id"),
    flag("auto_start"),
    int("ax_id"),
    int("init_interval"),
    flag("offline_mode"),
    text("remote_ax_status"),
    int("scrub_interval"),
    flag("scrub_switch"),
    text("sw_revision"),
];

const FT_GUEST_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_ax_id"),
    flag("auto_synch"),
    flag("auto_boot"),
];

const FT_DISK_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_ax_id"),
    int("capacity"),
    flag("mirrored"),
    flag("virtual_disk"),
    flag("ax_access"),
    int("sector_size"),
    int("number_of_sectors"),
    flag("immigrant"),
    flag("scrub_switch"),
    json("ft_scrub_status"),
    flag("enabled"),
    flag("zbc_switch"),
    json("ft_zbc_status"),
    text("disk_type"),
    int("previous_state_change_date_time"),
    text("ft_ldisk_id"),
];

const FT_NIC_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_ax_id"),
    json("ft_ip_config"),
    json("ft_remote_ip_config"),
    text("device_name"),
    flag("enabled"),
    text("mac"),
    text("network_bridge"),
    text("ft_lnic_id"),
];

const FT_LINKA_COLUMNS: &[Column] = &[
    json("state"),
    text("ft_ax_id"),
    int("adapter_id"),
    text("adapter_name"),
    json("ft_ip_config"),
    json("ft_remote_ip_config"),
];

const RESILIENCY_SERVER_GROUP_LINKS: &[Link] =
    &[owned_by("resiliency_group_id", EntityKind::ResiliencyGroup)];

const RESILIENCY_SERVER_LINKS: &[Link] = &[
    owned_by("resiliency_server_group_id", EntityKind::ResiliencyServerGroup),
    refers_to("replacement_resiliency_server_id", EntityKind::ResiliencyServer),
];

const SERVER_GROUP_CHILD_LINKS: &[Link] = &[owned_by(
    "resiliency_server_group_id",
    EntityKind::ResiliencyServerGroup,
)];

const RESILIENCY_DISK_LINKS: &[Link] = &[
    owned_by("resiliency_server_id", EntityKind::ResiliencyServer),
    refers_to("resiliency_disk_logical_id", EntityKind::ResiliencyDiskLogical),
];

const RESILIENCY_NIC_LINKS: &[Link] = &[
    owned_by("resiliency_server_id", EntityKind::ResiliencyServer),
    refers_to("resiliency_nic_logical_id", EntityKind::ResiliencyNicLogical),
];

const FT_PVM_LINKS: &[Link] = &[owned_by("resiliency_server_id", EntityKind::ResiliencyServer)];

const PVM_CHILD_LINKS: &[Link] = &[owned_by("ft_pvm_id", EntityKind::FtPvm)];

const FT_LDISK_LINKS: &[Link] = &[
    owned_by("ft_guest_os_id", EntityKind::FtGuestOs),
    refers_to("resiliency_disk_id", EntityKind::ResiliencyDisk),
];

const FT_LNIC_LINKS: &[Link] = &[
    owned_by("ft_guest_os_id", EntityKind::FtGuestOs),
    refers_to("resiliency_nic_id", EntityKind::ResiliencyNic),
];

const FT_PATH_LINKS: &[Link] = &[owned_by("ft_alink_id", EntityKind::FtALink)];

const FT_QLINK_LINKS: &[Link] = &[owned_by("ft_quorum_id", EntityKind::FtQuorum)];

const AX_CHILD_LINKS: &[Link] = &[owned_by("ft_ax_id", EntityKind::FtAx)];

const FT_DISK_LINKS: &[Link] = &[
    owned_by("ft_ax_id", EntityKind::FtAx),
    refers_to("ft_ldisk_id", EntityKind::FtLDisk),
];

const FT_NIC_LINKS: &[Link] = &[
    owned_by("ft_ax_id", EntityKind::FtAx),
    refers_to("ft_lnic_id", EntityKind::FtLNic),
];

impl EntityKind {
    /// Every kind, parents before children.
    pub const ALL: [EntityKind; 20] = [
        Self::ResiliencyGroup,
        Self::ResiliencyServerGroup,
        Self::ResiliencyServer,
        Self::ResiliencyDiskLogical,
        Self::ResiliencyDisk,
        Self::ResiliencyNicLogical,
        Self::ResiliencyNic,
        Self::FtPvm,
        Self::FtGuestOs,
        Self::FtLDisk,
        Self::FtLNic,
        Self::FtALink,
        Self::FtPath,
        Self::FtQuorum,
        Self::FtQLink,
        Self::FtAx,
        Self::FtGuest,
        Self::FtDisk,
        Self::FtNic,
        Self::FtLinkA,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::ResiliencyGroup => "resiliency_group",
            Self::ResiliencyServerGroup => "resiliency_server_group",
            Self::ResiliencyServer => "resiliency_server",
            Self::ResiliencyDiskLogical => "resiliency_disk_logical",
            Self::ResiliencyDisk => "resiliency_disk",
            Self::ResiliencyNicLogical => "resiliency_nic_logical",
            Self::ResiliencyNic => "resiliency_nic",
            Self::FtPvm => "ft_pvm",
            Self::FtGuestOs => "ft_guest_os",
            Self::FtLDisk => "ft_ldisk",
            Self::FtLNic => "ft_lnic",
            Self::FtALink => "ft_alink",
            Self::FtPath => "ft_path",
            Self::FtQuorum => "ft_quorum",
            Self::FtQLink => "ft_qlink",
            Self::FtAx => "ft_ax",
            Self::FtGuest => "ft_guest",
            Self::FtDisk => "ft_disk",
            Self::FtNic => "ft_nic",
            Self::FtLinkA => "ft_linka",
        }
    }

    /// Human-readable entity label used in error messages and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::ResiliencyGroup => "ResiliencyGroup",
            Self::ResiliencyServerGroup => "ResiliencyServerGroup",
            Self::ResiliencyServer => "ResiliencyServer",
            Self::ResiliencyDiskLogical => "ResiliencyDiskLogical",
            Self::ResiliencyDisk => "ResiliencyDisk",
            Self::ResiliencyNicLogical => "ResiliencyNicLogical",
            Self::ResiliencyNic => "ResiliencyNic",
            Self::FtPvm => "FTPvm",
            Self::FtGuestOs => "FTGuestOs",
            Self::FtLDisk => "FTLDisk",
            Self::FtLNic => "FTLNic",
            Self::FtALink => "FTALink",
            Self::FtPath => "FTPath",
            Self::FtQuorum => "FTQuorum",
            Self::FtQLink => "FTQLink",
            Self::FtAx => "FTAx",
            Self::FtGuest => "FTGuest",
            Self::FtDisk => "FTDisk",
            Self::FtNic => "FTNic",
            Self::FtLinkA => "FTLinkA",
        }
    }

    /// Entity-specific columns, excluding `ENVELOPE_COLUMNS`.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::ResiliencyGroup => RESILIENCY_GROUP_COLUMNS,
            Self::ResiliencyServerGroup => RESILIENCY_SERVER_GROUP_COLUMNS,
            Self::ResiliencyServer => RESILIENCY_SERVER_COLUMNS,
            Self::ResiliencyDiskLogical => RESILIENCY_DISK_LOGICAL_COLUMNS,
            Self::ResiliencyDisk => RESILIENCY_DISK_COLUMNS,
            Self::ResiliencyNicLogical => RESILIENCY_NIC_LOGICAL_COLUMNS,
            Self::ResiliencyNic => RESILIENCY_NIC_COLUMNS,
            Self::FtPvm => FT_PVM_COLUMNS,
            Self::FtGuestOs => FT_GUEST_OS_COLUMNS,
            Self::FtLDisk => FT_LDISK_COLUMNS,
            Self::FtLNic => FT_LNIC_COLUMNS,
            Self::FtALink => FT_ALINK_COLUMNS,
            Self::FtPath => FT_PATH_COLUMNS,
            Self::FtQuorum => FT_QUORUM_COLUMNS,
            Self::FtQLink => FT_QLINK_COLUMNS,
            Self::FtAx => FT_AX_COLUMNS,
            Self::FtGuest => FT_GUEST_COLUMNS,
            Self::FtDisk => FT_DISK_COLUMNS,
            Self::FtNic => FT_NIC_COLUMNS,
            Self::FtLinkA => FT_LINKA_COLUMNS,
        }
    }

    /// Reference columns of this kind.
    pub fn links(self) -> &'static [Link] {
        match self {
            Self::ResiliencyGroup => &[],
            Self::ResiliencyServerGroup => RESILIENCY_SERVER_GROUP_LINKS,
            Self::ResiliencyServer => RESILIENCY_SERVER_LINKS,
            Self::ResiliencyDiskLogical | Self::ResiliencyNicLogical => SERVER_GROUP_CHILD_LINKS,
            Self::ResiliencyDisk => RESILIENCY_DISK_LINKS,
            Self::ResiliencyNic => RESILIENCY_NIC_LINKS,
            Self::FtPvm => FT_PVM_LINKS,
            Self::FtGuestOs | Self::FtALink | Self::FtQuorum | Self::FtAx => PVM_CHILD_LINKS,
            Self::FtLDisk => FT_LDISK_LINKS,
            Self::FtLNic => FT_LNIC_LINKS,
            Self::FtPath => FT_PATH_LINKS,
            Self::FtQLink => FT_QLINK_LINKS,
            Self::FtGuest | Self::FtLinkA => AX_CHILD_LINKS,
            Self::FtDisk => FT_DISK_LINKS,
            Self::FtNic => FT_NIC_LINKS,
        }
    }

    /// The owning parent edge, if this kind has one.
    pub fn parent(self) -> Option<Link> {
        self.links().iter().copied().find(|link| link.owning)
    }

    /// Kinds owned by this kind, with the child column pointing back here.
    pub fn children(self) -> Vec<(EntityKind, &'static str)> {
        Self::ALL
            .iter()
            .flat_map(|kind| {
                kind.links()
                    .iter()
                    .filter(move |link| link.owning && link.target == self)
                    .map(move |link| (*kind, link.column))
            })
            .collect()
    }

    /// Telemetry kinds mirror external state and have no meaningful names.
    pub fn is_telemetry(self) -> bool {
        !matches!(
            self,
            Self::ResiliencyGroup
                | Self::ResiliencyServerGroup
                | Self::ResiliencyServer
                | Self::ResiliencyDiskLogical
                | Self::ResiliencyDisk
                | Self::ResiliencyNicLogical
                | Self::ResiliencyNic
        )
    }

    pub fn sort_key(self) -> SortKey {
        if self.is_telemetry() {
            SortKey::CreatedAt
        } else {
            SortKey::Name
        }
    }

    /// Looks up a column (envelope or entity-specific) by name.
    pub fn column(self, name: &str) -> Option<Column> {
        ENVELOPE_COLUMNS
            .iter()
            .chain(self.columns().iter())
            .copied()
            .find(|column| column.name == name)
    }

    /// Envelope columns followed by entity columns.
    pub fn all_columns(self) -> impl Iterator<Item = Column> {
        ENVELOPE_COLUMNS
            .iter()
            .chain(self.columns().iter())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnType, EntityKind, SortKey};
    use std::collections::HashSet;

    #[test]
    fn tables_and_labels_are_unique() {
        let tables: HashSet<_> = EntityKind::ALL.iter().map(|kind| kind.table()).collect();
        let labels: HashSet<_> = EntityKind::ALL.iter().map(|kind| kind.label()).collect();
        assert_eq!(tables.len(), EntityKind::ALL.len());
        assert_eq!(labels.len(), EntityKind::ALL.len());
    }

    #[test]
    fn every_link_column_is_a_text_column() {
        for kind in EntityKind::ALL {
            for link in kind.links() {
                let column = kind
                    .column(link.column)
                    .unwrap_or_else(|| panic!("{} lacks {}", kind.label(), link.column));
                assert_eq!(column.ty, ColumnType::Text);
            }
        }
    }

    #[test]
    fn server_group_owns_servers_and_logical_devices() {
        let children = EntityKind::ResiliencyServerGroup.children();
        assert_eq!(
            children,
            vec![
                (EntityKind::ResiliencyServer, "resiliency_server_group_id"),
                (EntityKind::ResiliencyDiskLogical, "resiliency_server_group_id"),
                (EntityKind::ResiliencyNicLogical, "resiliency_server_group_id"),
            ]
        );
    }

    #[test]
    fn plain_references_do_not_cascade() {
        let children = EntityKind::ResiliencyServer.children();
        assert!(!children
            .iter()
            .any(|(kind, _)| *kind == EntityKind::ResiliencyServer));
        assert!(EntityKind::FtLDisk.children().is_empty());
    }

    #[test]
    fn telemetry_kinds_sort_by_creation_time() {
        assert_eq!(EntityKind::ResiliencyNic.sort_key(), SortKey::Name);
        assert_eq!(EntityKind::FtQLink.sort_key(), SortKey::CreatedAt);
    }
}
