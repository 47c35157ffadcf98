use serde::{Deserialize, Serialize};

/// Guild permissions a plugin or command may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    Administrator,
    ManageGuild,
    ManageRoles,
    ManageChannels,
    ManageMessages,
    SendMessages,
    ViewChannel,
    AddReactions,
    ReadMessageHistory,
    ViewAuditLog,
    CreateInstantInvite,
}

impl Permission {
    /// Bit position in the platform permission integer
    pub fn bits(&self) -> u64 {
        match self {
            Permission::CreateInstantInvite => 1 << 0,
            Permission::Administrator => 1 << 3,
            Permission::ManageChannels => 1 << 4,
            Permission::ManageGuild => 1 << 5,
            Permission::AddReactions => 1 << 6,
            Permission::ViewAuditLog => 1 << 7,
            Permission::ViewChannel => 1 << 10,
            Permission::SendMessages => 1 << 11,
            Permission::ManageMessages => 1 << 13,
            Permission::ReadMessageHistory => 1 << 16,
            Permission::ManageRoles => 1 << 28,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Permission::Administrator => "administrator",
            Permission::ManageGuild => "manage-guild",
            Permission::ManageRoles => "manage-roles",
            Permission::ManageChannels => "manage-channels",
            Permission::ManageMessages => "manage-messages",
            Permission::SendMessages => "send-messages",
            Permission::ViewChannel => "view-channel",
            Permission::AddReactions => "add-reactions",
            Permission::ReadMessageHistory => "read-message-history",
            Permission::ViewAuditLog => "view-audit-log",
            Permission::CreateInstantInvite => "create-instant-invite",
        }
    }
}

/// A set of permission bits, as the platform transports it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permissions(pub u64);

impl Permissions {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0 & permission.bits() != 0
    }

    /// Decimal string form; the bits overflow JSON number precision
    pub fn to_decimal_string(&self) -> String {
        self.0.to_string()
    }
}

impl From<Permission> for Permissions {
    fn from(permission: Permission) -> Self {
        Self(permission.bits())
    }
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |acc, p| acc | p.bits()))
    }
}
