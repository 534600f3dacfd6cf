use common_ethers::contracts::{AddAssignerCall, SetRoleGroupCall};
use ethers::types::Address;

use crate::{dispatcher::ContractCall, registry::SettingKey};

// Roles and role groups are identified on chain the same way registry keys
// are, by the keccak256 of their name.

pub const ROLE_SYSTEM_ADMIN: SettingKey = SettingKey::new("ROLE_SYSTEM_ADMIN");
pub const ROLE_SYSTEM_MANAGER: SettingKey = SettingKey::new("ROLE_SYSTEM_MANAGER");
pub const ROLE_ENTITY_ADMIN: SettingKey = SettingKey::new("ROLE_ENTITY_ADMIN");
pub const ROLE_ENTITY_MANAGER: SettingKey = SettingKey::new("ROLE_ENTITY_MANAGER");
pub const ROLE_ENTITY_REP: SettingKey = SettingKey::new("ROLE_ENTITY_REP");
pub const ROLE_POLICY_OWNER: SettingKey = SettingKey::new("ROLE_POLICY_OWNER");
pub const ROLE_POLICY_CREATOR: SettingKey = SettingKey::new("ROLE_POLICY_CREATOR");
pub const ROLE_UNDERWRITER: SettingKey = SettingKey::new("ROLE_UNDERWRITER");
pub const ROLE_BROKER: SettingKey = SettingKey::new("ROLE_BROKER");
pub const ROLE_INSURED_PARTY: SettingKey = SettingKey::new("ROLE_INSURED_PARTY");
pub const ROLE_CLAIMS_ADMIN: SettingKey = SettingKey::new("ROLE_CLAIMS_ADMIN");

pub const ROLEGROUP_SYSTEM_ADMINS: SettingKey = SettingKey::new("ROLEGROUP_SYSTEM_ADMINS");
pub const ROLEGROUP_SYSTEM_MANAGERS: SettingKey = SettingKey::new("ROLEGROUP_SYSTEM_MANAGERS");
pub const ROLEGROUP_ENTITY_ADMINS: SettingKey = SettingKey::new("ROLEGROUP_ENTITY_ADMINS");
pub const ROLEGROUP_ENTITY_MANAGERS: SettingKey = SettingKey::new("ROLEGROUP_ENTITY_MANAGERS");
pub const ROLEGROUP_ENTITY_REPS: SettingKey = SettingKey::new("ROLEGROUP_ENTITY_REPS");
pub const ROLEGROUP_POLICY_CREATORS: SettingKey = SettingKey::new("ROLEGROUP_POLICY_CREATORS");
pub const ROLEGROUP_POLICY_OWNERS: SettingKey = SettingKey::new("ROLEGROUP_POLICY_OWNERS");
pub const ROLEGROUP_POLICY_APPROVERS: SettingKey = SettingKey::new("ROLEGROUP_POLICY_APPROVERS");
pub const ROLEGROUP_CLAIMS_ADMINS: SettingKey = SettingKey::new("ROLEGROUP_CLAIMS_ADMINS");

/// Which roles make up each role group.
pub const ROLE_GROUPS: &[(SettingKey, &[SettingKey])] = &[
    (ROLEGROUP_SYSTEM_ADMINS, &[ROLE_SYSTEM_ADMIN]),
    (ROLEGROUP_SYSTEM_MANAGERS, &[ROLE_SYSTEM_ADMIN, ROLE_SYSTEM_MANAGER]),
    (ROLEGROUP_ENTITY_ADMINS, &[ROLE_ENTITY_ADMIN]),
    (ROLEGROUP_ENTITY_MANAGERS, &[ROLE_ENTITY_ADMIN, ROLE_ENTITY_MANAGER]),
    (
        ROLEGROUP_ENTITY_REPS,
        &[ROLE_ENTITY_ADMIN, ROLE_ENTITY_MANAGER, ROLE_ENTITY_REP],
    ),
    (ROLEGROUP_POLICY_CREATORS, &[ROLE_POLICY_CREATOR]),
    (ROLEGROUP_POLICY_OWNERS, &[ROLE_POLICY_OWNER]),
    (
        ROLEGROUP_POLICY_APPROVERS,
        &[ROLE_UNDERWRITER, ROLE_BROKER, ROLE_INSURED_PARTY],
    ),
    (ROLEGROUP_CLAIMS_ADMINS, &[ROLE_CLAIMS_ADMIN]),
];

/// Which role group may assign each role.
pub const ROLE_ASSIGNERS: &[(SettingKey, SettingKey)] = &[
    (ROLE_SYSTEM_MANAGER, ROLEGROUP_SYSTEM_ADMINS),
    (ROLE_ENTITY_ADMIN, ROLEGROUP_SYSTEM_MANAGERS),
    (ROLE_ENTITY_MANAGER, ROLEGROUP_ENTITY_ADMINS),
    (ROLE_ENTITY_REP, ROLEGROUP_ENTITY_MANAGERS),
    (ROLE_POLICY_CREATOR, ROLEGROUP_ENTITY_MANAGERS),
    (ROLE_POLICY_OWNER, ROLEGROUP_POLICY_CREATORS),
    (ROLE_UNDERWRITER, ROLEGROUP_POLICY_CREATORS),
    (ROLE_BROKER, ROLEGROUP_POLICY_CREATORS),
    (ROLE_INSURED_PARTY, ROLEGROUP_POLICY_CREATORS),
    (ROLE_CLAIMS_ADMIN, ROLEGROUP_SYSTEM_MANAGERS),
];

/// Calls configuring every role group and role assigner on `acl`.
///
/// The calls are independent of each other and may be sent in any order.
pub fn setup_calls(acl: Address) -> Vec<ContractCall> {
    let groups = ROLE_GROUPS.iter().map(|(group, roles)| {
        ContractCall::new(
            acl,
            SetRoleGroupCall {
                role_group: group.id(),
                roles: roles.iter().map(SettingKey::id).collect(),
            },
        )
    });
    let assigners = ROLE_ASSIGNERS.iter().map(|(role, group)| {
        ContractCall::new(
            acl,
            AddAssignerCall {
                role: role.id(),
                role_group: group.id(),
            },
        )
    });
    groups.chain(assigners).collect()
}
