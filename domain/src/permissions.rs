//! Role-based access control.
//!
//! DESIGN
//! ======
//! A role template is the default permission matrix for a role, keyed by
//! module and then action. Per-user overrides are layered on top: grants
//! add actions, revokes remove them, and a revoke always wins over a grant
//! for the same module/action. Anything not present in the matrix is denied.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionParseError {
    #[error("unknown role: {0}")]
    Role(String),
    #[error("unknown module: {0}")]
    Module(String),
    #[error("unknown action: {0}")]
    Action(String),
    #[error("permission must look like `module:action`, got {0}")]
    Malformed(String),
}

// =============================================================================
// ROLES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(alias = "sales_manager")]
    SalesLeader,
    SalesRep,
    InventorySpecialist,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::SalesLeader, Role::SalesRep, Role::InventorySpecialist];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SalesLeader => "sales_leader",
            Self::SalesRep => "sales_rep",
            Self::InventorySpecialist => "inventory_specialist",
        }
    }

    /// Position in the hierarchy; lower is more privileged.
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::Admin => 1,
            Self::SalesLeader => 2,
            Self::SalesRep | Self::InventorySpecialist => 3,
        }
    }

    /// Roles that carry a personal sales pipeline.
    #[must_use]
    pub fn is_sales(self) -> bool {
        matches!(self, Self::SalesLeader | Self::SalesRep)
    }
}

impl FromStr for Role {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "sales_leader" | "sales_manager" => Ok(Self::SalesLeader),
            "sales_rep" => Ok(Self::SalesRep),
            "inventory_specialist" => Ok(Self::InventorySpecialist),
            other => Err(PermissionParseError::Role(other.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MODULES AND ACTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Inventory,
    Quotes,
    Clients,
    Showroom,
    Users,
    Reports,
    System,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Dashboard,
        Module::Inventory,
        Module::Quotes,
        Module::Clients,
        Module::Showroom,
        Module::Users,
        Module::Reports,
        Module::System,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Inventory => "inventory",
            Self::Quotes => "quotes",
            Self::Clients => "clients",
            Self::Showroom => "showroom",
            Self::Users => "users",
            Self::Reports => "reports",
            Self::System => "system",
        }
    }
}

impl FromStr for Module {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| PermissionParseError::Module(s.to_owned()))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
    Export,
}

impl Action {
    pub const ALL: [Action; 6] =
        [Action::View, Action::Create, Action::Edit, Action::Delete, Action::Approve, Action::Export];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Approve => "approve",
            Self::Export => "export",
        }
    }
}

impl FromStr for Action {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| PermissionParseError::Action(s.to_owned()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `module:action` pair, e.g. `quotes:approve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    pub module: Module,
    pub action: Action,
}

impl Permission {
    #[must_use]
    pub fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, action) = s
            .split_once(':')
            .ok_or_else(|| PermissionParseError::Malformed(s.to_owned()))?;
        Ok(Self { module: module.parse()?, action: action.parse()? })
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// PERMISSION SET
// =============================================================================

/// Module → allowed actions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<Module, BTreeSet<Action>>);

impl PermissionSet {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, module: Module, action: Action) {
        self.0.entry(module).or_default().insert(action);
    }

    pub fn grant_all(&mut self, module: Module, actions: &[Action]) {
        for action in actions {
            self.grant(module, *action);
        }
    }

    pub fn revoke(&mut self, module: Module, action: Action) {
        if let Some(actions) = self.0.get_mut(&module) {
            actions.remove(&action);
            if actions.is_empty() {
                self.0.remove(&module);
            }
        }
    }

    /// Missing module or action means denied.
    #[must_use]
    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.0.get(&module).is_some_and(|actions| actions.contains(&action))
    }

    #[must_use]
    pub fn actions(&self, module: Module) -> Vec<Action> {
        self.0
            .get(&module)
            .map(|actions| actions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Modules with at least one allowed action, e.g. for building navigation.
    #[must_use]
    pub fn visible_modules(&self) -> Vec<Module> {
        self.0
            .iter()
            .filter(|(_, actions)| !actions.is_empty())
            .map(|(module, _)| *module)
            .collect()
    }

    /// Flattened `module:action` list.
    #[must_use]
    pub fn to_permissions(&self) -> Vec<Permission> {
        self.0
            .iter()
            .flat_map(|(module, actions)| actions.iter().map(|action| Permission::new(*module, *action)))
            .collect()
    }
}

// =============================================================================
// ROLE TEMPLATES
// =============================================================================

/// Named bundle of default permissions for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleTemplate {
    pub role: Role,
    pub description: &'static str,
    pub permissions: PermissionSet,
}

impl RoleTemplate {
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        use Action::{Create, Delete, Edit, Export, View};

        let mut set = PermissionSet::empty();
        let description = match role {
            Role::Admin => {
                for module in Module::ALL {
                    set.grant_all(module, &Action::ALL);
                }
                "Full system access"
            }
            Role::SalesLeader => {
                for module in [Module::Dashboard, Module::Quotes, Module::Clients, Module::Showroom] {
                    set.grant_all(module, &Action::ALL);
                }
                set.grant_all(Module::Inventory, &[View, Export]);
                set.grant_all(Module::Reports, &[View, Export]);
                set.grant(Module::Users, View);
                "Sales team oversight and quote approval"
            }
            Role::SalesRep => {
                set.grant(Module::Dashboard, View);
                set.grant(Module::Inventory, View);
                for module in [Module::Quotes, Module::Clients, Module::Showroom] {
                    set.grant_all(module, &[View, Create, Edit]);
                }
                "Own clients and quotes"
            }
            Role::InventorySpecialist => {
                set.grant(Module::Dashboard, View);
                set.grant_all(Module::Inventory, &[View, Create, Edit, Delete, Export]);
                set.grant(Module::Quotes, View);
                "Product and slab inventory management"
            }
        };

        Self { role, description, permissions: set }
    }

    #[must_use]
    pub fn all() -> Vec<Self> {
        Role::ALL.into_iter().map(Self::for_role).collect()
    }
}

/// Per-user deviations from the role template.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionOverrides {
    #[serde(default)]
    pub grants: Vec<Permission>,
    #[serde(default)]
    pub revokes: Vec<Permission>,
}

impl PermissionOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty() && self.revokes.is_empty()
    }
}

/// Template for `role` with `overrides` applied; revokes win.
#[must_use]
pub fn effective_permissions(role: Role, overrides: &PermissionOverrides) -> PermissionSet {
    let mut set = RoleTemplate::for_role(role).permissions;
    for p in &overrides.grants {
        set.grant(p.module, p.action);
    }
    for p in &overrides.revokes {
        set.revoke(p.module, p.action);
    }
    set
}

/// Row visibility for records that have an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
    Own,
}

/// Sales reps work their own book; everyone else sees the whole table.
#[must_use]
pub fn record_scope(role: Role) -> Scope {
    match role {
        Role::SalesRep => Scope::Own,
        Role::Admin | Role::SalesLeader | Role::InventorySpecialist => Scope::All,
    }
}

#[cfg(test)]
#[path = "permissions_test.rs"]
mod tests;
