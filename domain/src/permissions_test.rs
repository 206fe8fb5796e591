use super::*;

#[test]
fn role_parses_with_manager_alias() {
    assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("Sales_Manager".parse::<Role>().unwrap(), Role::SalesLeader);
    assert_eq!(" sales_rep ".parse::<Role>().unwrap(), Role::SalesRep);
    assert!(matches!("owner".parse::<Role>(), Err(PermissionParseError::Role(_))));
}

#[test]
fn role_serde_accepts_alias_and_writes_canonical() {
    let role: Role = serde_json::from_str(r#""sales_manager""#).unwrap();
    assert_eq!(role, Role::SalesLeader);
    assert_eq!(serde_json::to_string(&role).unwrap(), r#""sales_leader""#);
}

#[test]
fn admin_template_allows_everything() {
    let set = RoleTemplate::for_role(Role::Admin).permissions;
    for module in Module::ALL {
        for action in Action::ALL {
            assert!(set.allows(module, action), "admin should have {module}:{action}");
        }
    }
}

#[test]
fn sales_rep_cannot_delete_or_approve_quotes() {
    let set = RoleTemplate::for_role(Role::SalesRep).permissions;
    assert!(set.allows(Module::Quotes, Action::Create));
    assert!(set.allows(Module::Quotes, Action::Edit));
    assert!(!set.allows(Module::Quotes, Action::Delete));
    assert!(!set.allows(Module::Quotes, Action::Approve));
    assert!(!set.allows(Module::Users, Action::View));
    assert!(!set.allows(Module::Inventory, Action::Edit));
}

#[test]
fn sales_leader_approves_but_does_not_manage_users() {
    let set = RoleTemplate::for_role(Role::SalesLeader).permissions;
    assert!(set.allows(Module::Quotes, Action::Approve));
    assert!(set.allows(Module::Reports, Action::View));
    assert!(set.allows(Module::Users, Action::View));
    assert!(!set.allows(Module::Users, Action::Edit));
    assert!(!set.allows(Module::System, Action::View));
}

#[test]
fn inventory_specialist_manages_inventory_only() {
    let set = RoleTemplate::for_role(Role::InventorySpecialist).permissions;
    assert!(set.allows(Module::Inventory, Action::Delete));
    assert!(!set.allows(Module::Inventory, Action::Approve));
    assert!(set.allows(Module::Quotes, Action::View));
    assert!(!set.allows(Module::Quotes, Action::Create));
    assert!(!set.allows(Module::Reports, Action::View));
}

#[test]
fn empty_set_denies() {
    assert!(!PermissionSet::empty().allows(Module::Dashboard, Action::View));
}

#[test]
fn overrides_grant_and_revoke_with_revoke_winning() {
    let overrides = PermissionOverrides {
        grants: vec!["reports:view".parse().unwrap(), "quotes:delete".parse().unwrap()],
        revokes: vec!["quotes:delete".parse().unwrap(), "clients:create".parse().unwrap()],
    };
    let set = effective_permissions(Role::SalesRep, &overrides);
    assert!(set.allows(Module::Reports, Action::View));
    assert!(!set.allows(Module::Quotes, Action::Delete));
    assert!(!set.allows(Module::Clients, Action::Create));
    assert!(set.allows(Module::Clients, Action::View));
}

#[test]
fn revoking_last_action_hides_module() {
    let overrides = PermissionOverrides { grants: vec![], revokes: vec!["dashboard:view".parse().unwrap()] };
    let set = effective_permissions(Role::InventorySpecialist, &overrides);
    assert!(!set.visible_modules().contains(&Module::Dashboard));
    assert!(set.visible_modules().contains(&Module::Inventory));
}

#[test]
fn permission_string_parsing() {
    let p: Permission = "quotes:approve".parse().unwrap();
    assert_eq!(p, Permission::new(Module::Quotes, Action::Approve));
    assert_eq!(p.to_string(), "quotes:approve");
    assert!(matches!("quotes".parse::<Permission>(), Err(PermissionParseError::Malformed(_))));
    assert!(matches!("boards:view".parse::<Permission>(), Err(PermissionParseError::Module(_))));
    assert!(matches!("quotes:fly".parse::<Permission>(), Err(PermissionParseError::Action(_))));
}

#[test]
fn overrides_deserialize_from_strings() {
    let json = r#"{"grants":["reports:export"]}"#;
    let overrides: PermissionOverrides = serde_json::from_str(json).unwrap();
    assert_eq!(overrides.grants, vec![Permission::new(Module::Reports, Action::Export)]);
    assert!(overrides.revokes.is_empty());
}

#[test]
fn permission_set_serializes_as_module_map() {
    let mut set = PermissionSet::empty();
    set.grant(Module::Quotes, Action::View);
    set.grant(Module::Quotes, Action::Create);
    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json, serde_json::json!({"quotes": ["view", "create"]}));
}

#[test]
fn only_sales_reps_are_scoped_to_their_own_records() {
    assert_eq!(record_scope(Role::SalesRep), Scope::Own);
    assert_eq!(record_scope(Role::SalesLeader), Scope::All);
    assert_eq!(record_scope(Role::Admin), Scope::All);
}

#[test]
fn every_role_has_a_template() {
    let templates = RoleTemplate::all();
    assert_eq!(templates.len(), Role::ALL.len());
    assert!(templates.iter().all(|t| !t.permissions.visible_modules().is_empty()));
}
