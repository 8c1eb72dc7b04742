//! Permission definitions
//!
//! Reading master data, job cards and stock needs only a login. Writes are
//! granted per module. `users:manage` and `all` are admin-level: only the
//! seeded admin role holds them by default, and only a `users:manage`
//! holder can grant them to another role.

/// Permissions a role may be granted
pub const ALL_PERMISSIONS: &[&str] = &[
    "master:manage",      // companies, products, materials
    "process:manage",     // process sequences and product step selection
    "jobs:create",        // open job cards
    "jobs:manage",        // edit, hold, cancel, advance from any department
    "jobs:advance",       // advance jobs of the user's own department
    "prepress:manage",    // designer assignment and prepress status
    "inventory:manage",   // items and stock movements
    "purchasing:manage",  // draft, submit, receive purchase orders
    "purchasing:approve", // approve purchase orders
    "reports:view",       // dashboard
];

/// Admin-level permissions, valid in any role but granted by default only
/// to `admin`
pub const ADMIN_ONLY_PERMISSIONS: &[&str] = &["users:manage", "all"];

pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

pub const DEFAULT_MANAGER_PERMISSIONS: &[&str] = &[
    "master:manage",
    "process:manage",
    "jobs:create",
    "jobs:manage",
    "jobs:advance",
    "prepress:manage",
    "inventory:manage",
    "purchasing:manage",
    "purchasing:approve",
    "reports:view",
];

pub const DEFAULT_OPERATOR_PERMISSIONS: &[&str] = &["jobs:advance", "reports:view"];

pub const DEFAULT_VIEWER_PERMISSIONS: &[&str] = &["reports:view"];

/// Roles seeded by the initial migration; they cannot be renamed or deleted
pub const SYSTEM_ROLES: &[&str] = &["admin", "manager", "operator", "viewer"];

pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    let perms = match role_name {
        "admin" => DEFAULT_ADMIN_PERMISSIONS,
        "manager" => DEFAULT_MANAGER_PERMISSIONS,
        "operator" => DEFAULT_OPERATOR_PERMISSIONS,
        "viewer" => DEFAULT_VIEWER_PERMISSIONS,
        _ => &[],
    };
    perms.iter().map(|s| s.to_string()).collect()
}

/// Validate a permission string, including `module:*` wildcards of known modules
pub fn is_valid_permission(permission: &str) -> bool {
    if ALL_PERMISSIONS.contains(&permission) || ADMIN_ONLY_PERMISSIONS.contains(&permission) {
        return true;
    }
    match permission.strip_suffix(":*") {
        Some(module) => ALL_PERMISSIONS
            .iter()
            .any(|p| p.split(':').next() == Some(module)),
        None => false,
    }
}

/// First invalid entry of a permission list, if any
pub fn find_invalid<'a>(permissions: &'a [String]) -> Option<&'a str> {
    permissions
        .iter()
        .map(String::as_str)
        .find(|p| !is_valid_permission(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        for role in SYSTEM_ROLES {
            let perms = get_default_permissions(role);
            assert!(!perms.is_empty(), "{role}");
            assert_eq!(find_invalid(&perms), None);
        }
        assert!(get_default_permissions("designer").is_empty());
    }

    #[test]
    fn test_wildcards() {
        assert!(is_valid_permission("inventory:*"));
        assert!(is_valid_permission("purchasing:*"));
        assert!(!is_valid_permission("orders:*"));
        assert!(!is_valid_permission("jobs:delete"));
    }

    #[test]
    fn test_admin_level_permissions() {
        for p in ADMIN_ONLY_PERMISSIONS {
            assert!(is_valid_permission(p));
            assert!(!ALL_PERMISSIONS.contains(p));
            for role in ["manager", "operator", "viewer"] {
                assert!(!get_default_permissions(role).iter().any(|g| g == p), "{role}");
            }
        }
        assert_eq!(get_default_permissions("admin"), vec!["all".to_string()]);
    }

    #[test]
    fn test_find_invalid() {
        let perms = vec!["jobs:advance".to_string(), "menu:manage".to_string()];
        assert_eq!(find_invalid(&perms), Some("menu:manage"));
    }
}
