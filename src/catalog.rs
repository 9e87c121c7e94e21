//! Role Catalog: resolves whether a role grants a permission, combining
//! custom roles, the built-in catalog, and an optional compat-mode wildcard
//! fallback. Lookup order is first-match-wins across the three tiers — never
//! a merge.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

const SM_SECRETS_VERBS: [&str; 5] = ["get", "create", "update", "delete", "list"];
const SM_VERSIONS_VERBS: [&str; 7] = ["add", "get", "access", "list", "enable", "disable", "destroy"];
const KMS_KEYRINGS_VERBS: [&str; 3] = ["create", "get", "list"];
const KMS_CRYPTOKEYS_VERBS: [&str; 6] = ["create", "get", "list", "update", "encrypt", "decrypt"];
const KMS_CRYPTOKEYVERSIONS_VERBS: [&str; 5] = ["create", "get", "list", "update", "destroy"];

fn perms(prefix: &str, verbs: &[&str]) -> Vec<String> {
    verbs.iter().map(|v| format!("{prefix}.{v}")).collect()
}

fn sm_secrets() -> Vec<String> {
    perms("secretmanager.secrets", &SM_SECRETS_VERBS)
}
fn sm_versions() -> Vec<String> {
    perms("secretmanager.versions", &SM_VERSIONS_VERBS)
}
fn kms_keyrings() -> Vec<String> {
    perms("cloudkms.keyRings", &KMS_KEYRINGS_VERBS)
}
fn kms_cryptokeys() -> Vec<String> {
    perms("cloudkms.cryptoKeys", &KMS_CRYPTOKEYS_VERBS)
}
fn kms_cryptokeyversions() -> Vec<String> {
    perms("cloudkms.cryptoKeyVersions", &KMS_CRYPTOKEYVERSIONS_VERBS)
}

/// The full permission universe normative for the built-in catalog.
fn all_permissions() -> Vec<String> {
    let mut out = sm_secrets();
    out.extend(sm_versions());
    out.extend(kms_keyrings());
    out.extend(kms_cryptokeys());
    out.extend(kms_cryptokeyversions());
    out
}

fn builtin_permission_set(role: &str) -> Option<HashSet<String>> {
    let set: Vec<String> = match role {
        "roles/owner" => all_permissions(),
        "roles/editor" => all_permissions()
            .into_iter()
            .filter(|p| !p.ends_with(".delete") && !p.ends_with(".destroy") && p != "cloudkms.keyRings.create")
            .collect(),
        "roles/viewer" => all_permissions().into_iter().filter(|p| p.ends_with(".get") || p.ends_with(".list")).collect(),
        "roles/secretmanager.admin" => all_permissions().into_iter().filter(|p| p.starts_with("secretmanager.")).collect(),
        "roles/secretmanager.secretAccessor" => vec!["secretmanager.versions.access".to_string()],
        "roles/secretmanager.secretVersionManager" => {
            sm_versions().into_iter().filter(|p| p != "secretmanager.versions.access").collect()
        }
        "roles/cloudkms.admin" => all_permissions()
            .into_iter()
            .filter(|p| p.starts_with("cloudkms.") && p != "cloudkms.keyRings.create")
            .collect(),
        "roles/cloudkms.cryptoKeyEncrypterDecrypter" => {
            vec!["cloudkms.cryptoKeys.encrypt".to_string(), "cloudkms.cryptoKeys.decrypt".to_string()]
        }
        "roles/cloudkms.viewer" => all_permissions()
            .into_iter()
            .filter(|p| p.starts_with("cloudkms.") && (p.ends_with(".get") || p.ends_with(".list")))
            .collect(),
        _ => return None,
    };
    Some(set.into_iter().collect())
}

static BUILTIN_ROLES: Lazy<HashMap<&'static str, HashSet<String>>> = Lazy::new(|| {
    const KNOWN: [&str; 9] = [
        "roles/owner",
        "roles/editor",
        "roles/viewer",
        "roles/secretmanager.admin",
        "roles/secretmanager.secretAccessor",
        "roles/secretmanager.secretVersionManager",
        "roles/cloudkms.admin",
        "roles/cloudkms.cryptoKeyEncrypterDecrypter",
        "roles/cloudkms.viewer",
    ];
    KNOWN.iter().map(|&r| (r, builtin_permission_set(r).expect("known built-in role"))).collect()
});

/// Compat-mode wildcard fallback: a `roles/<service>.<rest>` id
/// grants a permission whose own service token matches `<service>`.
fn wildcard_grants(role: &str, permission: &str) -> bool {
    let Some(rest) = role.strip_prefix("roles/") else { return false };
    let role_service = rest.split('.').next().unwrap_or("");
    if role_service.is_empty() {
        return false;
    }
    let perm_service = permission.split('.').next().unwrap_or("");
    role_service == perm_service
}

/// Resolves whether `role` grants `permission`, given the caller's custom
/// role catalog and compat-mode setting. First match wins: custom roles,
/// then the built-in catalog, then (compat mode only) the wildcard
/// fallback; otherwise no permissions are granted. Never fails.
pub fn grants(role: &str, permission: &str, custom_roles: &HashMap<String, Vec<String>>, compat_mode: bool) -> bool {
    if let Some(perms) = custom_roles.get(role) {
        return perms.iter().any(|p| p == permission);
    }
    if let Some(perms) = BUILTIN_ROLES.get(role) {
        return perms.contains(permission);
    }
    if compat_mode {
        return wildcard_grants(role, permission);
    }
    false
}
