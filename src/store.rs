//! Policy Store: the single piece of mutable state in the engine.
//! Policies, groups, and custom roles live behind one `parking_lot::RwLock`
//! so that a decision reads a consistent snapshot of all three — never a mix
//! of pre- and post-write state from two different locks acquired
//! separately.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::AppError;
use crate::groups::GroupMap;
use crate::policy::{self, Policy};
use crate::resource;

/// Consistent snapshot of everything a single decision reads, captured under
/// one lock acquisition.
pub struct DecisionSnapshot {
    pub policy: Option<Policy>,
    pub groups: GroupMap,
    pub custom_roles: HashMap<String, Vec<String>>,
    pub compat_mode: bool,
}

#[derive(Debug, Default)]
struct StoreInner {
    policies: HashMap<String, Policy>,
    groups: GroupMap,
    custom_roles: HashMap<String, Vec<String>>,
    compat_mode: bool,
}

/// Cheaply cloneable handle to the shared store state.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes and stores `policy` at `resource`, replacing whatever was
    /// there. Returns the normalized (etag-stamped) policy that was stored.
    pub fn write_policy(&self, resource: &str, policy: Policy) -> Result<Policy, AppError> {
        let normalized = policy::normalize(policy)?;
        let mut guard = self.inner.write();
        guard.policies.insert(resource.to_string(), normalized.clone());
        info!(target: "warden::store", resource, etag = %normalized.etag, "policy written");
        Ok(normalized)
    }

    /// Returns the policy stored exactly at `resource`, or the synthetic
    /// empty policy if nothing has been written there. Never reports
    /// "not found".
    pub fn read_policy(&self, resource: &str) -> Policy {
        let guard = self.inner.read();
        guard.policies.get(resource).cloned().unwrap_or_else(Policy::empty)
    }

    /// Walks `resource`'s ancestor chain (closest first) and returns the
    /// first stored policy found, for hierarchical resolution.
    pub fn resolve_policy(&self, resource: &str) -> Option<Policy> {
        let guard = self.inner.read();
        nearest_policy(&guard.policies, resource)
    }

    /// Replaces the entire policy map, e.g. from config load.
    pub fn bulk_load_policies(&self, policies: HashMap<String, Policy>) -> Result<(), AppError> {
        let mut normalized = HashMap::with_capacity(policies.len());
        for (resource, p) in policies {
            normalized.insert(resource, policy::normalize(p)?);
        }
        let mut guard = self.inner.write();
        let count = normalized.len();
        guard.policies = normalized;
        info!(target: "warden::store", count, "bulk-loaded policies");
        Ok(())
    }

    pub fn load_groups(&self, groups: GroupMap) {
        let mut guard = self.inner.write();
        let count = groups.len();
        guard.groups = groups;
        info!(target: "warden::store", count, "loaded groups");
    }

    pub fn load_custom_roles(&self, roles: HashMap<String, Vec<String>>) {
        let mut guard = self.inner.write();
        let count = roles.len();
        guard.custom_roles = roles;
        info!(target: "warden::store", count, "loaded custom roles");
    }

    pub fn set_compat_mode(&self, enabled: bool) {
        let mut guard = self.inner.write();
        guard.compat_mode = enabled;
        info!(target: "warden::store", enabled, "compat mode set");
    }

    pub fn compat_mode(&self) -> bool {
        self.inner.read().compat_mode
    }

    /// Atomically captures everything a single decision needs: the resolved
    /// policy plus the group and custom-role registries and the compat-mode
    /// flag, all under one lock acquisition. This is what keeps a decision
    /// from observing a blend of pre- and post-write state.
    pub fn decision_snapshot(&self, resource: &str) -> DecisionSnapshot {
        let guard = self.inner.read();
        let policy = nearest_policy(&guard.policies, resource);
        DecisionSnapshot { policy, groups: guard.groups.clone(), custom_roles: guard.custom_roles.clone(), compat_mode: guard.compat_mode }
    }

    /// Drops all stored state. Used by tests and by config reloads.
    pub fn clear(&self) {
        let mut guard = self.inner.write();
        *guard = StoreInner::default();
        info!(target: "warden::store", "store cleared");
    }
}

/// Shared ancestor-walk for hierarchical resolution: the resource itself,
/// then each ancestor reached by stripping the trailing collection/id pair,
/// down to the `projects/<id>` root. Used by both `resolve_policy` and
/// `decision_snapshot` so the two never drift apart.
fn nearest_policy(policies: &HashMap<String, Policy>, resource: &str) -> Option<Policy> {
    for candidate in resource::ancestors(resource) {
        if let Some(p) = policies.get(&candidate) {
            debug!(target: "warden::store", resource, matched = %candidate, "resolved policy via ancestor walk");
            return Some(p.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Binding;

    fn policy_for(role: &str, member: &str) -> Policy {
        Policy { version: 1, bindings: vec![Binding { role: role.into(), members: vec![member.into()], condition: None }], ..Policy::empty() }
    }

    #[test]
    fn write_then_read_round_trips() {
        let store = Store::new();
        let written = store.write_policy("projects/p/secrets/s", policy_for("roles/viewer", "user:a@example.com")).unwrap();
        let read = store.read_policy("projects/p/secrets/s");
        assert_eq!(written, read);
        assert!(!read.etag.is_empty());
    }

    #[test]
    fn read_of_unwritten_resource_is_empty_not_an_error() {
        let store = Store::new();
        let p = store.read_policy("projects/p/secrets/never-written");
        assert_eq!(p, Policy::empty());
    }

    #[test]
    fn resolve_walks_up_to_nearest_ancestor() {
        let store = Store::new();
        store.write_policy("projects/p", policy_for("roles/viewer", "user:a@example.com")).unwrap();

        let resolved = store.resolve_policy("projects/p/secrets/s/versions/1").unwrap();
        assert_eq!(resolved.bindings[0].role, "roles/viewer");

        // an override at a closer ancestor wins.
        store.write_policy("projects/p/secrets/s", policy_for("roles/editor", "user:b@example.com")).unwrap();
        let resolved2 = store.resolve_policy("projects/p/secrets/s/versions/1").unwrap();
        assert_eq!(resolved2.bindings[0].role, "roles/editor");
    }

    #[test]
    fn resolve_returns_none_when_nothing_is_stored() {
        let store = Store::new();
        assert!(store.resolve_policy("projects/p/secrets/s").is_none());
    }

    #[test]
    fn bulk_load_replaces_existing_policies() {
        let store = Store::new();
        store.write_policy("projects/p", policy_for("roles/viewer", "user:a@example.com")).unwrap();

        let mut replacement = HashMap::new();
        replacement.insert("projects/q".to_string(), policy_for("roles/owner", "user:z@example.com"));
        store.bulk_load_policies(replacement).unwrap();

        assert_eq!(store.read_policy("projects/p"), Policy::empty());
        assert_eq!(store.read_policy("projects/q").bindings[0].role, "roles/owner");
    }

    #[test]
    fn compat_mode_flag_round_trips() {
        let store = Store::new();
        assert!(!store.compat_mode());
        store.set_compat_mode(true);
        assert!(store.compat_mode());
    }

    #[test]
    fn clear_resets_all_state() {
        let store = Store::new();
        store.write_policy("projects/p", policy_for("roles/viewer", "user:a@example.com")).unwrap();
        store.set_compat_mode(true);
        store.clear();
        assert_eq!(store.read_policy("projects/p"), Policy::empty());
        assert!(!store.compat_mode());
    }

    #[test]
    fn concurrent_writes_to_distinct_resources_all_land() {
        use std::thread;

        let store = Store::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let resource = format!("projects/p/secrets/s{i}");
                    store.write_policy(&resource, policy_for("roles/viewer", "user:a@example.com")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8 {
            let resource = format!("projects/p/secrets/s{i}");
            assert_eq!(store.read_policy(&resource).bindings[0].role, "roles/viewer");
        }
    }
}
