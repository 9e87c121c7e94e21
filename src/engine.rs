//! Decision Engine: orchestrates the role catalog, group registry,
//! condition evaluator, and policy store into a single `TestPermissions`
//! call, plus the `SetPolicy`/`GetPolicy` operations the transports call
//! directly through to the store.

use std::time::Instant;

use chrono::Utc;
use tracing::debug;

use crate::catalog;
use crate::condition::{self, EvalContext};
use crate::error::AppError;
use crate::groups;
use crate::policy::Policy;
use crate::principal;
use crate::resource;
use crate::store::Store;
use crate::trace::{self, Action, DecisionInfo, TraceEvent, TraceSink};

const METHOD: &str = "TestPermissions";
const EVALUATOR: &str = "warden.engine";

#[derive(Clone)]
pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// `SetPolicy`: validates `resource` is a well-formed resource name and
    /// delegates normalization and storage to the store.
    pub fn set_policy(&self, resource: &str, policy: Policy) -> Result<Policy, AppError> {
        if !resource::is_valid(resource) {
            return Err(AppError::invalid_argument("invalid_resource", "resource must contain at least a project id"));
        }
        self.store.write_policy(resource, policy)
    }

    /// `GetPolicy`: never fails, returns the empty policy when absent.
    pub fn get_policy(&self, resource: &str) -> Policy {
        self.store.read_policy(resource)
    }

    /// `TestPermissions`: resolves the nearest ancestor policy
    /// and decides each requested permission independently, in request
    /// order, emitting one trace event per permission.
    pub fn test_permissions(
        &self,
        resource: &str,
        principal: &str,
        permissions: &[String],
        trace_enabled: bool,
        sink: &dyn TraceSink,
    ) -> Result<Vec<String>, AppError> {
        if !resource::is_valid(resource) {
            return Err(AppError::invalid_argument("invalid_resource", "resource must contain at least a project id"));
        }
        if permissions.is_empty() {
            return Err(AppError::invalid_argument("empty_permissions", "permissions must not be empty"));
        }

        let started = Instant::now();
        let now = Utc::now();
        let snapshot = self.store.decision_snapshot(resource);

        let Some(policy) = snapshot.policy else {
            debug!(target: "warden::engine", resource, "no policy found for resource or any ancestor");
            for permission in permissions {
                emit_decision(sink, trace_enabled, started, principal, resource, permission, false, "no policy found");
            }
            return Ok(Vec::new());
        };

        let ctx = EvalContext { resource_name: resource.to_string(), resource_type: resource::derive_type(resource), request_time: now };

        let mut allowed = Vec::with_capacity(permissions.len());
        for permission in permissions {
            let (allow, reason) = decide_one(&policy, principal, permission, &ctx, &snapshot.groups, &snapshot.custom_roles, snapshot.compat_mode);
            emit_decision(sink, trace_enabled, started, principal, resource, permission, allow, &reason);
            if allow {
                allowed.push(permission.clone());
            }
        }
        Ok(allowed)
    }
}

fn decide_one(
    policy: &Policy,
    principal_str: &str,
    permission: &str,
    ctx: &EvalContext,
    groups_map: &groups::GroupMap,
    custom_roles: &std::collections::HashMap<String, Vec<String>>,
    compat_mode: bool,
) -> (bool, String) {
    for binding in &policy.bindings {
        if !catalog::grants(&binding.role, permission, custom_roles, compat_mode) {
            continue;
        }

        if principal_str.is_empty() {
            return (true, "matched role (no principal check)".to_string());
        }

        let member_matched = binding.members.iter().any(|member| {
            principal::matches_direct(member, principal_str)
                || principal::as_group_name(member).is_some_and(|g| groups::is_member(groups_map, g, principal_str))
        });
        if !member_matched {
            continue;
        }

        if let Some(condition) = &binding.condition {
            let (ok, reason) = condition::evaluate(&condition.expression, ctx);
            if !ok {
                return (false, format!("condition denied: {reason}"));
            }
        }

        return (true, "matched binding".to_string());
    }
    (false, "no matching binding found for principal".to_string())
}

#[allow(clippy::too_many_arguments)]
fn emit_decision(
    sink: &dyn TraceSink,
    trace_enabled: bool,
    started: Instant,
    principal_str: &str,
    resource: &str,
    permission: &str,
    allow: bool,
    reason: &str,
) {
    if !trace_enabled {
        return;
    }
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    let event = TraceEvent {
        schema: trace::SCHEMA,
        event_type: trace::EVENT_TYPE,
        timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
        actor: principal_str.to_string(),
        target: resource.to_string(),
        action: Action { permission: permission.to_string(), method: METHOD },
        decision: DecisionInfo { allow, reason: reason.to_string(), evaluator: EVALUATOR, latency_ms },
    };
    trace::emit(sink, trace_enabled, event);
}
