//! Policy data model: bindings, conditions, and the deterministic etag
//! fingerprint used by the policy store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Condition {
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Policy {
    pub version: u32,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_configs: Option<serde_json::Value>,
    #[serde(default)]
    pub etag: String,
}

impl Policy {
    /// The synthetic policy returned by reads when nothing has been stored
    /// at a resource (never reported as "not found", ).
    pub fn empty() -> Self {
        Policy { version: 1, bindings: Vec::new(), audit_configs: None, etag: String::new() }
    }
}

/// Validates and normalizes a policy before it is stored:
/// `version == 0` becomes `1`; `version == 3` requires every conditioned
/// binding to carry a non-empty expression; the etag is recomputed from the
/// normalized content.
pub fn normalize(mut policy: Policy) -> Result<Policy, AppError> {
    if policy.version == 0 {
        policy.version = 1;
    }
    if policy.version == 3 {
        for b in &policy.bindings {
            if let Some(cond) = &b.condition {
                if cond.expression.trim().is_empty() {
                    return Err(AppError::invalid_argument(
                        "empty_condition_expression",
                        "version 3 policy binding has a condition with an empty expression",
                    ));
                }
            }
        }
    }
    policy.etag = compute_etag(&policy);
    Ok(policy)
}

/// Deterministic fingerprint of policy content (open question
/// resolved): bindings are sorted by `(role, sorted members, condition
/// expression)` so that two semantically equal policies — regardless of
/// stored binding order or member order — hash identically. `etag` and
/// `auditConfigs` are themselves excluded from the digest input.
pub fn compute_etag(policy: &Policy) -> String {
    let mut keyed: Vec<(String, String, String)> = policy.bindings.iter().map(canonical_key).collect();
    keyed.sort();

    let mut buf = String::new();
    buf.push_str(&format!("v={}\n", policy.version));
    for (role, members, condition) in keyed {
        buf.push_str("role=");
        buf.push_str(&role);
        buf.push_str("\nmembers=");
        buf.push_str(&members);
        buf.push_str("\ncondition=");
        buf.push_str(&condition);
        buf.push_str("\n---\n");
    }

    let digest = Sha256::digest(buf.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

fn canonical_key(b: &Binding) -> (String, String, String) {
    let mut members = b.members.clone();
    members.sort();
    let condition = b.condition.as_ref().map(|c| c.expression.clone()).unwrap_or_default();
    (b.role.clone(), members.join(","), condition)
}
