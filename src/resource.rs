//! Canonical resource names: slash-delimited paths always beginning with
//! `projects/<project>`, segments after the project alternating collection/id.

/// Resource type derived from the path by substring presence. Ordering matters:
/// the most specific collection is checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Secret,
    CryptoKey,
    KeyRing,
    Unknown,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Secret => "SECRET",
            ResourceType::CryptoKey => "CRYPTO_KEY",
            ResourceType::KeyRing => "KEY_RING",
            ResourceType::Unknown => "UNKNOWN",
        }
    }
}

/// Derives the resource type for use in condition evaluation.
pub fn derive_type(resource: &str) -> ResourceType {
    if resource.contains("/secrets/") {
        ResourceType::Secret
    } else if resource.contains("/cryptoKeys/") {
        ResourceType::CryptoKey
    } else if resource.contains("/keyRings/") {
        ResourceType::KeyRing
    } else {
        ResourceType::Unknown
    }
}

/// True if `resource` has at least two slash-delimited segments
/// (the inseparable `projects/<id>` pair).
pub fn is_valid(resource: &str) -> bool {
    !resource.is_empty() && resource.split('/').count() >= 2
}

/// Candidate ancestor resource names for hierarchical resolution,
/// most specific first: the resource itself, then each ancestor reached by
/// stripping the trailing collection/id pair, down to and including the
/// `projects/<id>` root.
pub fn ancestors(resource: &str) -> Vec<String> {
    let segs: Vec<&str> = resource.split('/').collect();
    let mut out = Vec::new();
    let mut n = segs.len();
    while n >= 2 {
        out.push(segs[..n].join("/"));
        if n <= 2 {
            break;
        }
        n -= 2;
    }
    out
}
