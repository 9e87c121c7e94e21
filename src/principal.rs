//! Principal identifiers: `user:<email>`, `serviceAccount:<email>`, `group:<name>`,
//! and the two sentinels `allUsers` / `allAuthenticatedUsers`. Equality is byte-exact;
//! the core never normalizes case or whitespace in a principal string.

pub const ALL_USERS: &str = "allUsers";
pub const ALL_AUTHENTICATED_USERS: &str = "allAuthenticatedUsers";

/// Returns the group name if `member` has the form `group:<name>`.
pub fn as_group_name(member: &str) -> Option<&str> {
    member.strip_prefix("group:")
}

/// True if `member` matches `principal` directly, ignoring group expansion.
/// Group membership (the `group:<name>` case) is resolved separately via the
/// group registry since it requires a lookup, not a string comparison.
pub fn matches_direct(member: &str, principal: &str) -> bool {
    member == principal || member == ALL_USERS || member == ALL_AUTHENTICATED_USERS
}
