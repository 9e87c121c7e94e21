//! Group Registry: maps a group name to its direct members and answers
//! bounded-depth membership queries. At most one level of group-in-group is
//! followed, which makes cycles harmless without a visited-set.

use std::collections::HashMap;

use crate::principal::as_group_name;

pub type GroupMap = HashMap<String, Vec<String>>;

/// True if `principal` is a (possibly one-level-nested) member of `group`.
pub fn is_member(groups: &GroupMap, group: &str, principal: &str) -> bool {
    let Some(direct) = groups.get(group) else { return false };
    for member in direct {
        if member == principal {
            return true;
        }
        if let Some(nested_name) = as_group_name(member) {
            if let Some(nested_members) = groups.get(nested_name) {
                if nested_members.iter().any(|m| m == principal) {
                    return true;
                }
            }
        }
    }
    false
}
