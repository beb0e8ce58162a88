//! Scope expansion: turns a rule's `(scope, target_id)` into concrete hosts.
//!
//! An unknown target expands to the empty set rather than failing, since
//! hosts and groups can disappear after a rule referencing them was created.

use std::collections::BTreeSet;

use crate::alert::{AlertRule, Scope};
use crate::hosts::HostRegistry;

/// Expand a scope to the set of host ids it covers.
///
/// - `global` covers every known host.
/// - `server` covers `target_id` if that host exists.
/// - `group` covers every host whose `group_name == target_id`.
///
/// A missing `target_id` on a non-global scope covers nothing.
pub fn expand(scope: Scope, target_id: Option<&str>, registry: &HostRegistry) -> BTreeSet<String> {
    match (scope, target_id) {
        (Scope::Global, _) => registry.ids().map(str::to_string).collect(),
        (Scope::Server, Some(host)) if registry.contains(host) => {
            BTreeSet::from([host.to_string()])
        }
        (Scope::Group, Some(group)) => registry
            .iter()
            .filter(|h| h.group_name.as_deref() == Some(group))
            .map(|h| h.server_id.clone())
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Hosts a rule currently applies to.
pub fn rule_hosts(rule: &AlertRule, registry: &HostRegistry) -> BTreeSet<String> {
    expand(rule.scope, rule.target_id.as_deref(), registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::Host;

    fn registry() -> HostRegistry {
        HostRegistry::from_hosts([
            Host::new("a").with_group("g1"),
            Host::new("b").with_group("g1"),
            Host::new("c").with_group("g2"),
            Host::new("d"),
        ])
    }

    #[test]
    fn global_covers_every_host() {
        let hosts = expand(Scope::Global, None, &registry());
        assert_eq!(hosts.len(), 4);
    }

    #[test]
    fn group_covers_exactly_its_members() {
        let hosts = expand(Scope::Group, Some("g1"), &registry());
        assert_eq!(hosts, BTreeSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn server_covers_only_the_target() {
        let hosts = expand(Scope::Server, Some("c"), &registry());
        assert_eq!(hosts, BTreeSet::from(["c".to_string()]));
    }

    #[test]
    fn deleted_server_expands_to_empty_set() {
        assert!(expand(Scope::Server, Some("deleted-host"), &registry()).is_empty());
    }

    #[test]
    fn unknown_group_and_missing_target_expand_to_empty_set() {
        assert!(expand(Scope::Group, Some("nope"), &registry()).is_empty());
        assert!(expand(Scope::Group, None, &registry()).is_empty());
        assert!(expand(Scope::Server, None, &registry()).is_empty());
    }
}
