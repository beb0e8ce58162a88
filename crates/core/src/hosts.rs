//! Monitored hosts and the in-memory registry of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::require_non_blank;

/// Report interval assigned to hosts registered without one (40 minutes).
pub const DEFAULT_REPORT_INTERVAL_SECS: u32 = 2400;

/// A monitored host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub server_id: String,
    pub group_name: Option<String>,
    pub data_monitoring_enabled: bool,
    /// Expected seconds between two reports.
    pub report_interval: u32,
}

impl Host {
    /// A monitoring-enabled host with the default report interval.
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            group_name: None,
            data_monitoring_enabled: true,
            report_interval: DEFAULT_REPORT_INTERVAL_SECS,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_name = Some(group.into());
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        require_non_blank(&self.server_id, "server_id")?;
        if self.report_interval == 0 {
            return Err(CoreError::Validation(
                "report_interval must be at least 1 second".to_string(),
            ));
        }
        if let Some(group) = &self.group_name {
            require_non_blank(group, "group_name")?;
        }
        Ok(())
    }
}

/// Normalise an optional group name: blank strings mean "no group".
pub fn normalize_group(group: Option<String>) -> Option<String> {
    group
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
}

/// The set of known hosts, ordered by `server_id`.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: BTreeMap<String, Host>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hosts(hosts: impl IntoIterator<Item = Host>) -> Self {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| (h.server_id.clone(), h))
                .collect(),
        }
    }

    pub fn get(&self, server_id: &str) -> Option<&Host> {
        self.hosts.get(server_id)
    }

    pub fn contains(&self, server_id: &str) -> bool {
        self.hosts.contains_key(server_id)
    }

    /// Whether at least one host belongs to `group`.
    pub fn group_exists(&self, group: &str) -> bool {
        self.hosts
            .values()
            .any(|h| h.group_name.as_deref() == Some(group))
    }

    /// Insert or replace a host. Returns the previous entry.
    pub fn upsert(&mut self, host: Host) -> Option<Host> {
        self.hosts.insert(host.server_id.clone(), host)
    }

    pub fn remove(&mut self, server_id: &str) -> Option<Host> {
        self.hosts.remove(server_id)
    }

    /// Change one host's group. Fails if the host is unknown.
    pub fn set_group(&mut self, server_id: &str, group: Option<String>) -> Result<&Host, CoreError> {
        let host = self
            .hosts
            .get_mut(server_id)
            .ok_or_else(|| CoreError::not_found("host", server_id))?;
        host.group_name = group;
        Ok(host)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
