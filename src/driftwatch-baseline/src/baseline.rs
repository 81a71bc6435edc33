//! In-memory baseline model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A partition of the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Files under watched folders, keyed by absolute path.
    Files,
    /// Listening ports, keyed by `"<port>:<process>"`.
    Ports,
    /// Running processes, keyed by normalized name.
    Processes,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Files, Domain::Ports, Domain::Processes];

    /// Field name of this domain's map in the baseline file.
    pub fn field_name(&self) -> &'static str {
        match self {
            Domain::Files => "known_files",
            Domain::Ports => "known_ports",
            Domain::Processes => "known_process",
        }
    }

    /// Singular noun used in operator messages.
    pub fn noun(&self) -> &'static str {
        match self {
            Domain::Files => "file",
            Domain::Ports => "port",
            Domain::Processes => "process",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Approved entity keys, one map per domain.
///
/// A domain map that was never enabled stays `None` and is left out of the
/// file, so a run with only some domains enabled persists only those.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_files: Option<BTreeMap<String, bool>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_ports: Option<BTreeMap<String, bool>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_process: Option<BTreeMap<String, bool>>,
}

impl Baseline {
    /// Create a baseline with no domain maps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a baseline with empty maps for the given domains.
    pub fn empty_for(domains: &[Domain]) -> Self {
        let mut baseline = Self::default();
        baseline.ensure_domains(domains);
        baseline
    }

    /// Make sure a map exists for each of the given domains.
    pub fn ensure_domains(&mut self, domains: &[Domain]) {
        for domain in domains {
            self.slot_mut(*domain).get_or_insert_with(BTreeMap::new);
        }
    }

    /// Get the map for a domain, if present.
    pub fn map(&self, domain: Domain) -> Option<&BTreeMap<String, bool>> {
        self.slot(domain).as_ref()
    }

    /// Whether `key` has been approved in `domain`.
    pub fn contains(&self, domain: Domain, key: &str) -> bool {
        self.map(domain)
            .and_then(|map| map.get(key))
            .copied()
            .unwrap_or(false)
    }

    /// Record `key` as approved. Returns `true` if it was not approved before.
    pub fn approve(&mut self, domain: Domain, key: impl Into<String>) -> bool {
        let map = self.slot_mut(domain).get_or_insert_with(BTreeMap::new);
        map.insert(key.into(), true) != Some(true)
    }

    /// Approved keys of a domain in sorted order.
    pub fn keys(&self, domain: Domain) -> impl Iterator<Item = &str> {
        self.map(domain)
            .into_iter()
            .flat_map(|map| map.iter())
            .filter(|(_, approved)| **approved)
            .map(|(key, _)| key.as_str())
    }

    /// Number of approved keys in a domain.
    pub fn len(&self, domain: Domain) -> usize {
        self.keys(domain).count()
    }

    /// Whether no domain holds an approved key.
    pub fn is_empty(&self) -> bool {
        Domain::ALL.iter().all(|d| self.len(*d) == 0)
    }

    fn slot(&self, domain: Domain) -> &Option<BTreeMap<String, bool>> {
        match domain {
            Domain::Files => &self.known_files,
            Domain::Ports => &self.known_ports,
            Domain::Processes => &self.known_process,
        }
    }

    fn slot_mut(&mut self, domain: Domain) -> &mut Option<BTreeMap<String, bool>> {
        match domain {
            Domain::Files => &mut self.known_files,
            Domain::Ports => &mut self.known_ports,
            Domain::Processes => &mut self.known_process,
        }
    }
}
