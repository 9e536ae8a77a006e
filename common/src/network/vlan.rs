use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;

/// A VLAN identifier as written in configuration. YAML may carry `10` or `"10"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VlanId {
    Number(u32),
    Text(String),
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VlanId::Number(n) => write!(f, "{n}"),
            VlanId::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// The VLANs designated as carrying end-user traffic.
///
/// Identifiers are normalised to trimmed strings because device output reports the VLAN
/// column as text; iteration order is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserVlans(BTreeSet<String>);

impl UserVlans {
    pub fn contains(&self, vlan: &str) -> bool {
        self.0.contains(vlan.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for UserVlans {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|v| v.as_ref().trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        )
    }
}

impl From<&[VlanId]> for UserVlans {
    fn from(ids: &[VlanId]) -> Self {
        ids.iter().map(|id| id.to_string()).collect()
    }
}
