// Permissions Domain Model

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Expected AccessControl role holders: role name -> registry names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionsConfig {
    roles: IndexMap<String, Vec<String>>,
}

impl PermissionsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, role: impl Into<String>, holder: impl Into<String>) {
        self.roles.entry(role.into()).or_default().push(holder.into());
    }

    pub fn holders(&self, role: &str) -> &[String] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roles(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.roles
            .iter()
            .map(|(role, holders)| (role.as_str(), holders.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
