//! Role catalog arena
//!
//! Roles live in a flat `Vec`; references (by id or by name) resolve through
//! a single index map instead of scanning the list on every lookup.

use std::collections::HashMap;

use crate::types::Role;

/// Pre-loaded set of roles with id/name lookup
///
/// When several roles share an id or name, the first one in catalog order
/// wins, matching a linear "first role whose id or name matches" scan.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: Vec<Role>,
    index: HashMap<String, usize>,
}

impl RoleCatalog {
    /// Build a catalog, indexing every role by id and by name
    pub fn new(roles: Vec<Role>) -> Self {
        let mut index = HashMap::with_capacity(roles.len() * 2);

        for (slot, role) in roles.iter().enumerate() {
            index.entry(role.id.clone()).or_insert(slot);
            index.entry(role.name.clone()).or_insert(slot);
        }

        Self { roles, index }
    }

    /// Resolve a role reference (id or name)
    pub fn resolve(&self, role_ref: &str) -> Option<&Role> {
        self.index.get(role_ref).map(|&slot| &self.roles[slot])
    }

    /// Resolve a role reference, skipping inactive roles
    pub fn resolve_active(&self, role_ref: &str) -> Option<&Role> {
        self.resolve(role_ref).filter(|role| role.is_active)
    }

    /// All roles, in catalog order
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Role> {
        self.roles.iter()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl From<Vec<Role>> for RoleCatalog {
    fn from(roles: Vec<Role>) -> Self {
        Self::new(roles)
    }
}

impl FromIterator<Role> for RoleCatalog {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RoleCatalog {
    type Item = &'a Role;
    type IntoIter = std::slice::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.iter()
    }
}
