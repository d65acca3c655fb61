use crate::config::EgressConfig;
use crate::identity::{IdentityError, DEFAULT_IDENTITIES};
use std::fmt;

/// One egress identity (a VPN location name)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Result of looking for the next identity to rotate to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Catalog index of the chosen identity
    pub index: usize,

    /// The chosen identity
    pub identity: Identity,

    /// Every identity was already used; the caller should start a new cycle
    pub new_cycle: bool,
}

/// Immutable, ordered catalog of egress identities
#[derive(Debug, Clone)]
pub struct IdentityPool {
    identities: Vec<Identity>,
}

impl IdentityPool {
    /// Creates a pool from identity names, keeping their order
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identities: names.into_iter().map(Identity::new).collect(),
        }
    }

    /// Creates a pool from the built-in catalog
    pub fn default_catalog() -> Self {
        Self::from_names(DEFAULT_IDENTITIES.iter().copied())
    }

    /// The configured catalog, or the built-in one when none is configured
    pub fn from_config(config: &EgressConfig) -> Self {
        match &config.identities {
            Some(names) => Self::from_names(names.iter().map(|n| n.trim().to_string())),
            None => Self::default_catalog(),
        }
    }

    pub fn size(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Returns the identity at `index`
    pub fn identity_at(&self, index: usize) -> Result<&Identity, IdentityError> {
        self.identities
            .get(index)
            .ok_or(IdentityError::IndexOutOfRange {
                index,
                size: self.identities.len(),
            })
    }

    /// Returns true if an identity with this name is in the catalog
    pub fn contains(&self, name: &str) -> bool {
        self.identities.iter().any(|i| i.name == name)
    }

    /// Iterates identity names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(|i| i.name.as_str())
    }

    /// Finds the first identity not in `used`, scanning forward from `from_index`
    ///
    /// The scan wraps at the end of the catalog, so `from_index` may be equal to
    /// or larger than the size. When every identity is already in `used`, the
    /// first identity is returned with `new_cycle` set.
    pub fn next_unused<S: AsRef<str>>(
        &self,
        from_index: usize,
        used: &[S],
    ) -> Result<Selection, IdentityError> {
        let size = self.identities.len();
        if size == 0 {
            return Err(IdentityError::EmptyCatalog);
        }

        for offset in 0..size {
            let index = (from_index + offset) % size;
            let identity = &self.identities[index];
            if !used.iter().any(|u| u.as_ref() == identity.name) {
                return Ok(Selection {
                    index,
                    identity: identity.clone(),
                    new_cycle: false,
                });
            }
        }

        Ok(Selection {
            index: 0,
            identity: self.identities[0].clone(),
            new_cycle: true,
        })
    }
}
