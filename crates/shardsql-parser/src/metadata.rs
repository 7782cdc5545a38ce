//! Table-name lookup supplied by the sharding-rule collaborator.

use std::collections::HashSet;

/// Decides whether a name denotes a logical table that may need rewriting.
pub trait TableMetadata: Send + Sync {
    fn is_table_name(&self, name: &str) -> bool;
}

/// A fixed set of logical table names, matched ASCII case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct KnownTables {
    names: HashSet<String>,
}

impl KnownTables {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_ascii_lowercase());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TableMetadata for KnownTables {
    fn is_table_name(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }
}

/// Treats every name as a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyTable;

impl TableMetadata for AnyTable {
    fn is_table_name(&self, _name: &str) -> bool {
        true
    }
}
