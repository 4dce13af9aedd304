use core::fmt;
use core::num::NonZeroU32;
use std::collections::HashMap;

use crate::error::{VnError, VnResult};

/// Compact, stable identifier for a network node or link.
///
/// Stored as `index + 1` so `Option<Id>` costs nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index.
    ///
    /// Indices past `u32::MAX - 1` saturate.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// The 0-based index as a matrix/vector offset.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Node id within a valve bank.
pub type NodeId = Id;

/// Assigns contiguous ids to user-facing names in insertion order.
///
/// Scenario files name nodes and valves with strings; the network works on
/// dense indices. This keeps both directions.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: Vec<String>,
    lookup: HashMap<String, Id>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new name, rejecting duplicates.
    pub fn insert(&mut self, name: &str) -> VnResult<Id> {
        if self.lookup.contains_key(name) {
            return Err(VnError::Config {
                what: format!("duplicate id '{name}'"),
            });
        }
        let id = Id::from_index(self.names.len() as u32);
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<Id> {
        self.lookup.get(name).copied()
    }

    /// Resolve a name that must already be registered.
    pub fn resolve(&self, name: &str, what: &'static str) -> VnResult<Id> {
        self.get(name).ok_or_else(|| VnError::Config {
            what: format!("unknown {what} '{name}'"),
        })
    }

    pub fn name(&self, id: Id) -> Option<&str> {
        self.names.get(id.slot()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
