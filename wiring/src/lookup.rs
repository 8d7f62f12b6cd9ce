use std::collections::{BTreeMap, HashMap};

use crate::{ResolveError, Value};

/// Lookup service consulted for references.
///
/// The resolver calls [`Lookup::get`] exactly once for every reference it
/// resolves, including references used as factories.
pub trait Lookup {
    /// Returns the value of the entry, or [`ResolveError::EntryNotFound`].
    fn get(&self, id: &str) -> Result<Value, ResolveError>;

    fn has(&self, id: &str) -> bool;
}

impl Lookup for HashMap<String, Value> {
    fn get(&self, id: &str) -> Result<Value, ResolveError> {
        HashMap::get(self, id)
            .cloned()
            .ok_or_else(|| ResolveError::EntryNotFound(id.to_owned()))
    }

    fn has(&self, id: &str) -> bool {
        self.contains_key(id)
    }
}

impl Lookup for BTreeMap<String, Value> {
    fn get(&self, id: &str) -> Result<Value, ResolveError> {
        BTreeMap::get(self, id)
            .cloned()
            .ok_or_else(|| ResolveError::EntryNotFound(id.to_owned()))
    }

    fn has(&self, id: &str) -> bool {
        self.contains_key(id)
    }
}
