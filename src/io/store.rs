//! Key-value access to a materialized Level-1 product.

use crate::types::{AttrValue, DataArray, GhiError, GhiResult};
use std::collections::HashMap;

/// Prefix distinguishing file-level attribute keys from dataset keys
pub const ATTR_PREFIX: &str = "/attr/";

/// Read access to the arrays and attributes of one Level-1 product.
///
/// Dataset keys are slash-delimited paths (`Data/NOMChannel02`); file-level
/// attribute keys are prefixed with [`ATTR_PREFIX`]. The decoder treats the
/// store as an opaque fetch and never walks its structure.
pub trait ArrayStore {
    /// Fetch an array dataset together with its attributes.
    fn array(&self, key: &str) -> GhiResult<DataArray>;

    /// Fetch a file-level attribute.
    fn attr(&self, key: &str) -> GhiResult<AttrValue>;
}

/// In-memory [`ArrayStore`].
///
/// The materialization target for external HDF loaders, and the backing
/// store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    arrays: HashMap<String, DataArray>,
    attrs: HashMap<String, AttrValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_array(&mut self, key: impl Into<String>, array: DataArray) {
        self.arrays.insert(key.into(), array);
    }

    /// Store a file-level attribute under `/attr/{name}`.
    pub fn insert_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attrs
            .insert(format!("{}{}", ATTR_PREFIX, name), value.into());
    }
}

impl ArrayStore for MemoryStore {
    fn array(&self, key: &str) -> GhiResult<DataArray> {
        self.arrays
            .get(key)
            .cloned()
            .ok_or_else(|| GhiError::MissingDataset(key.to_string()))
    }

    fn attr(&self, key: &str) -> GhiResult<AttrValue> {
        self.attrs
            .get(key)
            .cloned()
            .ok_or_else(|| GhiError::MissingAttribute(key.to_string()))
    }
}
